//! 4캔들 관측값과 피처 인코더.
//!
//! 트레이더가 선택한 범주형 값(C1 컨텍스트/행동, C2~C4 액션/종가/한정자)을
//! 고정된 정수 코드로 변환합니다. 인코딩은 전사적이고 결정적이며
//! 부작용이 없습니다.
//!
//! # 코드표
//!
//! | 슬롯 | 코드 |
//! |------|------|
//! | C1 컨텍스트 | 0=inside_pdr, 1=breaks_pdh, 2=breaks_pdl |
//! | C1 행동 | 0=ranging, 1=trends_up, 2=trends_down |
//! | 캔들 액션 | 0=inside_bar, 1=breaks_high, 2=breaks_low, 3=whipsaw |
//! | 캔들 종가 | 0=inside, 1=above, 2=below |
//! | 레벨 한정자 | 0=none, 1=+PDH, 2=+PDL, 3=+SetupHigh, 4=+SetupLow, 5=+PDH&Setup, 6=+PDL&Setup |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::feature::FeatureVector;
use crate::error::{AtlasError, AtlasResult};

/// 고정 정수 코드를 가진 닫힌 열거형.
pub trait Categorical: Sized + Copy {
    /// 인코딩 가능한 최대 코드
    const DOMAIN_MAX: u8;

    /// 멤버의 정수 코드를 반환합니다.
    fn code(self) -> u8;

    /// 정수 코드에서 멤버를 복원합니다.
    fn from_code(code: u8) -> Option<Self>;

    /// snake_case 이름을 반환합니다.
    fn as_str(self) -> &'static str;
}

macro_rules! categorical {
    (
        $(#[$meta:meta])*
        $name:ident (max = $max:literal) { $( $(#[$vmeta:meta])* $variant:ident = $code:literal => $text:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl Categorical for $name {
            const DOMAIN_MAX: u8 = $max;

            fn code(self) -> u8 {
                match self {
                    $( $name::$variant => $code ),+
                }
            }

            fn from_code(code: u8) -> Option<Self> {
                match code {
                    $( $code => Some($name::$variant), )+
                    _ => None,
                }
            }

            fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl FromStr for $name {
            type Err = AtlasError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $( $text => Ok($name::$variant), )+
                    other => Err(AtlasError::InvalidInput(format!(
                        "{}: 알 수 없는 값 '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

categorical! {
    /// 첫 캔들의 전일 레인지(PDR) 대비 위치.
    C1Context (max = 2) {
        /// 전일 레인지 안쪽
        InsidePdr = 0 => "inside_pdr",
        /// 전일 고가(PDH) 돌파
        BreaksPdh = 1 => "breaks_pdh",
        /// 전일 저가(PDL) 이탈
        BreaksPdl = 2 => "breaks_pdl",
    }
}

categorical! {
    /// 첫 캔들의 움직임.
    C1Behavior (max = 2) {
        Ranging = 0 => "ranging",
        TrendsUp = 1 => "trends_up",
        TrendsDown = 2 => "trends_down",
    }
}

categorical! {
    /// 직전 캔들 대비 C2~C4의 액션.
    CandleAction (max = 3) {
        InsideBar = 0 => "inside_bar",
        BreaksHigh = 1 => "breaks_high",
        BreaksLow = 2 => "breaks_low",
        /// 양방향 돌파
        Whipsaw = 3 => "whipsaw",
    }
}

categorical! {
    /// 직전 캔들 레인지 대비 종가 위치.
    CandleClose (max = 2) {
        Inside = 0 => "inside",
        Above = 1 => "above",
        Below = 2 => "below",
    }
}

categorical! {
    /// 같은 움직임에서 함께 돌파된 추가 레벨.
    ///
    /// 보조 신호이므로 `None`이 기본값입니다.
    #[derive(Default)]
    LevelQualifier (max = 6) {
        #[default]
        None = 0 => "none",
        PlusPdh = 1 => "plus_pdh",
        PlusPdl = 2 => "plus_pdl",
        PlusSetupHigh = 3 => "plus_setup_high",
        PlusSetupLow = 4 => "plus_setup_low",
        PlusPdhAndSetup = 5 => "plus_pdh_and_setup",
        PlusPdlAndSetup = 6 => "plus_pdl_and_setup",
    }
}

/// C2~C4 한 캔들의 관측값.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageObservation {
    pub action: CandleAction,
    pub close: CandleClose,
    #[serde(default)]
    pub qualifier: LevelQualifier,
}

impl StageObservation {
    /// 한정자 없는 관측값을 생성합니다.
    pub fn new(action: CandleAction, close: CandleClose) -> Self {
        Self {
            action,
            close,
            qualifier: LevelQualifier::None,
        }
    }

    /// 한정자를 설정합니다.
    pub fn with_qualifier(mut self, qualifier: LevelQualifier) -> Self {
        self.qualifier = qualifier;
        self
    }
}

/// 11개 슬롯으로 구성된 4캔들 관측값.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub c1_context: C1Context,
    pub c1_behavior: C1Behavior,
    pub c2: StageObservation,
    pub c3: StageObservation,
    pub c4: StageObservation,
}

impl Observation {
    /// 관측값을 피처 벡터로 인코딩합니다.
    pub fn encode(&self) -> FeatureVector {
        FeatureVector {
            c1_context: self.c1_context.code(),
            c1_behavior: self.c1_behavior.code(),
            c2_action: self.c2.action.code(),
            c2_close: self.c2.close.code(),
            c2_qualifier: self.c2.qualifier.code(),
            c3_action: self.c3.action.code(),
            c3_close: self.c3.close.code(),
            c3_qualifier: self.c3.qualifier.code(),
            c4_action: self.c4.action.code(),
            c4_close: self.c4.close.code(),
            c4_qualifier: self.c4.qualifier.code(),
        }
    }

    /// 11개 문자열 필드에서 관측값을 파싱합니다.
    ///
    /// 순서: c1_context, c1_behavior, (c2, c3, c4) × (action, close, qualifier).
    /// 열거형 밖의 값은 조용히 대체하지 않고 `InvalidInput`으로 실패합니다.
    pub fn parse_fields(fields: &[&str; 11]) -> AtlasResult<Self> {
        let stage = |offset: usize| -> AtlasResult<StageObservation> {
            Ok(StageObservation {
                action: fields[offset].parse()?,
                close: fields[offset + 1].parse()?,
                qualifier: fields[offset + 2].parse()?,
            })
        };

        Ok(Self {
            c1_context: fields[0].parse()?,
            c1_behavior: fields[1].parse()?,
            c2: stage(2)?,
            c3: stage(5)?,
            c4: stage(8)?,
        })
    }
}

impl From<&Observation> for FeatureVector {
    fn from(observation: &Observation) -> Self {
        observation.encode()
    }
}

fn decode_slot<T: Categorical>(slot: &str, code: u8) -> AtlasResult<T> {
    T::from_code(code).ok_or_else(|| {
        AtlasError::InvalidInput(format!(
            "{}: 코드 {}가 도메인 [0, {}]을 벗어났습니다",
            slot,
            code,
            T::DOMAIN_MAX
        ))
    })
}

impl FeatureVector {
    /// 피처 벡터를 관측값으로 복원합니다.
    pub fn decode(&self) -> AtlasResult<Observation> {
        let stage = |name: &str, action: u8, close: u8, qualifier: u8| -> AtlasResult<StageObservation> {
            Ok(StageObservation {
                action: decode_slot(&format!("{}_action", name), action)?,
                close: decode_slot(&format!("{}_close", name), close)?,
                qualifier: decode_slot(&format!("{}_qualifier", name), qualifier)?,
            })
        };

        Ok(Observation {
            c1_context: decode_slot("c1_context", self.c1_context)?,
            c1_behavior: decode_slot("c1_behavior", self.c1_behavior)?,
            c2: stage("c2", self.c2_action, self.c2_close, self.c2_qualifier)?,
            c3: stage("c3", self.c3_action, self.c3_close, self.c3_qualifier)?,
            c4: stage("c4", self.c4_action, self.c4_close, self.c4_qualifier)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Observation {
        Observation {
            c1_context: C1Context::InsidePdr,
            c1_behavior: C1Behavior::Ranging,
            c2: StageObservation::new(CandleAction::BreaksLow, CandleClose::Inside),
            c3: StageObservation::new(CandleAction::BreaksHigh, CandleClose::Inside),
            c4: StageObservation::new(CandleAction::Whipsaw, CandleClose::Above),
        }
    }

    #[test]
    fn test_domain_max() {
        assert_eq!(C1Context::DOMAIN_MAX, 2);
        assert_eq!(C1Behavior::DOMAIN_MAX, 2);
        assert_eq!(CandleAction::DOMAIN_MAX, 3);
        assert_eq!(CandleClose::DOMAIN_MAX, 2);
        assert_eq!(LevelQualifier::DOMAIN_MAX, 6);
    }

    #[test]
    fn test_encode() {
        let fv = sample().encode();
        assert_eq!(fv.c1_context, 0);
        assert_eq!(fv.c2_action, 2);
        assert_eq!(fv.c3_action, 1);
        assert_eq!(fv.c4_action, 3);
        assert_eq!(fv.c4_close, 1);
        assert_eq!(fv.c2_qualifier, 0);
    }

    #[test]
    fn test_encode_qualifier() {
        let mut obs = sample();
        obs.c3 = obs.c3.with_qualifier(LevelQualifier::PlusPdhAndSetup);
        assert_eq!(obs.encode().c3_qualifier, 5);
    }

    #[test]
    fn test_decode_restores_observation() {
        let obs = sample();
        assert_eq!(obs.encode().decode().unwrap(), obs);
    }

    #[test]
    fn test_decode_out_of_domain_fails() {
        let mut fv = sample().encode();
        fv.c2_action = 9;
        let err = fv.decode().unwrap_err();
        assert!(matches!(err, AtlasError::InvalidInput(msg) if msg.contains("c2_action")));
    }

    #[test]
    fn test_parse_fields() {
        let fields = [
            "inside_pdr", "ranging",
            "breaks_low", "inside", "none",
            "breaks_high", "inside", "none",
            "whipsaw", "above", "none",
        ];
        assert_eq!(Observation::parse_fields(&fields).unwrap(), sample());
    }

    #[test]
    fn test_parse_unknown_value_fails_loudly() {
        assert!("sideways".parse::<C1Behavior>().is_err());
        assert!("plus_everything".parse::<LevelQualifier>().is_err());
        assert_eq!("Breaks_High".parse::<CandleAction>().unwrap(), CandleAction::BreaksHigh);
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&LevelQualifier::PlusPdlAndSetup).unwrap();
        assert_eq!(json, "\"plus_pdl_and_setup\"");
    }

    #[test]
    fn test_qualifier_defaults_to_none() {
        assert_eq!(LevelQualifier::default(), LevelQualifier::None);

        // 한정자를 생략한 관측값은 none으로 읽힙니다
        let stage: StageObservation =
            serde_json::from_str(r#"{"action": "whipsaw", "close": "above"}"#).unwrap();
        assert_eq!(stage.qualifier, LevelQualifier::None);
        assert_eq!(stage, StageObservation::new(CandleAction::Whipsaw, CandleClose::Above));
    }
}
