//! 피처 벡터와 슬롯 정의.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::observation::{C1Behavior, C1Context, CandleAction, CandleClose, Categorical, LevelQualifier};
use crate::error::{AtlasError, AtlasResult};

/// 피처 벡터의 이름 있는 슬롯 (고정 순서).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSlot {
    C1Context,
    C1Behavior,
    C2Action,
    C2Close,
    C2Qualifier,
    C3Action,
    C3Close,
    C3Qualifier,
    C4Action,
    C4Close,
    C4Qualifier,
}

impl FeatureSlot {
    /// 전체 슬롯 (벡터 순서).
    pub const ALL: [FeatureSlot; 11] = [
        FeatureSlot::C1Context,
        FeatureSlot::C1Behavior,
        FeatureSlot::C2Action,
        FeatureSlot::C2Close,
        FeatureSlot::C2Qualifier,
        FeatureSlot::C3Action,
        FeatureSlot::C3Close,
        FeatureSlot::C3Qualifier,
        FeatureSlot::C4Action,
        FeatureSlot::C4Close,
        FeatureSlot::C4Qualifier,
    ];

    /// 슬롯에 인코딩 가능한 최대값 (정규화 분모).
    pub fn domain_max(self) -> u8 {
        match self {
            FeatureSlot::C1Context => C1Context::DOMAIN_MAX,
            FeatureSlot::C1Behavior => C1Behavior::DOMAIN_MAX,
            FeatureSlot::C2Action | FeatureSlot::C3Action | FeatureSlot::C4Action => {
                CandleAction::DOMAIN_MAX
            }
            FeatureSlot::C2Close | FeatureSlot::C3Close | FeatureSlot::C4Close => {
                CandleClose::DOMAIN_MAX
            }
            FeatureSlot::C2Qualifier | FeatureSlot::C3Qualifier | FeatureSlot::C4Qualifier => {
                LevelQualifier::DOMAIN_MAX
            }
        }
    }

    /// 보조 신호(한정자) 슬롯 여부.
    pub fn is_qualifier(self) -> bool {
        matches!(
            self,
            FeatureSlot::C2Qualifier | FeatureSlot::C3Qualifier | FeatureSlot::C4Qualifier
        )
    }

    /// snake_case 슬롯 이름.
    pub fn name(self) -> &'static str {
        match self {
            FeatureSlot::C1Context => "c1_context",
            FeatureSlot::C1Behavior => "c1_behavior",
            FeatureSlot::C2Action => "c2_action",
            FeatureSlot::C2Close => "c2_close",
            FeatureSlot::C2Qualifier => "c2_qualifier",
            FeatureSlot::C3Action => "c3_action",
            FeatureSlot::C3Close => "c3_close",
            FeatureSlot::C3Qualifier => "c3_qualifier",
            FeatureSlot::C4Action => "c4_action",
            FeatureSlot::C4Close => "c4_close",
            FeatureSlot::C4Qualifier => "c4_qualifier",
        }
    }
}

impl fmt::Display for FeatureSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 11개 슬롯의 정수 코드로 구성된 피처 벡터.
///
/// 모든 슬롯 값은 `[0, domain_max(slot)]` 범위에 있어야 합니다.
/// 역직렬화 시 슬롯이 하나라도 빠지면 실패합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    pub c1_context: u8,
    pub c1_behavior: u8,
    pub c2_action: u8,
    pub c2_close: u8,
    pub c2_qualifier: u8,
    pub c3_action: u8,
    pub c3_close: u8,
    pub c3_qualifier: u8,
    pub c4_action: u8,
    pub c4_close: u8,
    pub c4_qualifier: u8,
}

impl FeatureVector {
    /// 슬롯 값을 반환합니다.
    pub fn get(&self, slot: FeatureSlot) -> u8 {
        match slot {
            FeatureSlot::C1Context => self.c1_context,
            FeatureSlot::C1Behavior => self.c1_behavior,
            FeatureSlot::C2Action => self.c2_action,
            FeatureSlot::C2Close => self.c2_close,
            FeatureSlot::C2Qualifier => self.c2_qualifier,
            FeatureSlot::C3Action => self.c3_action,
            FeatureSlot::C3Close => self.c3_close,
            FeatureSlot::C3Qualifier => self.c3_qualifier,
            FeatureSlot::C4Action => self.c4_action,
            FeatureSlot::C4Close => self.c4_close,
            FeatureSlot::C4Qualifier => self.c4_qualifier,
        }
    }

    /// 슬롯 순서대로 (슬롯, 값) 쌍을 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureSlot, u8)> + '_ {
        FeatureSlot::ALL.iter().map(move |&slot| (slot, self.get(slot)))
    }

    /// 모든 슬롯이 도메인 범위 안에 있는지 검증합니다.
    pub fn validate(&self) -> AtlasResult<()> {
        match self.iter().find(|(slot, value)| *value > slot.domain_max()) {
            Some((slot, value)) => Err(AtlasError::Config(format!(
                "슬롯 {} 값 {}가 최대값 {}를 초과합니다",
                slot,
                value,
                slot.domain_max()
            ))),
            None => Ok(()),
        }
    }
}
