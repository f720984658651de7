//! 시나리오(셋업) 카탈로그 항목.
//!
//! 시나리오는 시작 시 한 번 로드되고 이후 변경되지 않는 참조 데이터입니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::feature::FeatureVector;
use crate::error::AtlasError;

/// 시나리오 분류 (닫힌 5종).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// 검증된 셋업
    Vetted,
    /// 전일 레인지 내부
    InsidePdr,
    /// 휩쏘
    Whipsaw,
    /// 전일 고가 돌파
    PdhBreak,
    /// 전일 저가 이탈
    PdlBreak,
}

impl Category {
    /// 화면 표시용 라벨.
    pub fn label(self) -> &'static str {
        match self {
            Category::Vetted => "Vetted",
            Category::InsidePdr => "Inside PDR",
            Category::Whipsaw => "Whipsaw",
            Category::PdhBreak => "PDH Break",
            Category::PdlBreak => "PDL Break",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Category {
    type Err = AtlasError;

    /// 식별자(`inside_pdr`)와 라벨(`Inside PDR`) 모두 허용합니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "vetted" => Ok(Category::Vetted),
            "inside_pdr" => Ok(Category::InsidePdr),
            "whipsaw" => Ok(Category::Whipsaw),
            "pdh_break" => Ok(Category::PdhBreak),
            "pdl_break" => Ok(Category::PdlBreak),
            _ => Err(AtlasError::InvalidInput(format!("unknown category: {}", s))),
        }
    }
}

/// 셋업의 방향성.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    Bullish,
    Bearish,
    HeavilyBullish,
    HeavilyBearish,
    Mixed,
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Bias::Bullish => "Bullish",
            Bias::Bearish => "Bearish",
            Bias::HeavilyBullish => "Heavily Bullish",
            Bias::HeavilyBearish => "Heavily Bearish",
            Bias::Mixed => "Mixed",
        };
        write!(f, "{}", s)
    }
}

/// 캔들별 조건 설명.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConditions {
    pub c1: String,
    pub c2: String,
    pub c3: String,
    pub c4: String,
}

/// 카탈로그의 참조 시나리오.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// 고유 식별자 (예: "V-01")
    pub id: String,
    /// 분류
    pub category: Category,
    /// 표시 이름
    pub label: String,
    /// 캔들별 조건 설명
    pub conditions: StageConditions,
    /// 추천 진입 위치
    pub entry: String,
    /// 방향성
    pub bias: Bias,
    /// 목표가 설명
    pub target: String,
    /// 주의 사항
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// 참조 피처 벡터
    pub features: FeatureVector,
}
