//! 매매 결과, 신뢰도 레코드, 매매 로그.
//!
//! - `ConfidenceRecord` - 시나리오별 적응형 신뢰도 가중치와 승/패 카운터
//! - `TradeLogEntry` - 결과 기록 시점의 매칭 정보를 담은 추가 전용 로그

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AtlasError;

/// 매매 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Loss => "loss",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = AtlasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "win" => Ok(Outcome::Win),
            "loss" => Ok(Outcome::Loss),
            other => Err(AtlasError::InvalidInput(format!("알 수 없는 결과: {}", other))),
        }
    }
}

/// 매칭 분류.
///
/// 거리가 정확히 0일 때만 `Exact`이며 "거의 일치" 단계는 없습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Inferred,
}

impl MatchType {
    /// 거리로부터 분류를 결정합니다.
    pub fn from_distance(distance: f64) -> Self {
        if distance == 0.0 {
            MatchType::Exact
        } else {
            MatchType::Inferred
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Inferred => "inferred",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MatchType {
    type Err = AtlasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(MatchType::Exact),
            "inferred" => Ok(MatchType::Inferred),
            other => Err(AtlasError::InvalidInput(format!("알 수 없는 매칭 분류: {}", other))),
        }
    }
}

/// 시나리오별 신뢰도 레코드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceRecord {
    /// 시나리오 ID
    pub scenario_id: String,
    /// 누적 승리 횟수
    pub total_wins: u32,
    /// 누적 패배 횟수
    pub total_losses: u32,
    /// 현재 신뢰도 가중치 (0.1 ~ 3.0)
    pub current_weight: f64,
    /// 마지막 갱신 시각
    pub last_updated: DateTime<Utc>,
}

impl ConfidenceRecord {
    /// 총 기록된 매매 수.
    pub fn total_trades(&self) -> u32 {
        self.total_wins + self.total_losses
    }

    /// 승률 (0.0 ~ 1.0). 기록이 없으면 `None`.
    pub fn win_rate(&self) -> Option<f64> {
        let total = self.total_trades();
        if total == 0 {
            return None;
        }
        Some(self.total_wins as f64 / total as f64)
    }
}

/// 기록할 매매 결과 입력.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeInput {
    pub scenario_id: String,
    pub outcome: Outcome,
    pub match_type: MatchType,
    pub similarity: f64,
    pub loss_reason: Option<String>,
}

impl OutcomeInput {
    /// 새 결과 입력을 생성합니다.
    pub fn new(
        scenario_id: impl Into<String>,
        outcome: Outcome,
        match_type: MatchType,
        similarity: f64,
    ) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            outcome,
            match_type,
            similarity,
            loss_reason: None,
        }
    }

    /// 패배 사유를 설정합니다.
    pub fn with_loss_reason(mut self, reason: impl Into<String>) -> Self {
        self.loss_reason = Some(reason.into());
        self
    }
}

/// 추가 전용 매매 로그 항목.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLogEntry {
    /// 저장소가 부여한 증가 순번
    pub id: i64,
    pub scenario_id: String,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss_reason: Option<String>,
    pub match_type: MatchType,
    pub similarity: f64,
    pub logged_at: DateTime<Utc>,
}
