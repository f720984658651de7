//! SQL 백엔드 공용 행 타입.
//!
//! PostgreSQL과 SQLite 저장소가 같은 컬럼 구성을 쓰므로 행 변환을 공유합니다.

use atlas_core::{ConfidenceRecord, TradeLogEntry};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::FromRow;

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, FromRow)]
pub(crate) struct ConfidenceRow {
    pub scenario_id: String,
    pub total_wins: i32,
    pub total_losses: i32,
    pub current_weight: f64,
    pub last_updated: DateTime<Utc>,
}

impl TryFrom<ConfidenceRow> for ConfidenceRecord {
    type Error = StoreError;

    fn try_from(row: ConfidenceRow) -> Result<Self> {
        let count = |value: i32, column: &str| {
            u32::try_from(value).map_err(|_| {
                StoreError::InvalidData(format!(
                    "{}: negative {} ({})",
                    row.scenario_id, column, value
                ))
            })
        };

        Ok(ConfidenceRecord {
            total_wins: count(row.total_wins, "total_wins")?,
            total_losses: count(row.total_losses, "total_losses")?,
            scenario_id: row.scenario_id.clone(),
            current_weight: row.current_weight,
            last_updated: row.last_updated,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct TradeLogRow {
    pub id: i64,
    pub scenario_id: String,
    pub outcome: String,
    pub loss_reason: Option<String>,
    pub match_type: String,
    pub similarity: f64,
    pub logged_at: DateTime<Utc>,
}

impl TryFrom<TradeLogRow> for TradeLogEntry {
    type Error = StoreError;

    fn try_from(row: TradeLogRow) -> Result<Self> {
        let invalid = |e: atlas_core::AtlasError| {
            StoreError::InvalidData(format!("trade_logs#{}: {}", row.id, e))
        };

        Ok(TradeLogEntry {
            id: row.id,
            outcome: row.outcome.parse().map_err(invalid)?,
            match_type: row.match_type.parse().map_err(invalid)?,
            scenario_id: row.scenario_id,
            loss_reason: row.loss_reason,
            similarity: row.similarity,
            logged_at: row.logged_at,
        })
    }
}

pub(crate) fn count_to_db(value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| StoreError::InvalidData(format!("counter overflow: {}", value)))
}

/// 문자열 정렬이 시각 정렬과 일치하는 고정 폭 UTC 표기.
pub(crate) fn timestamp_to_text(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
