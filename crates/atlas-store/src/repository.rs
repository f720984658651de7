//! 신뢰도 저장소 추상화.
//!
//! 저장 엔진에 필요한 연산은 다섯 가지뿐입니다:
//! 1. 시나리오 ID로 단건 조회
//! 2. 여러 ID의 일관된 스냅샷 조회
//! 3. 레코드 갱신 + 로그 추가를 하나의 원자 단위로 커밋
//! 4. 레코드 전체 조회
//! 5. 최근 N건 로그 조회 (시각 내림차순)

use std::collections::HashMap;

use async_trait::async_trait;
use atlas_core::{ConfidenceRecord, MatchType, Outcome, OutcomeInput, TradeLogEntry};
use chrono::{DateTime, Utc};

use crate::error::Result;

/// 기존 레코드(없으면 `None`)로부터 새 레코드를 계산하는 갱신 함수.
pub type RecordUpdate<'a> = &'a (dyn Fn(Option<&ConfidenceRecord>) -> ConfidenceRecord + Send + Sync);

/// 추가할 매매 로그 (ID는 저장소가 부여).
#[derive(Debug, Clone, PartialEq)]
pub struct NewTradeLog {
    pub scenario_id: String,
    pub outcome: Outcome,
    pub loss_reason: Option<String>,
    pub match_type: MatchType,
    pub similarity: f64,
    pub logged_at: DateTime<Utc>,
}

impl NewTradeLog {
    /// 결과 입력과 기록 시각으로 로그를 생성합니다.
    pub fn from_input(input: &OutcomeInput, logged_at: DateTime<Utc>) -> Self {
        Self {
            scenario_id: input.scenario_id.clone(),
            outcome: input.outcome,
            loss_reason: input.loss_reason.clone(),
            match_type: input.match_type,
            similarity: input.similarity,
            logged_at,
        }
    }

    /// 저장소가 부여한 ID로 로그 항목을 완성합니다.
    pub fn into_entry(self, id: i64) -> TradeLogEntry {
        TradeLogEntry {
            id,
            scenario_id: self.scenario_id,
            outcome: self.outcome,
            loss_reason: self.loss_reason,
            match_type: self.match_type,
            similarity: self.similarity,
            logged_at: self.logged_at,
        }
    }
}

/// 신뢰도 레코드와 매매 로그의 영속 저장소.
#[async_trait]
pub trait ConfidenceRepository: Send + Sync {
    /// 시나리오의 신뢰도 레코드를 조회합니다.
    async fn find(&self, scenario_id: &str) -> Result<Option<ConfidenceRecord>>;

    /// 여러 시나리오의 레코드를 한 시점에서 조회합니다.
    ///
    /// 레코드가 없는 ID는 결과에 포함되지 않습니다.
    async fn find_many(&self, scenario_ids: &[String])
        -> Result<HashMap<String, ConfidenceRecord>>;

    /// 레코드를 읽고, `update`로 갱신한 뒤, 로그를 추가합니다.
    ///
    /// 세 단계는 하나의 원자 단위입니다. 어느 하나라도 실패하면
    /// 아무것도 기록되지 않습니다.
    async fn apply_outcome(
        &self,
        entry: NewTradeLog,
        update: RecordUpdate<'_>,
    ) -> Result<(ConfidenceRecord, TradeLogEntry)>;

    /// 모든 신뢰도 레코드를 시나리오 ID 순으로 조회합니다.
    async fn list_records(&self) -> Result<Vec<ConfidenceRecord>>;

    /// 최근 로그 `limit`건을 시각 내림차순(동시각은 나중 기록 우선)으로 조회합니다.
    async fn recent_trades(&self, limit: usize) -> Result<Vec<TradeLogEntry>>;
}
