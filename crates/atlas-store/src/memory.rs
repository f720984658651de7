//! 프로세스 메모리 기반 저장소.
//!
//! 데이터베이스 없이 실행하거나 테스트할 때 사용합니다.
//! 모든 상태가 하나의 `RwLock` 뒤에 있으므로 레코드 갱신과 로그 추가는
//! 같은 쓰기 가드 안에서 함께 반영됩니다.

use std::collections::HashMap;

use async_trait::async_trait;
use atlas_core::{ConfidenceRecord, TradeLogEntry};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::repository::{ConfidenceRepository, NewTradeLog, RecordUpdate};

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<String, ConfidenceRecord>,
    trades: Vec<TradeLogEntry>,
    next_trade_id: i64,
}

/// 메모리 신뢰도 저장소.
#[derive(Debug, Default)]
pub struct MemoryConfidenceRepository {
    state: RwLock<MemoryState>,
}

impl MemoryConfidenceRepository {
    /// 빈 저장소를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 로그 건수.
    pub async fn trade_count(&self) -> usize {
        self.state.read().await.trades.len()
    }
}

#[async_trait]
impl ConfidenceRepository for MemoryConfidenceRepository {
    async fn find(&self, scenario_id: &str) -> Result<Option<ConfidenceRecord>> {
        Ok(self.state.read().await.records.get(scenario_id).cloned())
    }

    async fn find_many(
        &self,
        scenario_ids: &[String],
    ) -> Result<HashMap<String, ConfidenceRecord>> {
        let state = self.state.read().await;
        Ok(scenario_ids
            .iter()
            .filter_map(|id| state.records.get(id).map(|r| (id.clone(), r.clone())))
            .collect())
    }

    async fn apply_outcome(
        &self,
        entry: NewTradeLog,
        update: RecordUpdate<'_>,
    ) -> Result<(ConfidenceRecord, TradeLogEntry)> {
        let mut state = self.state.write().await;

        let record = update(state.records.get(&entry.scenario_id));

        state.next_trade_id += 1;
        let trade = entry.into_entry(state.next_trade_id);

        state.records.insert(record.scenario_id.clone(), record.clone());
        state.trades.push(trade.clone());

        debug!(
            scenario_id = %record.scenario_id,
            trade_id = trade.id,
            "Outcome committed to memory store"
        );

        Ok((record, trade))
    }

    async fn list_records(&self) -> Result<Vec<ConfidenceRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<ConfidenceRecord> = state.records.values().cloned().collect();
        records.sort_by(|a, b| a.scenario_id.cmp(&b.scenario_id));
        Ok(records)
    }

    async fn recent_trades(&self, limit: usize) -> Result<Vec<TradeLogEntry>> {
        let state = self.state.read().await;
        let mut trades = state.trades.clone();
        trades.sort_by(|a, b| b.logged_at.cmp(&a.logged_at).then(b.id.cmp(&a.id)));
        trades.truncate(limit);
        Ok(trades)
    }
}
