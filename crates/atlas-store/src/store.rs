//! 신뢰도 저장소 서비스.
//!
//! 시나리오별 가중치 조회와 결과 기록을 담당합니다. 같은 시나리오에 대한
//! 결과 기록은 키별 Lock으로 직렬화되어 카운터와 가중치의
//! read-modify-write 경합이 없으며, 서로 다른 시나리오는 독립적으로 진행됩니다.
//! 키별 Lock은 대기자가 없어지면 맵에서 제거되므로 맵 크기는 동시에
//! 기록 중인 시나리오 수를 넘지 않습니다.

use std::collections::HashMap;
use std::sync::Arc;

use atlas_core::{scenario_span, ConfidenceRecord, DatabaseConfig, OutcomeInput, TradeLogEntry};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, Instrument};

use crate::error::{Result, StoreError};
use crate::learning::{apply_outcome, NEUTRAL_WEIGHT};
use crate::memory::MemoryConfidenceRepository;
use crate::postgres::{Database, PgConfidenceRepository};
use crate::report::DashboardSummary;
use crate::repository::{ConfidenceRepository, NewTradeLog};
use crate::sqlite::{SqliteConfidenceRepository, SqliteDatabase};

/// 시나리오별 기록 Lock 맵.
type KeyLockMap = Arc<RwLock<HashMap<String, Arc<RwLock<()>>>>>;

/// 영속 저장소 백엔드 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    Postgres,
}

impl StorageBackend {
    /// URL 스킴으로 백엔드를 판별합니다.
    pub fn from_url(url: &str) -> Result<Self> {
        let url = url.trim();
        if url.starts_with("sqlite:") {
            Ok(StorageBackend::Sqlite)
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(StorageBackend::Postgres)
        } else {
            Err(StoreError::ConnectionError(format!(
                "unsupported database.url scheme: '{}' (expected sqlite: or postgresql://)",
                url
            )))
        }
    }
}

/// 적응형 신뢰도 저장소.
#[derive(Clone)]
pub struct ConfidenceStore {
    repository: Arc<dyn ConfidenceRepository>,
    key_locks: KeyLockMap,
}

impl ConfidenceStore {
    /// 주어진 저장소 백엔드로 생성합니다.
    pub fn new(repository: Arc<dyn ConfidenceRepository>) -> Self {
        Self {
            repository,
            key_locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// `database.url`이 가리키는 영속 백엔드를 열고 필요하면 마이그레이션합니다.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let repository: Arc<dyn ConfidenceRepository> = match StorageBackend::from_url(&config.url)? {
            StorageBackend::Sqlite => {
                let db = SqliteDatabase::connect(&config.url, config).await?;
                if config.run_migrations {
                    db.migrate().await?;
                }
                info!("Using SQLite confidence store");
                Arc::new(SqliteConfidenceRepository::new(db))
            }
            StorageBackend::Postgres => {
                let db = Database::connect(config).await?;
                if config.run_migrations {
                    db.migrate().await?;
                }
                info!("Using PostgreSQL confidence store");
                Arc::new(PgConfidenceRepository::new(db))
            }
        };

        Ok(Self::new(repository))
    }

    /// 메모리 백엔드로 생성합니다. 프로세스가 끝나면 내용이 사라집니다.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryConfidenceRepository::new()))
    }

    /// 시나리오의 현재 신뢰도 가중치를 반환합니다.
    ///
    /// 기록이 없으면 중립값 1.0입니다.
    pub async fn get_weight(&self, scenario_id: &str) -> Result<f64> {
        let record = self.repository.find(scenario_id).await?;
        Ok(record.map_or(NEUTRAL_WEIGHT, |r| r.current_weight))
    }

    /// 시나리오의 신뢰도 레코드를 반환합니다.
    pub async fn get_record(&self, scenario_id: &str) -> Result<Option<ConfidenceRecord>> {
        self.repository.find(scenario_id).await
    }

    /// 여러 시나리오의 가중치를 한 시점에서 조회합니다.
    ///
    /// 기록이 있는 시나리오만 결과에 포함됩니다.
    pub async fn weights_snapshot(&self, scenario_ids: &[String]) -> Result<HashMap<String, f64>> {
        let records = self.repository.find_many(scenario_ids).await?;
        Ok(records
            .into_iter()
            .map(|(id, record)| (id, record.current_weight))
            .collect())
    }

    /// 매매 결과를 기록하고 갱신된 신뢰도 레코드를 반환합니다.
    ///
    /// 레코드 갱신과 로그 추가는 하나의 원자 단위로 커밋됩니다.
    /// 저장소 오류는 그대로 호출자에게 전달됩니다.
    pub async fn log_outcome(&self, input: OutcomeInput) -> Result<ConfidenceRecord> {
        validate(&input)?;

        let span = scenario_span!("log_outcome", input.scenario_id, input.outcome);
        async {
            let lock = self.get_or_create_lock(&input.scenario_id).await;
            let result = {
                let _guard = lock.write().await;
                self.commit_outcome(&input).await
            };
            self.release_lock(&input.scenario_id, lock).await;

            let (record, trade) = result?;
            info!(
                trade_id = trade.id,
                wins = record.total_wins,
                losses = record.total_losses,
                weight = record.current_weight,
                "Outcome recorded"
            );

            Ok(record)
        }
        .instrument(span)
        .await
    }

    async fn commit_outcome(&self, input: &OutcomeInput) -> Result<(ConfidenceRecord, TradeLogEntry)> {
        let now = Utc::now();
        let scenario_id = input.scenario_id.clone();
        let outcome = input.outcome;
        let update = move |existing: Option<&ConfidenceRecord>| {
            apply_outcome(existing, &scenario_id, outcome, now)
        };

        self.repository
            .apply_outcome(NewTradeLog::from_input(input, now), &update)
            .await
    }

    /// 모든 신뢰도 레코드를 조회합니다.
    pub async fn list_records(&self) -> Result<Vec<ConfidenceRecord>> {
        self.repository.list_records().await
    }

    /// 최근 매매 로그를 시각 내림차순으로 조회합니다.
    pub async fn recent_trades(&self, limit: usize) -> Result<Vec<TradeLogEntry>> {
        self.repository.recent_trades(limit).await
    }

    /// 대시보드 요약을 계산합니다.
    ///
    /// 승률은 최근 `recent_limit`건 기준입니다.
    #[instrument(skip(self))]
    pub async fn summary(&self, recent_limit: usize) -> Result<DashboardSummary> {
        let records = self.repository.list_records().await?;
        let recent = self.repository.recent_trades(recent_limit).await?;
        debug!(records = records.len(), recent = recent.len(), "Summary loaded");
        Ok(DashboardSummary::new(records, recent))
    }

    /// 키별 Lock 획득 또는 생성.
    async fn get_or_create_lock(&self, key: &str) -> Arc<RwLock<()>> {
        let locks = self.key_locks.read().await;
        if let Some(lock) = locks.get(key) {
            return lock.clone();
        }
        drop(locks);

        let mut locks = self.key_locks.write().await;
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    /// 사용이 끝난 키별 Lock을 반납합니다.
    ///
    /// 맵 쓰기 가드 아래에서는 새 복제가 생기지 않으므로, 참조가 맵과
    /// 호출자 둘뿐이면 대기자가 없는 것입니다.
    async fn release_lock(&self, key: &str, lock: Arc<RwLock<()>>) {
        let mut locks = self.key_locks.write().await;
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(key);
        }
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.key_locks.read().await.len()
    }
}

fn validate(input: &OutcomeInput) -> Result<()> {
    if input.scenario_id.trim().is_empty() {
        return Err(StoreError::InvalidInput("scenario_id is empty".to_string()));
    }
    if !(0.0..=1.0).contains(&input.similarity) {
        return Err(StoreError::InvalidInput(format!(
            "similarity {} is outside [0, 1]",
            input.similarity
        )));
    }
    Ok(())
}
