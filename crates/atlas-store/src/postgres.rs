//! PostgreSQL 저장소 구현.
//!
//! `confidence_records`와 `trade_logs` 두 테이블을 사용합니다.
//! 결과 기록은 시나리오 ID의 트랜잭션 advisory lock을 먼저 잡은 뒤
//! 레코드 upsert와 로그 insert를 함께 커밋합니다. 레코드가 아직 없으면
//! `FOR UPDATE`가 잠글 행이 없으므로, 여러 프로세스가 같은 시나리오의
//! 첫 결과를 동시에 기록할 때도 advisory lock이 순서를 정합니다.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use atlas_core::{ConfidenceRecord, DatabaseConfig, TradeLogEntry};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, instrument};

use crate::error::{Result, StoreError};
use crate::repository::{ConfidenceRepository, NewTradeLog, RecordUpdate};
use crate::rows::{count_to_db, ConfidenceRow, TradeLogRow};

/// 데이터베이스 연결 풀 래퍼.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 새로운 데이터베이스 연결 풀을 생성합니다.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        info!("Database connection established");

        Ok(Self { pool })
    }

    /// 내부 연결 풀을 반환합니다.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 데이터베이스 마이그레이션을 실행합니다.
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");

        sqlx::migrate!("../../migrations/postgres").run(&self.pool).await?;

        info!("Migrations completed successfully");
        Ok(())
    }
}

/// PostgreSQL 신뢰도 저장소.
#[derive(Clone)]
pub struct PgConfidenceRepository {
    db: Database,
}

impl PgConfidenceRepository {
    /// 새 저장소를 생성합니다.
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConfidenceRepository for PgConfidenceRepository {
    async fn find(&self, scenario_id: &str) -> Result<Option<ConfidenceRecord>> {
        let row: Option<ConfidenceRow> = sqlx::query_as(
            r#"
            SELECT scenario_id, total_wins, total_losses, current_weight, last_updated
            FROM confidence_records
            WHERE scenario_id = $1
            "#,
        )
        .bind(scenario_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(ConfidenceRecord::try_from).transpose()
    }

    async fn find_many(
        &self,
        scenario_ids: &[String],
    ) -> Result<HashMap<String, ConfidenceRecord>> {
        // 단일 SELECT이므로 하나의 스냅샷에서 읽습니다
        let rows: Vec<ConfidenceRow> = sqlx::query_as(
            r#"
            SELECT scenario_id, total_wins, total_losses, current_weight, last_updated
            FROM confidence_records
            WHERE scenario_id = ANY($1)
            "#,
        )
        .bind(scenario_ids)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter()
            .map(|row| {
                let record = ConfidenceRecord::try_from(row)?;
                Ok((record.scenario_id.clone(), record))
            })
            .collect()
    }

    #[instrument(skip(self, entry, update), fields(scenario_id = %entry.scenario_id))]
    async fn apply_outcome(
        &self,
        entry: NewTradeLog,
        update: RecordUpdate<'_>,
    ) -> Result<(ConfidenceRecord, TradeLogEntry)> {
        let mut tx = self.db.pool().begin().await?;

        // 커밋/롤백 시 자동 해제
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&entry.scenario_id)
            .execute(&mut *tx)
            .await?;

        let existing: Option<ConfidenceRow> = sqlx::query_as(
            r#"
            SELECT scenario_id, total_wins, total_losses, current_weight, last_updated
            FROM confidence_records
            WHERE scenario_id = $1
            FOR UPDATE
            "#,
        )
        .bind(&entry.scenario_id)
        .fetch_optional(&mut *tx)
        .await?;
        let existing = existing.map(ConfidenceRecord::try_from).transpose()?;

        let record = update(existing.as_ref());

        sqlx::query(
            r#"
            INSERT INTO confidence_records
                (scenario_id, total_wins, total_losses, current_weight, last_updated)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (scenario_id) DO UPDATE SET
                total_wins = EXCLUDED.total_wins,
                total_losses = EXCLUDED.total_losses,
                current_weight = EXCLUDED.current_weight,
                last_updated = EXCLUDED.last_updated
            "#,
        )
        .bind(&record.scenario_id)
        .bind(count_to_db(record.total_wins)?)
        .bind(count_to_db(record.total_losses)?)
        .bind(record.current_weight)
        .bind(record.last_updated)
        .execute(&mut *tx)
        .await?;

        let (trade_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO trade_logs
                (scenario_id, outcome, loss_reason, match_type, similarity, logged_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&entry.scenario_id)
        .bind(entry.outcome.as_str())
        .bind(&entry.loss_reason)
        .bind(entry.match_type.as_str())
        .bind(entry.similarity)
        .bind(entry.logged_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(trade_id, weight = record.current_weight, "Outcome committed");

        Ok((record, entry.into_entry(trade_id)))
    }

    async fn list_records(&self) -> Result<Vec<ConfidenceRecord>> {
        let rows: Vec<ConfidenceRow> = sqlx::query_as(
            r#"
            SELECT scenario_id, total_wins, total_losses, current_weight, last_updated
            FROM confidence_records
            ORDER BY scenario_id
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(ConfidenceRecord::try_from).collect()
    }

    async fn recent_trades(&self, limit: usize) -> Result<Vec<TradeLogEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows: Vec<TradeLogRow> = sqlx::query_as(
            r#"
            SELECT id, scenario_id, outcome, loss_reason, match_type, similarity, logged_at
            FROM trade_logs
            ORDER BY logged_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(TradeLogEntry::try_from).collect()
    }
}
