//! SQLite 저장소 구현.
//!
//! 별도 서버 없이 파일 하나에 신뢰도 레코드와 매매 로그를 보존하는
//! 기본 영속 백엔드입니다. 스키마는 PostgreSQL과 같은 두 테이블이며
//! 시각 컬럼은 고정 폭 RFC 3339 문자열로 저장합니다.
//!
//! 결과 기록 트랜잭션은 로그 insert로 시작합니다. SQLite는 첫 쓰기에서
//! 데이터베이스 쓰기 잠금을 잡으므로, 다른 프로세스의 같은 트랜잭션은
//! 레코드를 읽기 전에 `busy_timeout`만큼 대기합니다.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use atlas_core::{ConfidenceRecord, DatabaseConfig, TradeLogEntry};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use tracing::{debug, info, instrument};

use crate::error::{Result, StoreError};
use crate::repository::{ConfidenceRepository, NewTradeLog, RecordUpdate};
use crate::rows::{count_to_db, timestamp_to_text, ConfidenceRow, TradeLogRow};

/// 쓰기 잠금 대기 한도.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite 연결 풀 래퍼.
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// `sqlite://` URL의 데이터베이스 파일을 엽니다.
    ///
    /// 파일과 상위 디렉터리가 없으면 생성합니다.
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::ConnectionError(format!("{}: {}", url, e)))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    StoreError::ConnectionError(format!("{}: {}", parent.display(), e))
                })?;
            }
        }

        info!(path = %options.get_filename().display(), "Opening SQLite database...");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        Ok(Self { pool })
    }

    /// 내부 연결 풀을 반환합니다.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 데이터베이스 마이그레이션을 실행합니다.
    pub async fn migrate(&self) -> Result<()> {
        info!("Running SQLite migrations...");

        sqlx::migrate!("../../migrations/sqlite").run(&self.pool).await?;

        info!("Migrations completed successfully");
        Ok(())
    }
}

/// SQLite 신뢰도 저장소.
#[derive(Clone)]
pub struct SqliteConfidenceRepository {
    db: SqliteDatabase,
}

impl SqliteConfidenceRepository {
    /// 새 저장소를 생성합니다.
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConfidenceRepository for SqliteConfidenceRepository {
    async fn find(&self, scenario_id: &str) -> Result<Option<ConfidenceRecord>> {
        let row: Option<ConfidenceRow> = sqlx::query_as(
            r#"
            SELECT scenario_id, total_wins, total_losses, current_weight, last_updated
            FROM confidence_records
            WHERE scenario_id = ?
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
        if scenario_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT scenario_id, total_wins, total_losses, current_weight, last_updated \
             FROM confidence_records WHERE scenario_id IN (",
        );
        let mut ids = query.separated(", ");
        for id in scenario_ids {
            ids.push_bind(id.as_str());
        }
        ids.push_unseparated(")");

        let rows: Vec<ConfidenceRow> = query.build_query_as().fetch_all(self.db.pool()).await?;

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

        // 쓰기로 시작해야 읽기 전에 쓰기 잠금이 잡힙니다
        let (trade_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO trade_logs
                (scenario_id, outcome, loss_reason, match_type, similarity, logged_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&entry.scenario_id)
        .bind(entry.outcome.as_str())
        .bind(&entry.loss_reason)
        .bind(entry.match_type.as_str())
        .bind(entry.similarity)
        .bind(timestamp_to_text(entry.logged_at))
        .fetch_one(&mut *tx)
        .await?;

        let existing: Option<ConfidenceRow> = sqlx::query_as(
            r#"
            SELECT scenario_id, total_wins, total_losses, current_weight, last_updated
            FROM confidence_records
            WHERE scenario_id = ?
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
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (scenario_id) DO UPDATE SET
                total_wins = excluded.total_wins,
                total_losses = excluded.total_losses,
                current_weight = excluded.current_weight,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(&record.scenario_id)
        .bind(count_to_db(record.total_wins)?)
        .bind(count_to_db(record.total_losses)?)
        .bind(record.current_weight)
        .bind(timestamp_to_text(record.last_updated))
        .execute(&mut *tx)
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
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(TradeLogEntry::try_from).collect()
    }
}
