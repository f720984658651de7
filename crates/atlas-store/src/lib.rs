//! 적응형 신뢰도 저장소.
//!
//! 이 crate는 다음을 제공합니다:
//! - 시나리오별 신뢰도 가중치 학습 규칙
//! - 저장소 추상화 (`ConfidenceRepository`)와 SQLite/PostgreSQL/메모리 구현
//! - 키별 직렬화를 보장하는 `ConfidenceStore`
//! - 대시보드용 요약 통계

pub mod error;
pub mod learning;
pub mod memory;
pub mod postgres;
pub mod report;
pub mod repository;
mod rows;
pub mod sqlite;
pub mod store;

pub use error::{Result, StoreError};
pub use learning::*;
pub use memory::MemoryConfidenceRepository;
pub use postgres::{Database, PgConfidenceRepository};
pub use report::{DashboardSummary, WeightTier};
pub use repository::{ConfidenceRepository, NewTradeLog, RecordUpdate};
pub use sqlite::{SqliteConfidenceRepository, SqliteDatabase};
pub use store::{ConfidenceStore, StorageBackend};
