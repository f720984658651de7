//! 저장소 모듈 오류 타입.

use atlas_core::AtlasError;
use thiserror::Error;

/// 신뢰도 저장소 관련 오류.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 마이그레이션 오류
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// 저장된 값이 도메인 규칙과 맞지 않음
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// 호출자가 잘못된 값을 전달함
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 연결 풀 소진
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,
            sqlx::Error::Io(e) => StoreError::ConnectionError(e.to_string()),
            sqlx::Error::Database(db_err) => StoreError::QueryError(db_err.message().to_string()),
            _ => StoreError::QueryError(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::MigrationError(err.to_string())
    }
}

impl From<StoreError> for AtlasError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidInput(msg) => AtlasError::InvalidInput(msg),
            other => AtlasError::Storage(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_atlas_error() {
        let err: AtlasError = StoreError::PoolExhausted.into();
        assert!(err.is_storage());

        let err: AtlasError = StoreError::InvalidInput("similarity".to_string()).into();
        assert!(matches!(err, AtlasError::InvalidInput(_)));
    }

    #[test]
    fn test_from_sqlx_pool_timeout() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, StoreError::PoolExhausted));
    }
}
