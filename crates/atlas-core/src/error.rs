//! 매칭 엔진의 에러 타입.
//!
//! 이 모듈은 엔진 전반에서 사용되는 에러 타입을 정의합니다.

use thiserror::Error;

/// 핵심 엔진 에러.
#[derive(Debug, Error)]
pub enum AtlasError {
    /// 설정 에러 (잘못된 카탈로그, 범위를 벗어난 슬롯 값 등)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 카탈로그가 비어 있음
    #[error("설정 에러: 시나리오 카탈로그가 비어 있습니다")]
    EmptyCatalog,

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 찾을 수 없음
    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    /// 저장소 에러
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),
}

/// 엔진 작업을 위한 Result 타입.
pub type AtlasResult<T> = Result<T, AtlasError>;

impl AtlasError {
    /// 설정 문제로 인한 에러인지 확인합니다.
    ///
    /// 설정 에러는 재시도로 해결되지 않으며 카탈로그나 설정 파일을 고쳐야 합니다.
    pub fn is_config(&self) -> bool {
        matches!(self, AtlasError::Config(_) | AtlasError::EmptyCatalog)
    }

    /// 저장소 장애로 인한 에러인지 확인합니다.
    pub fn is_storage(&self) -> bool {
        matches!(self, AtlasError::Storage(_))
    }
}

impl From<serde_json::Error> for AtlasError {
    fn from(err: serde_json::Error) -> Self {
        AtlasError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for AtlasError {
    fn from(err: toml::de::Error) -> Self {
        AtlasError::Serialization(err.to_string())
    }
}
