//! # Atlas Core
//!
//! 셋업 매칭 엔진의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 4캔들 관측값과 피처 인코더
//! - 피처 벡터 및 슬롯 정의
//! - 시나리오(셋업) 카탈로그 항목
//! - 신뢰도 레코드와 매매 로그 항목
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
