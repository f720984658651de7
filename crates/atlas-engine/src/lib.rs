//! 셋업 매칭 엔진.
//!
//! 이 crate는 다음을 제공합니다:
//! - 가중 정규화 거리 기반 유사도 계산 (`SimilarityScorer`)
//! - 시나리오 카탈로그 로드 및 검증 (`Catalog`)
//! - 신뢰도 가중치를 결합한 순위 매칭 (`MatchService`)

pub mod catalog;
pub mod ranking;
pub mod scorer;

pub use catalog::Catalog;
pub use ranking::{ConfidenceStatus, MatchService, RankedMatch};
pub use scorer::{round4, Score, SimilarityScorer, SlotContribution, SlotWeights};
