//! Atlas CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 관측값 매칭 및 결과 출력
//! - 매매 결과 기록과 학습 현황 조회
//! - 카탈로그 조회

pub mod commands;
