//! 신뢰도 가중치 학습 규칙.
//!
//! 경사 기반 학습이 아닌 고정 스텝 강화 규칙입니다.
//!
//! | 상황 | 가중치 |
//! |------|--------|
//! | 기록 없음 | 1.0 (중립) |
//! | 첫 승리 | 1.05 |
//! | 첫 패배 | 0.95 |
//! | 이후 승리/패배 | ±0.05, [0.1, 3.0]으로 클램프, 소수점 3자리 반올림 |

use atlas_core::{ConfidenceRecord, Outcome};
use chrono::{DateTime, Utc};

/// 기록이 없는 시나리오의 가중치.
pub const NEUTRAL_WEIGHT: f64 = 1.0;

/// 첫 승리 시 가중치.
pub const FIRST_WIN_WEIGHT: f64 = 1.05;

/// 첫 패배 시 가중치.
pub const FIRST_LOSS_WEIGHT: f64 = 0.95;

/// 결과 한 건당 가중치 변화량.
pub const WEIGHT_STEP: f64 = 0.05;

/// 가중치 하한.
pub const MIN_WEIGHT: f64 = 0.1;

/// 가중치 상한.
pub const MAX_WEIGHT: f64 = 3.0;

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// 기존 가중치에 결과 한 건을 반영합니다.
pub fn step_weight(current: f64, outcome: Outcome) -> f64 {
    let delta = match outcome {
        Outcome::Win => WEIGHT_STEP,
        Outcome::Loss => -WEIGHT_STEP,
    };
    round3((current + delta).clamp(MIN_WEIGHT, MAX_WEIGHT))
}

/// 결과 한 건을 반영한 새 신뢰도 레코드를 계산합니다.
///
/// `existing`이 없으면 이 결과로 카운터를 시작하고 비대칭 초기 가중치
/// (승리 1.05 / 패배 0.95)를 부여합니다.
pub fn apply_outcome(
    existing: Option<&ConfidenceRecord>,
    scenario_id: &str,
    outcome: Outcome,
    now: DateTime<Utc>,
) -> ConfidenceRecord {
    let (win, loss) = match outcome {
        Outcome::Win => (1, 0),
        Outcome::Loss => (0, 1),
    };

    match existing {
        Some(record) => ConfidenceRecord {
            scenario_id: record.scenario_id.clone(),
            total_wins: record.total_wins + win,
            total_losses: record.total_losses + loss,
            current_weight: step_weight(record.current_weight, outcome),
            last_updated: now,
        },
        None => ConfidenceRecord {
            scenario_id: scenario_id.to_string(),
            total_wins: win,
            total_losses: loss,
            current_weight: match outcome {
                Outcome::Win => FIRST_WIN_WEIGHT,
                Outcome::Loss => FIRST_LOSS_WEIGHT,
            },
            last_updated: now,
        },
    }
}
