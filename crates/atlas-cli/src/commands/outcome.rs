//! 매매 결과 기록 명령.

use anyhow::{Context, Result};
use atlas_core::{ConfidenceRecord, MatchType, Outcome, OutcomeInput};
use atlas_engine::MatchService;
use atlas_store::WeightTier;
use tracing::info;

/// 결과 기록 설정.
#[derive(Debug)]
pub struct LogOutcomeConfig {
    pub scenario_id: String,
    pub outcome: String,
    pub match_type: String,
    pub similarity: f64,
    pub reason: Option<String>,
}

impl LogOutcomeConfig {
    /// 문자열 인자를 검증해 저장소 입력으로 변환합니다.
    fn into_input(self) -> Result<OutcomeInput> {
        let outcome: Outcome = self.outcome.parse().context("Invalid outcome")?;
        let match_type: MatchType = self.match_type.parse().context("Invalid match type")?;

        if outcome == Outcome::Win && self.reason.is_some() {
            anyhow::bail!("--reason is only accepted for losses");
        }

        let mut input = OutcomeInput::new(self.scenario_id, outcome, match_type, self.similarity);
        if let Some(reason) = self.reason {
            input = input.with_loss_reason(reason);
        }
        Ok(input)
    }
}

/// 매매 결과를 기록하고 갱신된 신뢰도를 출력합니다.
///
/// 카탈로그에 없는 시나리오 ID는 거부합니다.
pub async fn log_outcome(service: &MatchService, config: LogOutcomeConfig) -> Result<ConfidenceRecord> {
    let scenario = service.scenario(&config.scenario_id)?;
    let input = config.into_input()?;

    let record = service
        .store()
        .log_outcome(input)
        .await
        .context("Outcome was NOT recorded")?;

    info!(scenario_id = %record.scenario_id, weight = record.current_weight, "Outcome logged");

    println!(
        "{} ({}) -> weight {:.3} [{:?}]  W/L {}/{}",
        scenario.id,
        scenario.category.label(),
        record.current_weight,
        WeightTier::of(record.current_weight),
        record.total_wins,
        record.total_losses
    );

    Ok(record)
}
