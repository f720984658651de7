//! 학습 현황 요약 명령.

use anyhow::{Context, Result};
use atlas_core::ConfidenceRecord;
use atlas_store::{ConfidenceStore, DashboardSummary, WeightTier};

use super::{print_json, OutputFormat};

/// 승률 계산에 쓰는 최근 매매 수.
pub const RECENT_WINDOW: usize = 15;

/// 상위/하위 표시 개수.
const LEADERS: usize = 5;

/// 요약을 계산해 출력합니다.
pub async fn show_stats(store: &ConfidenceStore, format: OutputFormat) -> Result<DashboardSummary> {
    let summary = store
        .summary(RECENT_WINDOW)
        .await
        .context("Failed to load confidence summary")?;

    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Table => println!("{}", format_summary(&summary)),
    }

    Ok(summary)
}

fn format_summary(summary: &DashboardSummary) -> String {
    let mut output = String::new();

    let win_rate = summary
        .win_rate_pct
        .map_or_else(|| "-".to_string(), |pct| format!("{}%", pct));
    output.push_str(&format!(
        "Recent {} trades: {} W / {} L  (win rate {})\n",
        summary.total_trades, summary.wins, summary.losses, win_rate
    ));
    output.push_str(&format!("Learned scenarios: {}\n", summary.records.len()));

    if summary.records.is_empty() {
        output.push_str("\nNo outcomes recorded yet.");
        return output;
    }

    output.push_str("\nStrongest:\n");
    for record in summary.strongest(LEADERS) {
        output.push_str(&format_record(record));
    }

    output.push_str("\nWeakest:\n");
    for record in summary.weakest(LEADERS) {
        output.push_str(&format_record(record));
    }

    output
}

fn format_record(record: &ConfidenceRecord) -> String {
    let tier = match WeightTier::of(record.current_weight) {
        WeightTier::Strong => "strong",
        WeightTier::Neutral => "",
        WeightTier::Weak => "weak",
    };
    format!(
        "  {:<8} {:>5.2}  {:>3}W {:>3}L  {}\n",
        record.scenario_id, record.current_weight, record.total_wins, record.total_losses, tier
    )
}
