//! 최근 매매 로그 조회 명령.

use anyhow::{Context, Result};
use atlas_core::TradeLogEntry;
use atlas_store::ConfidenceStore;

use super::{print_json, truncate, OutputFormat};

/// 최근 매매 로그를 출력합니다.
pub async fn list_trades(store: &ConfidenceStore, limit: usize, format: OutputFormat) -> Result<usize> {
    let trades = store
        .recent_trades(limit)
        .await
        .context("Failed to query trade log")?;

    match format {
        OutputFormat::Json => print_json(&trades)?,
        OutputFormat::Table => println!("{}", format_table(&trades)),
    }

    Ok(trades.len())
}

fn format_table(trades: &[TradeLogEntry]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<6} {:<20} {:<8} {:<5} {:<9} {:>6} {:<30}\n",
        "ID", "LOGGED (UTC)", "SETUP", "RES", "MATCH", "SIM", "LOSS REASON"
    ));
    output.push_str(&"-".repeat(90));
    output.push('\n');

    for trade in trades {
        output.push_str(&format!(
            "{:<6} {:<20} {:<8} {:<5} {:<9} {:>6.3} {:<30}\n",
            trade.id,
            trade.logged_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            trade.scenario_id,
            trade.outcome.as_str(),
            trade.match_type.as_str(),
            trade.similarity,
            truncate(trade.loss_reason.as_deref().unwrap_or("-"), 30)
        ));
    }

    output.push('\n');
    output.push_str(&format!("Total: {} trades", trades.len()));
    output
}
