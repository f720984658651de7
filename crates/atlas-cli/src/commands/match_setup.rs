//! 셋업 매칭 명령.

use anyhow::{Context, Result};
use atlas_core::Observation;
use atlas_engine::{MatchService, RankedMatch};
use tracing::info;

use super::{print_json, truncate, OutputFormat};

/// 매칭 명령 설정.
#[derive(Debug)]
pub struct MatchConfig {
    /// 11개 관측 필드
    pub fields: Vec<String>,
    /// 반환 개수
    pub top_k: usize,
    /// 출력 형식
    pub format: OutputFormat,
    /// 최상위 결과의 슬롯별 거리 기여도 출력
    pub explain: bool,
}

/// 관측값을 카탈로그와 매칭하고 결과를 출력합니다.
pub async fn run_match(service: &MatchService, config: MatchConfig) -> Result<usize> {
    let fields: [&str; 11] = config
        .fields
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .try_into()
        .map_err(|v: Vec<&str>| anyhow::anyhow!("Expected 11 fields, got {}", v.len()))?;

    let observation = Observation::parse_fields(&fields).context("Invalid observation")?;
    let input = observation.encode();

    let matches = service
        .find_matches(&input, config.top_k)
        .await
        .context("Matching failed")?;

    info!(returned = matches.len(), "Matching completed");

    match config.format {
        OutputFormat::Json => print_json(&matches)?,
        OutputFormat::Table => println!("{}", format_table(&matches)),
    }

    if config.explain {
        if let Some(best) = matches.first() {
            let parts = service.explain(&input, &best.scenario.id)?;
            println!("\nDistance breakdown vs {}:", best.scenario.id);
            if parts.is_empty() {
                println!("  (identical)");
            }
            for part in parts {
                println!(
                    "  {:<14} input={} reference={}  +{:.4}",
                    part.slot.name(),
                    part.input,
                    part.reference,
                    part.share
                );
            }
        }
    }

    Ok(matches.len())
}

/// 테이블 형식 출력.
fn format_table(matches: &[RankedMatch]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<4} {:<8} {:<11} {:>7} {:<9} {:>6} {:<8} {:<16} {:<24}\n",
        "#", "ID", "CATEGORY", "SIM", "MATCH", "WEIGHT", "STATUS", "BIAS", "ENTRY"
    ));
    output.push_str(&"-".repeat(100));
    output.push('\n');

    for (rank, m) in matches.iter().enumerate() {
        output.push_str(&format!(
            "{:<4} {:<8} {:<11} {:>6.1}% {:<9} {:>6.2} {:<8} {:<16} {:<24}\n",
            rank + 1,
            m.scenario.id,
            m.scenario.category.label(),
            m.similarity * 100.0,
            m.match_type.as_str(),
            m.confidence_weight,
            m.confidence_status.as_str(),
            m.scenario.bias.to_string(),
            truncate(&m.scenario.entry, 24)
        ));
    }

    if let Some(best) = matches.first() {
        output.push('\n');
        output.push_str(&format!("Best: {} -> target {}", best.scenario.id, best.scenario.target));
        if let Some(notes) = &best.scenario.notes {
            output.push_str(&format!("\nNote: {}", notes));
        }
    }

    output
}
