//! 카탈로그 조회 명령.

use std::sync::Arc;

use anyhow::{Context, Result};
use atlas_core::{Category, Scenario};
use atlas_engine::MatchService;

use super::{print_json, truncate, OutputFormat};

/// 카탈로그를 분류 필터와 함께 출력합니다.
pub fn list_scenarios(
    service: &MatchService,
    category: Option<&str>,
    format: OutputFormat,
) -> Result<usize> {
    let category: Option<Category> = category
        .map(str::parse::<Category>)
        .transpose()
        .context("Invalid category")?;

    let scenarios: Vec<&Arc<Scenario>> = service
        .scenarios()
        .filter(|s| category.map_or(true, |c| s.category == c))
        .collect();

    match format {
        OutputFormat::Json => print_json(&scenarios)?,
        OutputFormat::Table => {
            println!(
                "{:<8} {:<11} {:<16} {:<24} {:<20}",
                "ID", "CATEGORY", "BIAS", "ENTRY", "TARGET"
            );
            println!("{}", "-".repeat(82));
            for s in &scenarios {
                println!(
                    "{:<8} {:<11} {:<16} {:<24} {:<20}",
                    s.id,
                    s.category.label(),
                    s.bias.to_string(),
                    truncate(&s.entry, 24),
                    truncate(&s.target, 20)
                );
            }
            println!("\nTotal: {} scenarios", scenarios.len());
        }
    }

    Ok(scenarios.len())
}

/// 시나리오 하나의 조건과 인코딩된 관측값을 출력합니다.
pub fn show_scenario(service: &MatchService, id: &str, format: OutputFormat) -> Result<()> {
    let scenario = service.scenario(id)?;

    if format == OutputFormat::Json {
        return print_json(scenario.as_ref());
    }

    let observation = scenario
        .features
        .decode()
        .with_context(|| format!("{} has an undecodable feature vector", scenario.id))?;

    println!("{} [{}] {}", scenario.id, scenario.category.label(), scenario.bias);
    println!("  C1: {}", scenario.conditions.c1);
    println!("  C2: {}", scenario.conditions.c2);
    println!("  C3: {}", scenario.conditions.c3);
    println!("  C4: {}", scenario.conditions.c4);
    println!("  Entry : {}", scenario.entry);
    println!("  Target: {}", scenario.target);
    if let Some(notes) = &scenario.notes {
        println!("  Notes : {}", notes);
    }
    println!(
        "  Encoded: {} {} | {} {} {} | {} {} {} | {} {} {}",
        observation.c1_context,
        observation.c1_behavior,
        observation.c2.action,
        observation.c2.close,
        observation.c2.qualifier,
        observation.c3.action,
        observation.c3.close,
        observation.c3.qualifier,
        observation.c4.action,
        observation.c4.close,
        observation.c4.qualifier
    );

    Ok(())
}
