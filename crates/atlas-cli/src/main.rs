//! Atlas 셋업 매칭 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 4캔들 관측값 매칭 (c1_context c1_behavior, C2~C4 × action close qualifier)
//! atlas match inside_pdr ranging \
//!     breaks_low inside none  breaks_high inside none  whipsaw above none
//!
//! # 결과 기록
//! atlas log V-01 win --match-type exact --similarity 1.0
//! atlas log W-03 loss --match-type inferred --similarity 0.84 --reason "News spike"
//!
//! # 학습 현황
//! atlas stats
//! atlas trades --limit 20
//! atlas scenarios --category whipsaw
//! ```

use anyhow::{Context, Result};
use atlas_cli::commands::{
    context::AppContext,
    match_setup::{run_match, MatchConfig},
    outcome::{log_outcome, LogOutcomeConfig},
    scenarios::{list_scenarios, show_scenario},
    stats::show_stats,
    trades::list_trades,
    OutputFormat,
};
use atlas_core::{init_logging, AppConfig, LogConfig};
use clap::{Parser, Subcommand};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "atlas")]
#[command(about = "Atlas setup matcher - 4캔들 셋업 분류 및 신뢰도 학습", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일
    #[arg(short, long, global = true, default_value = "config/default.toml")]
    config: String,

    /// 출력 형식 (table, json)
    #[arg(short, long, global = true, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 관측값을 카탈로그와 매칭
    Match {
        /// 11개 관측 필드: c1_context c1_behavior, (c2 c3 c4) × (action close qualifier)
        #[arg(num_args = 11, required = true)]
        fields: Vec<String>,

        /// 반환 개수 (기본: matching.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// 최상위 결과의 슬롯별 거리 기여도 출력
        #[arg(long, default_value = "false")]
        explain: bool,
    },

    /// 매매 결과 기록
    Log {
        /// 시나리오 ID (예: V-01)
        scenario_id: String,

        /// 결과 (win, loss)
        outcome: String,

        /// 매칭 분류 (exact, inferred)
        #[arg(short, long, default_value = "inferred")]
        match_type: String,

        /// 매칭 당시 유사도 (0~1)
        #[arg(short, long)]
        similarity: f64,

        /// 패배 사유 (loss 전용)
        #[arg(short, long)]
        reason: Option<String>,
    },

    /// 학습 현황 요약
    Stats,

    /// 최근 매매 로그
    Trades {
        /// 최대 결과 수
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// 카탈로그 조회
    Scenarios {
        /// 분류 필터 (vetted, inside_pdr, whipsaw, pdh_break, pdl_break)
        #[arg(long)]
        category: Option<String>,

        /// 시나리오 하나의 상세 정보
        #[arg(long)]
        show: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config))?;

    init_logging(LogConfig::from_settings(&config.logging))
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let format = OutputFormat::parse(&cli.format)?;
    let ctx = AppContext::build(config).await?;

    match cli.command {
        Commands::Match {
            fields,
            top_k,
            explain,
        } => {
            let config = MatchConfig {
                fields,
                top_k: top_k.unwrap_or(ctx.config.matching.top_k),
                format,
                explain,
            };

            if let Err(e) = run_match(&ctx.service, config).await {
                error!("Match failed: {:#}", e);
                return Err(e);
            }
        }

        Commands::Log {
            scenario_id,
            outcome,
            match_type,
            similarity,
            reason,
        } => {
            let config = LogOutcomeConfig {
                scenario_id,
                outcome,
                match_type,
                similarity,
                reason,
            };

            match log_outcome(&ctx.service, config).await {
                Ok(record) => {
                    info!(scenario_id = %record.scenario_id, "Outcome recorded");
                }
                Err(e) => {
                    error!("Log outcome failed: {:#}", e);
                    return Err(e);
                }
            }
        }

        Commands::Stats => {
            show_stats(ctx.store(), format).await?;
        }

        Commands::Trades { limit } => {
            let count = list_trades(ctx.store(), limit, format).await?;
            info!("Listed {} trades", count);
        }

        Commands::Scenarios { category, show } => match show {
            Some(id) => show_scenario(&ctx.service, &id, format)?,
            None => {
                list_scenarios(&ctx.service, category.as_deref(), format)?;
            }
        },
    }

    Ok(())
}
