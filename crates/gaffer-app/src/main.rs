// Gaffer entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Load the asset catalogue and forecasts
// 4. Run the requested subcommand and print its report

use gaffer_app::commands::{PlanRequest, Session};
use gaffer_app::config;
use gaffer_app::export;
use gaffer_app::report::{self, Names};
use gaffer_core::{catalogue, AssetId, PeriodId, Price};

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "gaffer")]
#[command(about = "Squad selection and multi-gameweek transfer planning")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pick the best squad for one gameweek, then its lineup
    Select {
        /// Gameweek to optimize (default: horizon.start from strategy.toml)
        #[arg(long)]
        period: Option<u32>,
    },
    /// Pick the starting lineup and captaincy for a given squad
    Lineup {
        #[arg(long)]
        period: Option<u32>,
        /// Comma-separated asset ids
        #[arg(long, value_delimiter = ',', required = true)]
        squad: Vec<u32>,
    },
    /// Plan transfers over a multi-gameweek horizon
    Plan {
        /// First gameweek of the horizon
        #[arg(long)]
        period: Option<u32>,
        /// Current squad as comma-separated ids (default: select a fresh one)
        #[arg(long, value_delimiter = ',')]
        squad: Option<Vec<u32>>,
        /// Money in the bank, in currency units (e.g. 1.5)
        #[arg(long)]
        bank: Option<f64>,
        /// Free transfers available in the first transfer period
        #[arg(long)]
        free_transfers: Option<u32>,
        /// Number of gameweeks to plan
        #[arg(long)]
        horizon: Option<u32>,
        /// Also write the plan as JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Greedy like-for-like swaps for the weakest squad members
    Suggest {
        #[arg(long)]
        period: Option<u32>,
        #[arg(long, value_delimiter = ',', required = true)]
        squad: Vec<u32>,
        /// Number of squad members to try replacing
        #[arg(long, default_value_t = 3)]
        count: usize,
        #[arg(long)]
        horizon: Option<u32>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Gaffer starting up: {:?}", cli.command);

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: squad {} / lineup {}, budget {}, lookahead {}",
        config.rules.squad_size,
        config.rules.lineup_size,
        config.rules.budget,
        config.strategy.horizon.lookahead
    );

    // 3. Load the catalogue
    let catalogue =
        catalogue::load_catalogue(&config.data_paths).context("failed to load catalogue")?;
    info!(
        "Loaded {} assets, {} forecasts",
        catalogue.assets.len(),
        catalogue.scores.len()
    );

    // 4. Run the subcommand
    let session = Session::new(&config, &catalogue);
    let names = Names::new(&catalogue.assets);
    let text = match cli.command {
        Command::Select { period } => report::render_outcome(
            &session.select(period.map(PeriodId)),
            |(squad, lineup)| report::render_selection(squad, lineup, &names),
        ),
        Command::Lineup { period, squad } => report::render_outcome(
            &session.lineup(period.map(PeriodId), &ids(&squad)),
            |lineup| report::render_lineup(lineup, &names),
        ),
        Command::Plan {
            period,
            squad,
            bank,
            free_transfers,
            horizon,
            json,
        } => {
            let bank = bank
                .map(Price::from_units)
                .transpose()
                .context("invalid --bank amount")?;
            let request = PlanRequest {
                period: period.map(PeriodId),
                squad: squad.as_deref().map(ids),
                bank,
                free_transfers,
                lookahead: horizon,
            };
            let result = session.plan(&request);
            match (&result, json) {
                (Ok(plan), Some(path)) => {
                    export::write_plan_json(&path, plan)
                        .with_context(|| format!("failed to export plan to {}", path.display()))?;
                    info!("Plan written to {}", path.display());
                }
                (Err(_), Some(path)) => {
                    warn!("No plan to export to {}", path.display());
                }
                _ => {}
            }
            report::render_outcome(&result, |plan| report::render_plan(plan, &names))
        }
        Command::Suggest {
            period,
            squad,
            count,
            horizon,
        } => report::render_outcome(
            &session.suggest(period.map(PeriodId), &ids(&squad), count, horizon),
            |suggestions| report::render_suggestions(suggestions, &names),
        ),
    };

    print!("{text}");
    info!("Gaffer finished");
    Ok(())
}

fn ids(raw: &[u32]) -> Vec<AssetId> {
    raw.iter().copied().map(AssetId).collect()
}

/// Initialize tracing to log to a file (the terminal carries the report).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("gaffer.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gaffer=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
