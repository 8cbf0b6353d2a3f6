use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use delivery_insights::app::DashboardSession;
use delivery_insights::config::Config;
use delivery_insights::infra::CsvTableSource;
use delivery_insights::logging;
use delivery_insights::observability;
use delivery_insights::pipeline::processing::aggregate::DateRange;

#[derive(Parser)]
#[command(name = "delivery_insights")]
#[command(about = "Delivery performance and review analytics over order exports")]
#[command(version = "0.1.0")]
struct Cli {
    /// Config file (defaults to DELIVERY_INSIGHTS_CONFIG, then config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print collected metrics in Prometheus text format on exit
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate the analytical view over a delivery-date range
    Summary {
        /// First delivery date to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last delivery date to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Include the filtered rows in the output
        #[arg(long)]
        include_rows: bool,
        /// Write JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show per-table cleaning and per-stage join counts
    Report {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show the earliest and latest delivery date
    Bounds,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?
            .with_env_overrides()
            .validated()?,
        None => Config::load().context("loading config")?,
    };
    Ok(config)
}

/// Fill an open-ended range from the view bounds
fn resolve_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    bounds: Option<(NaiveDate, NaiveDate)>,
) -> Option<DateRange> {
    match (from, to, bounds) {
        (None, None, _) => None,
        (Some(start), Some(end), _) => Some(DateRange::new(start, end)),
        (Some(start), None, Some((_, max))) => Some(DateRange::new(start, max)),
        (None, Some(end), Some((min, _))) => Some(DateRange::new(min, end)),
        (Some(day), None, None) | (None, Some(day), None) => Some(DateRange::new(day, day)),
    }
}

fn emit<T: Serialize>(value: &T, output: Option<&PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    if cli.metrics {
        observability::init().context("installing metrics recorder")?;
    }

    let config = load_config(cli.config.as_ref())?;
    let source = CsvTableSource::from_config(&config.inputs)?;
    let session = DashboardSession::new(Box::new(source), &config);

    match cli.command {
        Commands::Summary {
            from,
            to,
            include_rows,
            output,
        } => {
            let bounds = session.bounds().context("building analytical view")?;
            if bounds.is_none() {
                warn!("Analytical view is empty");
            }
            let range = resolve_range(from, to, bounds);
            let summary = session.summarize(range, include_rows)?;
            emit(&summary, output.as_ref())?;
        }
        Commands::Report { output } => {
            let report = session.report().context("building analytical view")?;
            emit(report, output.as_ref())?;
        }
        Commands::Bounds => match session.bounds().context("building analytical view")? {
            Some((min, max)) => println!("{} {}", min, max),
            None => println!("no delivered orders"),
        },
    }

    if cli.metrics {
        if let Some(rendered) = observability::render() {
            eprintln!("{}", rendered);
        }
    }
    Ok(())
}
