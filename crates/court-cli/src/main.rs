//! `courtbook` CLI — inspect a court availability snapshot and pick safe bookings.
//!
//! The input is a JSON array of calendar cells as extracted from the booking
//! page:
//!
//! ```json
//! [{"resource":"Court 1","date":"2026-03-16","start":"14:00","state":"free","sourceSelector":"#c1-1400"}]
//! ```
//!
//! ## Usage
//!
//! ```sh
//! # Matrix summary and quality metrics
//! courtbook matrix -i cells.json
//!
//! # Would a 60-minute booking at 13:30 strand a slot?
//! courtbook isolation -i cells.json --resource "Court 1" --date 2026-03-16 --start 13:30
//!
//! # Every start time on a court that isolates nothing
//! courtbook safe-slots -i cells.json --resource "Court 1" --date 2026-03-16
//!
//! # Bookable pairs for the desired times, best one chosen by preference/history
//! courtbook search -i cells.json --date 2026-03-16 --times 18:00,18:30 \
//!     --prefer "Court 2,Court 1" --patterns history.json
//! ```

use std::io::{self, Read};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use court_engine::matrix::DateRange;
use court_engine::{
    check_isolation, choose_pair, get_isolation_safe_slots, Cell, EngineConfig, ExternalReport,
    MatrixBuilder, MatrixMetrics, PatternContext, PatternStats, SlotPairSearch,
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, Level};

#[derive(Parser)]
#[command(
    name = "courtbook",
    version,
    about = "Court availability matrix, isolation checks and slot-pair search"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON engine config file (matrix and scoring settings)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Override the cell count a matrix must exceed to count as complete
    #[arg(long, global = true)]
    min_cells: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Args)]
struct IoArgs {
    /// Cell snapshot file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,
    /// Output file (writes to stdout if omitted)
    #[arg(short, long)]
    output: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the availability matrix and print its summary and metrics
    Matrix {
        #[command(flatten)]
        io: IoArgs,
        /// Externally reported availability to attach (JSON array of reports)
        #[arg(long)]
        external: Option<String>,
    },
    /// Check whether a candidate booking would isolate a neighboring slot
    Isolation {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long)]
        resource: String,
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Start time as HH:MM
        #[arg(long)]
        start: String,
        #[arg(long, default_value_t = 60)]
        duration: u32,
    },
    /// List free start times on one resource that isolate nothing
    SafeSlots {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long)]
        resource: String,
        #[arg(long)]
        date: String,
        #[arg(long, default_value_t = 60)]
        duration: u32,
    },
    /// Find bookable slot-pairs and choose the best one
    Search {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long)]
        date: String,
        /// Comma-separated desired start times (HH:MM)
        #[arg(long)]
        times: String,
        /// Comma-separated resource preference order, most preferred first
        #[arg(long)]
        prefer: Option<String>,
        /// Historical success-rate file (JSON)
        #[arg(long)]
        patterns: Option<String>,
    },
}

#[derive(Serialize)]
struct MatrixSummary<'a> {
    resources: Vec<&'a str>,
    time_points: Vec<String>,
    date_range: DateRange,
    metrics: &'a MatrixMetrics,
    external_entries: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let mut config = match cli.config.as_deref() {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            EngineConfig::from_json(&raw)
                .with_context(|| format!("Failed to parse config file: {}", path))?
        }
        None => EngineConfig::default(),
    };
    if let Some(min_cells) = cli.min_cells {
        config.matrix.min_cells_for_complete = min_cells;
    }
    let builder = MatrixBuilder::new(config.matrix.clone());

    match cli.command {
        Commands::Matrix { io, external } => {
            let cells = read_cells(io.input.as_deref())?;
            let reports = match external.as_deref() {
                Some(path) => {
                    let raw = std::fs::read_to_string(path)
                        .with_context(|| format!("Failed to read file: {}", path))?;
                    let reports: Vec<ExternalReport> = serde_json::from_str(&raw)
                        .with_context(|| format!("Failed to parse external reports: {}", path))?;
                    Some(reports)
                }
                None => None,
            };
            let hybrid = builder
                .build_hybrid(cells, reports)
                .context("Failed to build availability matrix")?;
            let matrix = hybrid.matrix();

            let summary = MatrixSummary {
                resources: matrix.resources().iter().map(String::as_str).collect(),
                time_points: matrix.time_points().iter().map(ToString::to_string).collect(),
                date_range: matrix.date_range(),
                metrics: matrix.metrics(),
                external_entries: hybrid.has_external().then(|| hybrid.external_len()),
            };
            write_json(io.output.as_deref(), &summary)?;
        }
        Commands::Isolation {
            io,
            resource,
            date,
            start,
            duration,
        } => {
            let cells = read_cells(io.input.as_deref())?;
            let matrix = builder
                .build(cells)
                .context("Failed to build availability matrix")?;
            let verdict = check_isolation(&matrix, &resource, &date, &start, duration);
            write_json(io.output.as_deref(), &verdict)?;
        }
        Commands::SafeSlots {
            io,
            resource,
            date,
            duration,
        } => {
            let cells = read_cells(io.input.as_deref())?;
            let matrix = builder
                .build(cells)
                .context("Failed to build availability matrix")?;
            let slots = get_isolation_safe_slots(&matrix, &resource, &date, duration);
            let body = json!({
                "resource": resource,
                "date": date,
                "duration_minutes": duration,
                "safe_slots": slots,
            });
            write_json(io.output.as_deref(), &body)?;
        }
        Commands::Search {
            io,
            date,
            times,
            prefer,
            patterns,
        } => {
            let start_times = split_list(&times);
            // Bad parameters are a usage error; fail before reading any input.
            let search = SlotPairSearch::new(&date, start_times.as_slice())
                .context("Invalid search parameters")?;
            let preference = prefer.as_deref().map(split_list).unwrap_or_default();
            let context = match patterns.as_deref() {
                Some(path) => {
                    let raw = std::fs::read_to_string(path)
                        .with_context(|| format!("Failed to read file: {}", path))?;
                    let stats = PatternStats::from_json(&raw)
                        .with_context(|| format!("Failed to parse pattern stats: {}", path))?;
                    PatternContext::Loaded(stats)
                }
                None => PatternContext::NotLoaded,
            };

            let cells = read_cells(io.input.as_deref())?;
            let matrix = builder
                .build(cells)
                .context("Failed to build availability matrix")?;
            let result = search.run(&matrix);
            let chosen = choose_pair(&result.available_pairs, &preference, &context, &config.scoring);
            if let Some(best) = &chosen {
                info!(
                    resource = %best.pair.resource,
                    start = %best.pair.first_start,
                    score = best.score,
                    "chose slot-pair"
                );
            }

            let body = json!({
                "result": result,
                "chosen": chosen,
            });
            write_json(io.output.as_deref(), &body)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Split a comma-separated list, dropping empty entries.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_cells(path: Option<&str>) -> Result<Vec<Cell>> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw).context("Failed to parse cell snapshot")
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_json<T: Serialize>(path: Option<&str>, value: &T) -> Result<()> {
    let pretty = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            std::fs::write(path, pretty).with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", pretty);
        }
    }
    Ok(())
}
