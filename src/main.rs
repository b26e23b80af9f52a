use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ridership_yield::io::split::{DEFAULT_CHUNK_SIZE, split_csv};
use ridership_yield::metrics::{DEFAULT_VAT_RATE, VatRate};
use ridership_yield::pipeline::{self, PipelineConfig};
use ridership_yield::server::{self, AppState};
use ridership_yield::{PipelineError, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| PipelineError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Aggregate(args) => execute_aggregate(args),
        Command::Serve(args) => execute_serve(args),
        Command::Split(args) => execute_split(args),
    }
}

fn execute_aggregate(args: AggregateArgs) -> Result<()> {
    if !args.input.exists() {
        return Err(PipelineError::MissingInput(args.input));
    }

    let config = PipelineConfig {
        vat_rate: VatRate::new(args.vat_rate)?,
        join_operations: args.with_operations,
    };
    let table = pipeline::export_csv(&args.input, &args.output, config)?;

    if let Some(report) = &args.report {
        pipeline::export_report(&table, report)?;
    }

    for bucket in table.buckets.iter().take(5) {
        info!(
            bus_line = bucket.route_id,
            time_slot = bucket.time_slot.as_deref().unwrap_or_default(),
            age_group = bucket.age_group.as_deref().unwrap_or_default(),
            total_revenue = bucket.total_revenue,
            total_yield = bucket.total_yield,
            total_trips = bucket.total_trips,
            avg_yield_per_trip = bucket.avg_yield_per_trip,
            "aggregate preview"
        );
    }
    Ok(())
}

fn execute_serve(args: ServeArgs) -> Result<()> {
    if !args.input.exists() {
        return Err(PipelineError::MissingInput(args.input));
    }

    let state = AppState::new(args.input, VatRate::new(args.vat_rate)?);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::serve(args.bind, state))
}

fn execute_split(args: SplitArgs) -> Result<()> {
    let chunks = split_csv(&args.input, &args.output_dir, args.chunk_size)?;
    info!(chunks = chunks.len(), "dataset split into smaller files");
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Aggregate transit ridership survey revenue and yield."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline once and write the aggregate CSV.
    Aggregate(AggregateArgs),
    /// Serve the survey, operation and aggregation endpoints over HTTP.
    Serve(ServeArgs),
    /// Split an aggregate CSV into fixed-size chunk files.
    Split(SplitArgs),
}

#[derive(clap::Args)]
struct AggregateArgs {
    /// Workbook with `survey` and `operation` sheets.
    #[arg(long, env = "RIDERSHIP_WORKBOOK")]
    input: PathBuf,

    /// Output CSV path.
    #[arg(long, default_value = "aggregated_data.csv")]
    output: PathBuf,

    /// Join the operation sheet and add per-km and per-vehicle means.
    #[arg(long)]
    with_operations: bool,

    /// VAT share deducted from revenue.
    #[arg(long, default_value_t = DEFAULT_VAT_RATE)]
    vat_rate: f64,

    /// Also write the aggregate table as an `.xlsx` report.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ServeArgs {
    /// Workbook with `survey` and `operation` sheets.
    #[arg(long, env = "RIDERSHIP_WORKBOOK")]
    input: PathBuf,

    /// Socket address to listen on.
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// VAT share deducted from revenue.
    #[arg(long, default_value_t = DEFAULT_VAT_RATE)]
    vat_rate: f64,
}

#[derive(clap::Args)]
struct SplitArgs {
    /// Aggregate CSV to split.
    #[arg(long, default_value = "aggregated_data.csv")]
    input: PathBuf,

    /// Directory receiving `dataset_part_{n}.csv` files.
    #[arg(long, default_value = "split_datasets")]
    output_dir: PathBuf,

    /// Data rows per chunk.
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}
