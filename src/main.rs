use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

mod config;
mod fetcher;
mod harvest;
mod store;
mod telemetry;
mod util;

use config::RunConfig;
use fetcher::{DEFAULT_BASE_URL, HttpProfileFetcher};
use store::PgHarvestStore;

#[derive(Parser)]
#[command(
    name = "harvest",
    about = "Incremental GDLive profile harvester",
    after_help = "Pass no positional arguments for the defaults \
                  (start_rid=158000 interval=10 number_batches=62 batch_size=100) \
                  or exactly four: start_rid interval number_batches batch_size."
)]
struct Cli {
    /// start_rid, interval, number_batches, batch_size (all four or none)
    #[arg(value_name = "ARG", num_args = 0..)]
    args: Vec<i64>,

    #[arg(long)]
    dsn: Option<String>,
    /// Max profile fetches in flight per batch; defaults to available parallelism
    #[arg(long)]
    concurrency: Option<usize>,
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let sink = telemetry::config::init_tracing(&cli.log_dir)?;
    info!("Logging to {}", sink.file.display());

    let cfg = match RunConfig::from_args(&cli.args, cli.concurrency) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{e}");
            std::process::exit(2);
        }
    };
    if cfg.is_default() {
        info!(
            "Running with default values: start_rid={}, interval={}, number_batches={}, batch_size={}",
            cfg.start_rid, cfg.interval, cfg.number_batches, cfg.batch_size
        );
    }

    let total = Instant::now();

    let dsn = cli
        .dsn
        .or_else(|| env::var("DATABASE_URL").ok())
        .expect("Please provide --dsn or set DATABASE_URL in .env");
    let pool = PgPoolOptions::new().max_connections(5).connect(&dsn).await?;
    let store = PgHarvestStore::new(pool);
    let fetcher = HttpProfileFetcher::new(&cli.base_url)?;

    harvest::run(&fetcher, &store, &cfg).await?;

    info!("Total run time: {:.2?}", total.elapsed());
    Ok(())
}
