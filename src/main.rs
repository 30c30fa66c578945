use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use reqwest::Client;
use solindex::{assemble_from_paths, emit, fetch, Config, Request};
use std::{env, path::PathBuf, time::Instant};
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Build the daily solar/geomagnetic index table for JB2006.
#[derive(Parser, Debug)]
#[command(name = "solindex", version)]
struct Cli {
    /// First day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,
    /// Last day, exclusive (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,
    /// YAML config; defaults are used when absent
    #[arg(long)]
    config: Option<PathBuf>,
    /// CSV destination, overrides the config
    #[arg(long)]
    output: Option<PathBuf>,
    /// Also write Parquet here
    #[arg(long)]
    parquet: Option<PathBuf>,
    /// Use feeds already on disk instead of downloading them
    #[arg(long)]
    feeds_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::load(cli.config.as_deref())?;
    if let Some(out) = cli.output {
        cfg.output = out;
    }
    if cli.parquet.is_some() {
        cfg.parquet = cli.parquet;
    }

    let today = Local::now().date_naive();
    let req = Request {
        latency_days: cfg.latency_days,
        ..Request::new(cli.start, cli.end, today)
    };
    info!(start = %req.start, end = %req.end, %today, "startup");

    // ─── 2) feeds: local dir or a temp dir removed on exit ───────────
    let scratch = tempfile::tempdir().context("creating feed scratch dir")?;
    let paths = match &cli.feeds_dir {
        Some(dir) => cfg.feeds.paths_in(dir),
        None => {
            let started = Instant::now();
            let client = Client::new();
            let paths = fetch::fetch_all(&client, &cfg, scratch.path()).await?;
            info!(elapsed = ?started.elapsed(), "feeds downloaded");
            paths
        }
    };

    // ─── 3) assemble off the async runtime ───────────────────────────
    let table = match tokio::task::spawn_blocking(move || assemble_from_paths(&req, &paths)).await? {
        Ok(t) => t,
        Err(e) => {
            error!("assembly failed: {:#}", e);
            return Err(e);
        }
    };

    // ─── 4) write outputs ────────────────────────────────────────────
    emit::write_csv_file(&table, req.days(), &cfg.output)?;
    if let Some(pq) = &cfg.parquet {
        emit::write_parquet_file(&table, req.days(), pq)?;
    }

    info!("all done");
    Ok(())
}
