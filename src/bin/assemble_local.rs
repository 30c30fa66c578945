// src/bin/assemble_local.rs
//
// Offline variant: assemble from feeds that are already on disk.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Parser;
use solindex::{assemble_from_paths, emit, Config, Request};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "solindex-local", about = "Assemble the index table from local feed files")]
struct Args {
    /// Directory holding SOLFSMY.TXT, SOLRESAP.TXT and the recent feeds
    #[arg(long)]
    feeds_dir: PathBuf,
    #[arg(long)]
    start: NaiveDate,
    #[arg(long)]
    end: NaiveDate,
    /// Pretend today is this date (reproducible runs against old downloads)
    #[arg(long)]
    today: Option<NaiveDate>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "jb2006_indices.csv")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();
    let cfg = Config::load(args.config.as_deref())?;
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let req = Request {
        latency_days: cfg.latency_days,
        ..Request::new(args.start, args.end, today)
    };

    let paths = cfg.feeds.paths_in(&args.feeds_dir);
    info!(dir = %args.feeds_dir.display(), "reading local feeds");
    let table = assemble_from_paths(&req, &paths)?;
    emit::write_csv_file(&table, req.days(), &args.output)?;
    Ok(())
}
