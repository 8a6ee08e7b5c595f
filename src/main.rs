use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;
use waykeep::{archive_urls, ArchiveConfig};

#[derive(Parser, Debug)]
#[command(name = "waykeep")]
#[command(about = "Archive content-distinct Wayback Machine snapshots for a list of URLs", long_about = None)]
#[command(version)]
struct Args {
    /// Input file listing source URLs, one per line
    #[arg(short, long, default_value = "urls.txt")]
    input: PathBuf,

    /// Output directory for downloaded snapshots
    #[arg(short, long, default_value = "downloads")]
    output: PathBuf,

    /// Path of the download ledger
    #[arg(short, long, default_value = "ledger.jsonl")]
    ledger: PathBuf,

    /// CDX snapshot index endpoint
    #[arg(long, default_value = "https://web.archive.org/cdx/search/cdx")]
    index_url: String,

    /// Base URL for snapshot replay fetches
    #[arg(long, default_value = "https://web.archive.org")]
    snapshot_url: String,

    /// Network timeout in seconds (connect and read)
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("waykeep={}", log_level))
        .init();

    info!("🚀 WayKeep - Wayback Machine Snapshot Archiver");
    info!("Input list: {:?}", args.input);
    info!("Output directory: {:?}", args.output);
    info!("Ledger: {:?}", args.ledger);

    // The output directory is the one environment requirement; failing to
    // create it aborts the run before any network work.
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("cannot create output directory {:?}", args.output))?;

    let config = ArchiveConfig {
        input_file: args.input,
        output_dir: args.output,
        ledger_path: args.ledger,
        index_url: args.index_url,
        snapshot_base_url: args.snapshot_url,
        request_timeout: Duration::from_secs(args.timeout),
    };

    let started = Instant::now();
    let summary = archive_urls(&config).await?;
    let elapsed = Duration::from_secs(started.elapsed().as_secs());

    info!(
        "Run complete in {}: {} saved, {} duplicate, {} skipped, {} failed snapshots ({} URLs unreachable)",
        humantime::format_duration(elapsed),
        summary.total_saved(),
        summary.total_duplicates(),
        summary.total_skipped(),
        summary.total_failed(),
        summary.failed_urls
    );

    if !summary.is_success() {
        eprintln!(
            "❌ {} source URL(s) could not be queried at all",
            summary.failed_urls
        );
        std::process::exit(1);
    }

    info!("✅ All source URLs processed successfully!");
    Ok(())
}
