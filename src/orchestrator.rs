//! Main orchestration logic for archiving snapshots.

use crate::cdx::SnapshotIndexClient;
use crate::error::ArchiveError;
use crate::extension::resolve_extension;
use crate::hash::fingerprint;
use crate::http::HttpClient;
use crate::ledger::{DownloadLedger, LedgerEntry};
use crate::types::{ArchiveConfig, RunSummary, SnapshotOutcome, SnapshotRecord, UrlReport};
use std::path::Path;
use tracing::{error, info, warn};

/// How much of the fingerprint goes into the filename. 16 hex chars (64
/// bits) keeps names short while making a silent collision between
/// distinct content practically impossible; the full fingerprint is kept
/// in the ledger.
const FINGERPRINT_PREFIX_LEN: usize = 16;

/// Archives every source URL listed in the configured input file.
///
/// This is the main entry point. It performs the following steps:
///
/// 1. Reads the source URL list (one URL per line, blank lines ignored)
/// 2. Loads the download ledger so reruns skip completed work
/// 3. For each source URL, queries the CDX index and walks the snapshots
///    in chronological order, saving each content-distinct payload once
///
/// Failures are scoped: a snapshot that cannot be fetched is skipped, a
/// URL whose index query fails is skipped (and counted in the summary),
/// and only startup environment failures abort the run.
///
/// # Example
///
/// ```no_run
/// use waykeep::{archive_urls, ArchiveConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = archive_urls(&ArchiveConfig::default()).await?;
/// println!("saved {} snapshots", summary.total_saved());
/// # Ok(())
/// # }
/// ```
pub async fn archive_urls(config: &ArchiveConfig) -> Result<RunSummary, ArchiveError> {
    std::fs::create_dir_all(&config.output_dir)?;

    let urls = read_url_list(&config.input_file)?;
    info!("Total URLs to process: {}", urls.len());

    let mut ledger = DownloadLedger::open(&config.ledger_path)?;
    info!(
        "Loaded ledger from {:?} ({} entries)",
        config.ledger_path,
        ledger.len()
    );

    let http = HttpClient::new(config.request_timeout)?;
    let index = SnapshotIndexClient::new(&http, config);

    let mut summary = RunSummary::default();

    for (position, source_url) in urls.iter().enumerate() {
        info!(
            "Processing URL ({}/{}): {}",
            position + 1,
            urls.len(),
            source_url
        );

        let records = match index.list_snapshots(source_url).await {
            Ok(records) => records,
            Err(e) => {
                warn!("{}", e);
                summary.failed_urls += 1;
                continue;
            }
        };

        if records.is_empty() {
            info!("No snapshots found for URL: {}", source_url);
            summary.reports.push(UrlReport {
                source_url: source_url.clone(),
                ..UrlReport::default()
            });
            continue;
        }

        info!("Found {} snapshots for URL: {}", records.len(), source_url);
        let report =
            process_source_url(&http, config, &mut ledger, source_url, &records).await;
        info!(
            "Completed {}: {} saved, {} duplicate, {} skipped, {} failed",
            source_url, report.saved, report.duplicates, report.skipped, report.failed
        );
        summary.reports.push(report);
    }

    Ok(summary)
}

/// Walks one source URL's snapshots in timestamp order, one request in
/// flight at a time, and returns the per-URL counts.
async fn process_source_url(
    http: &HttpClient,
    config: &ArchiveConfig,
    ledger: &mut DownloadLedger,
    source_url: &str,
    records: &[SnapshotRecord],
) -> UrlReport {
    let mut report = UrlReport {
        source_url: source_url.to_string(),
        candidates: records.len(),
        ..UrlReport::default()
    };

    let pb = snapshot_progress_bar(records.len() as u64, source_url);

    for record in records {
        // Snapshot-scoped errors were already logged where they occurred.
        let outcome = process_snapshot(http, config, ledger, source_url, record)
            .await
            .unwrap_or(SnapshotOutcome::Failed);
        match outcome {
            SnapshotOutcome::Saved(path) => {
                report.saved += 1;
                pb.set_message(format!("| 💾 Saved: {}", path.display()));
            }
            SnapshotOutcome::Duplicate => {
                report.duplicates += 1;
                pb.set_message(format!("| ♻️  Duplicate content: {}", record.timestamp));
            }
            SnapshotOutcome::Skipped => {
                report.skipped += 1;
                pb.set_message(format!("| ⏭️  Already recorded: {}", record.timestamp));
            }
            SnapshotOutcome::Failed => {
                report.failed += 1;
                pb.set_message(format!("| ❌ Failed: {}", record.timestamp));
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message(format!(
        "✅ {}: {}/{} snapshots kept",
        source_url,
        report.saved,
        report.candidates
    ));

    report
}

/// Processes a single snapshot candidate:
/// fetch → fingerprint → ledger check → write file → record.
///
/// Returns the outcome, or an error scoped to this snapshot. Errors are
/// logged here and translated to a `Failed` count by the caller; they
/// never abort the remaining snapshots.
async fn process_snapshot(
    http: &HttpClient,
    config: &ArchiveConfig,
    ledger: &mut DownloadLedger,
    source_url: &str,
    record: &SnapshotRecord,
) -> Result<SnapshotOutcome, ArchiveError> {
    // Work recorded by a prior run is skipped without refetching.
    if ledger.contains_timestamp(source_url, &record.timestamp) {
        return Ok(SnapshotOutcome::Skipped);
    }

    let snapshot_url = record.snapshot_url(&config.snapshot_base_url);

    let response = match http.get_with_http_fallback(&snapshot_url).await {
        Ok(response) => response,
        Err(e) => {
            let err = ArchiveError::FetchFailed {
                url: snapshot_url.clone(),
                reason: e.to_string(),
            };
            warn!("{}", err);
            return Err(err);
        }
    };

    if !response.status.is_success() {
        let err = ArchiveError::FetchFailed {
            url: snapshot_url.clone(),
            reason: format!("HTTP {}", response.status),
        };
        warn!("{}", err);
        return Err(err);
    }

    let content_fingerprint = fingerprint(&response.body);
    if ledger.contains(source_url, &content_fingerprint) {
        return Ok(SnapshotOutcome::Duplicate);
    }

    let extension = resolve_extension(&snapshot_url, response.content_type.as_deref());
    let filename = format!(
        "{}_{}{}",
        record.timestamp,
        &content_fingerprint[..FINGERPRINT_PREFIX_LEN],
        extension
    );
    let path = config.output_dir.join(filename);

    // The file write must succeed before the ledger records it, so the
    // ledger never claims a save that did not land on disk.
    if let Err(e) = tokio::fs::write(&path, &response.body).await {
        let err = ArchiveError::StorageFailed(format!(
            "cannot write {}: {}",
            path.display(),
            e
        ));
        error!("{}", err);
        return Err(err);
    }

    let entry = LedgerEntry {
        fingerprint: content_fingerprint,
        source_url: source_url.to_string(),
        timestamp: record.timestamp.clone(),
        saved_path: path.display().to_string(),
    };
    if let Err(e) = ledger.record(entry) {
        let err = ArchiveError::StorageFailed(format!(
            "cannot append ledger entry for {}: {}",
            path.display(),
            e
        ));
        error!("{}", err);
        return Err(err);
    }

    Ok(SnapshotOutcome::Saved(path))
}

/// Reads the source URL list: one URL per line, surrounding whitespace
/// trimmed, blank lines ignored. Duplicate lines are kept and processed
/// independently.
pub(crate) fn read_url_list(path: &Path) -> Result<Vec<String>, ArchiveError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Builds the per-URL progress bar, hidden when stderr is not a terminal.
fn snapshot_progress_bar(total: u64, source_url: &str) -> indicatif::ProgressBar {
    let pb = if atty::is(atty::Stream::Stderr) {
        indicatif::ProgressBar::new(total)
    } else {
        indicatif::ProgressBar::hidden()
    };
    pb.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg} | {elapsed_precise} elapsed, ETA {eta_precise}")
            .unwrap()
            .progress_chars("█▓▒░ "),
    );
    pb.set_message(format!("📦 Downloading snapshots of {}", source_url));
    pb
}
