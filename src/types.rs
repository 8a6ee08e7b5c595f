//! Data structures for archive operations.

use std::path::PathBuf;
use std::time::Duration;

/// One snapshot row returned by the CDX index.
///
/// Records are produced by the index client and never mutated afterwards;
/// the orchestrator iterates them in ascending timestamp order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRecord {
    /// 14-digit UTC capture timestamp (`YYYYMMDDhhmmss`).
    pub timestamp: String,
    /// The original URL the archive captured.
    pub original_url: String,
}

impl SnapshotRecord {
    /// Builds the replay URL for this snapshot under the given archive base
    /// (e.g. `https://web.archive.org`).
    pub fn snapshot_url(&self, base: &str) -> String {
        format!(
            "{}/web/{}/{}",
            base.trim_end_matches('/'),
            self.timestamp,
            self.original_url
        )
    }
}

/// Configuration for an archive run.
///
/// Replaces ad-hoc global state: constructed once from CLI flags and passed
/// into the pipeline components.
///
/// # Example
///
/// ```
/// use waykeep::ArchiveConfig;
///
/// let config = ArchiveConfig {
///     input_file: "urls.txt".into(),
///     output_dir: "downloads".into(),
///     ledger_path: "ledger.jsonl".into(),
///     ..ArchiveConfig::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// Text file listing source URLs, one per line.
    pub input_file: PathBuf,
    /// Directory that receives the downloaded snapshot files.
    pub output_dir: PathBuf,
    /// Path of the append-only download ledger.
    pub ledger_path: PathBuf,
    /// CDX index endpoint (e.g. `https://web.archive.org/cdx/search/cdx`).
    pub index_url: String,
    /// Base URL for snapshot replay fetches (e.g. `https://web.archive.org`).
    pub snapshot_base_url: String,
    /// Bounded connect + read timeout applied to every network call.
    pub request_timeout: Duration,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            input_file: PathBuf::from("urls.txt"),
            output_dir: PathBuf::from("downloads"),
            ledger_path: PathBuf::from("ledger.jsonl"),
            index_url: "https://web.archive.org/cdx/search/cdx".to_string(),
            snapshot_base_url: "https://web.archive.org".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Outcome of processing a single snapshot candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// New content: written to disk and recorded in the ledger.
    Saved(PathBuf),
    /// Byte-identical to an earlier snapshot of the same source URL.
    Duplicate,
    /// Already recorded in the ledger by a prior run; not fetched again.
    Skipped,
    /// Fetch or storage failed; the snapshot was abandoned.
    Failed,
}

/// Per-source-URL processing counts.
#[derive(Debug, Clone, Default)]
pub struct UrlReport {
    /// The source URL these counts belong to.
    pub source_url: String,
    /// Snapshot candidates returned by the index.
    pub candidates: usize,
    /// Snapshots saved as new files.
    pub saved: usize,
    /// Snapshots discarded as byte-identical duplicates.
    pub duplicates: usize,
    /// Snapshots skipped without fetching (recorded by a prior run).
    pub skipped: usize,
    /// Snapshots that failed to fetch or persist.
    pub failed: usize,
}

/// Aggregate result of one archive run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Per-URL reports in input order.
    pub reports: Vec<UrlReport>,
    /// Source URLs whose index query failed outright.
    pub failed_urls: usize,
}

impl RunSummary {
    /// True when every source URL could at least be queried.
    ///
    /// Individual snapshot failures do not make the run fail.
    pub fn is_success(&self) -> bool {
        self.failed_urls == 0
    }

    /// Total snapshots saved across all URLs.
    pub fn total_saved(&self) -> usize {
        self.reports.iter().map(|r| r.saved).sum()
    }

    /// Total byte-identical duplicates discarded across all URLs.
    pub fn total_duplicates(&self) -> usize {
        self.reports.iter().map(|r| r.duplicates).sum()
    }

    /// Total snapshots skipped as prior-run work across all URLs.
    pub fn total_skipped(&self) -> usize {
        self.reports.iter().map(|r| r.skipped).sum()
    }

    /// Total failed snapshots across all URLs.
    pub fn total_failed(&self) -> usize {
        self.reports.iter().map(|r| r.failed).sum()
    }
}
