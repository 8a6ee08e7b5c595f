//! WayKeep - Incremental, deduplicated Wayback Machine snapshot archiver
//!
//! This library downloads every known snapshot of a set of URLs from the
//! Internet Archive's Wayback Machine, keeping only content-distinct
//! copies and recording completed work in a durable ledger so reruns are
//! incremental.
//!
//! # Features
//!
//! - **Snapshot Discovery**: Queries the CDX index for every capture of a URL
//! - **Content Deduplication**: SHA-256 fingerprints collapse byte-identical snapshots
//! - **Incremental Reruns**: An append-only ledger skips work done in prior runs
//! - **Transport Fallback**: Retries once over plain HTTP when HTTPS cannot connect
//! - **Progress Tracking**: Real-time per-URL progress reporting
//!
//! # Example
//!
//! ```no_run
//! use waykeep::{archive_urls, ArchiveConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ArchiveConfig::default();
//! let summary = archive_urls(&config).await?;
//! assert!(summary.is_success());
//! # Ok(())
//! # }
//! ```

mod cdx;
mod error;
mod extension;
mod hash;
mod http;
mod ledger;
mod orchestrator;
mod types;

pub use error::ArchiveError;
pub use ledger::{DownloadLedger, LedgerEntry};
pub use orchestrator::archive_urls;
pub use types::{ArchiveConfig, RunSummary, SnapshotOutcome, SnapshotRecord, UrlReport};
