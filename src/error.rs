//! Error types for archive operations.

use std::io;
use thiserror::Error;

/// Errors that can occur while archiving snapshots.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O error during file or ledger operations.
    #[error(transparent)]
    IoError(#[from] io::Error),

    /// HTTP request error during an index query or snapshot fetch.
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),

    /// The snapshot index could not be queried for a source URL.
    ///
    /// Scoped to one source URL: the caller skips that URL and continues
    /// the run, but the run as a whole reports failure.
    #[error("Index query failed for {url}: {reason}")]
    IndexQueryFailed { url: String, reason: String },

    /// A single snapshot could not be fetched (timeout, connection error,
    /// or non-success status after both transport attempts).
    ///
    /// Scoped to one snapshot: the caller skips it and continues with the
    /// remaining snapshots for that URL.
    #[error("Snapshot fetch failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    /// A downloaded payload could not be persisted.
    ///
    /// The ledger entry for a snapshot is only written after its file
    /// write succeeds, so this error never leaves the ledger claiming a
    /// save that did not land on disk.
    #[error("Storage failure: {0}")]
    StorageFailed(String),
}
