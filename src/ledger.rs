//! Durable download ledger.
//!
//! The ledger is the single source of truth for "has this content already
//! been saved". It is a JSON-lines file, loaded fully into memory on
//! startup and appended to (write-then-flush) after every successful save,
//! so reruns are incremental and a crash right after a download does not
//! lose the entry.

use crate::error::ArchiveError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

/// One completed save, as persisted in the ledger file.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LedgerEntry {
    /// Content fingerprint of the saved payload.
    pub fingerprint: String,
    /// Source URL the snapshot belongs to.
    pub source_url: String,
    /// 14-digit capture timestamp of the first snapshot with this content.
    pub timestamp: String,
    /// Path the payload was written to.
    pub saved_path: String,
}

/// Append-only record of saved (source URL, fingerprint) pairs.
pub struct DownloadLedger {
    writer: BufWriter<File>,
    /// (source_url, fingerprint) membership, the dedup key.
    keys: HashSet<(String, String)>,
    /// (source_url, timestamp) membership, for skipping prior-run work
    /// before fetching.
    timestamps: HashSet<(String, String)>,
    entries: usize,
}

impl DownloadLedger {
    /// Opens the ledger at `path`, loading every existing entry.
    ///
    /// Malformed lines (including a torn final line left by an unclean
    /// shutdown) are logged and skipped rather than failing the run.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let mut keys = HashSet::new();
        let mut timestamps = HashSet::new();
        let mut entries = 0usize;

        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            for (line_number, line) in contents.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<LedgerEntry>(line) {
                    Ok(entry) => {
                        keys.insert((entry.source_url.clone(), entry.fingerprint));
                        timestamps.insert((entry.source_url, entry.timestamp));
                        entries += 1;
                    }
                    Err(e) => {
                        warn!(
                            "Ignoring malformed ledger line {} in {:?}: {}",
                            line_number + 1,
                            path,
                            e
                        );
                    }
                }
            }
            debug!("Loaded {} ledger entries from {:?}", entries, path);
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            keys,
            timestamps,
            entries,
        })
    }

    /// Whether this exact content has already been saved for `source_url`.
    pub fn contains(&self, source_url: &str, fingerprint: &str) -> bool {
        self.keys
            .contains(&(source_url.to_string(), fingerprint.to_string()))
    }

    /// Whether a prior run already recorded this capture timestamp for
    /// `source_url`, allowing the pipeline to skip the fetch entirely.
    pub fn contains_timestamp(&self, source_url: &str, timestamp: &str) -> bool {
        self.timestamps
            .contains(&(source_url.to_string(), timestamp.to_string()))
    }

    /// Appends an entry and flushes it to disk.
    ///
    /// Idempotent: recording a (source_url, fingerprint) pair that is
    /// already present is a no-op, not an error. After a successful return
    /// the in-memory and on-disk views agree.
    pub fn record(&mut self, entry: LedgerEntry) -> Result<(), ArchiveError> {
        let key = (entry.source_url.clone(), entry.fingerprint.clone());
        if self.keys.contains(&key) {
            return Ok(());
        }

        let line = serde_json::to_string(&entry)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        self.timestamps
            .insert((entry.source_url, entry.timestamp));
        self.keys.insert(key);
        self.entries += 1;
        Ok(())
    }

    /// Number of entries currently known to the ledger.
    pub fn len(&self) -> usize {
        self.entries
    }

    /// True when the ledger holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(source_url: &str, fingerprint: &str, timestamp: &str) -> LedgerEntry {
        LedgerEntry {
            fingerprint: fingerprint.to_string(),
            source_url: source_url.to_string(),
            timestamp: timestamp.to_string(),
            saved_path: format!("downloads/{}_{}.html", timestamp, fingerprint),
        }
    }

    #[test]
    fn test_open_missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let ledger = DownloadLedger::open(&dir.path().join("ledger.jsonl")).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_record_then_reopen_preserves_membership() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        let mut ledger = DownloadLedger::open(&path).unwrap();
        ledger
            .record(entry("http://a.com", "aaaa", "20200101000000"))
            .unwrap();
        ledger
            .record(entry("http://b.com", "aaaa", "20200202000000"))
            .unwrap();
        drop(ledger);

        let reopened = DownloadLedger::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert!(reopened.contains("http://a.com", "aaaa"));
        assert!(reopened.contains("http://b.com", "aaaa"));
        assert!(!reopened.contains("http://a.com", "bbbb"));
        assert!(reopened.contains_timestamp("http://a.com", "20200101000000"));
        assert!(!reopened.contains_timestamp("http://a.com", "20200202000000"));
    }

    #[test]
    fn test_record_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        let mut ledger = DownloadLedger::open(&path).unwrap();
        ledger
            .record(entry("http://a.com", "aaaa", "20200101000000"))
            .unwrap();
        ledger
            .record(entry("http://a.com", "aaaa", "20200101000000"))
            .unwrap();
        assert_eq!(ledger.len(), 1);
        drop(ledger);

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk.lines().count(), 1);
    }

    #[test]
    fn test_same_fingerprint_is_scoped_per_source_url() {
        let dir = tempdir().unwrap();
        let mut ledger = DownloadLedger::open(&dir.path().join("ledger.jsonl")).unwrap();
        ledger
            .record(entry("http://a.com", "aaaa", "20200101000000"))
            .unwrap();
        assert!(ledger.contains("http://a.com", "aaaa"));
        assert!(!ledger.contains("http://b.com", "aaaa"));
    }

    #[test]
    fn test_torn_final_line_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        let mut ledger = DownloadLedger::open(&path).unwrap();
        ledger
            .record(entry("http://a.com", "aaaa", "20200101000000"))
            .unwrap();
        drop(ledger);

        // Simulate a crash mid-append: a partial JSON line with no newline.
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"fingerprint\":\"bb").unwrap();
        drop(file);

        let reopened = DownloadLedger::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        assert!(reopened.contains("http://a.com", "aaaa"));
    }
}
