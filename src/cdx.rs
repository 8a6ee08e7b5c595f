//! CDX snapshot index client.
//!
//! Queries the archive's CDX endpoint for every known capture of a source
//! URL and normalizes the response into [`SnapshotRecord`]s.

use crate::error::ArchiveError;
use crate::http::HttpClient;
use crate::types::{ArchiveConfig, SnapshotRecord};
use std::collections::HashSet;
use tracing::{debug, warn};
use url::Url;

/// Client for the archive's CDX snapshot index.
pub(crate) struct SnapshotIndexClient<'a> {
    http: &'a HttpClient,
    config: &'a ArchiveConfig,
}

impl<'a> SnapshotIndexClient<'a> {
    pub fn new(http: &'a HttpClient, config: &'a ArchiveConfig) -> Self {
        Self { http, config }
    }

    /// Lists every known snapshot of `source_url`, ascending by timestamp.
    ///
    /// Rows the index repeats are deduplicated and rows that do not carry a
    /// 14-digit timestamp are dropped. An empty or malformed response body
    /// yields an empty list so the run can move on to the next URL; only a
    /// transport failure or non-success status (after the HTTPS-then-HTTP
    /// fallback) is surfaced as [`ArchiveError::IndexQueryFailed`].
    pub async fn list_snapshots(
        &self,
        source_url: &str,
    ) -> Result<Vec<SnapshotRecord>, ArchiveError> {
        let query_url = index_query_url(&self.config.index_url, source_url)?;
        debug!("Querying snapshot index: {}", query_url);

        let response = self
            .http
            .get_with_http_fallback(query_url.as_str())
            .await
            .map_err(|e| ArchiveError::IndexQueryFailed {
                url: source_url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status.is_success() {
            return Err(ArchiveError::IndexQueryFailed {
                url: source_url.to_string(),
                reason: format!("index returned HTTP {}", response.status),
            });
        }

        Ok(parse_index_response(source_url, &response.body))
    }
}

/// Builds the CDX query URL for a source URL.
///
/// Filters to successfully-archived captures and requests only the columns
/// the pipeline consumes.
fn index_query_url(index_url: &str, source_url: &str) -> Result<Url, ArchiveError> {
    Url::parse_with_params(
        index_url,
        &[
            ("url", source_url),
            ("output", "json"),
            ("fl", "timestamp,original"),
            ("filter", "statuscode:200"),
        ],
    )
    .map_err(|e| ArchiveError::IndexQueryFailed {
        url: source_url.to_string(),
        reason: format!("invalid index URL: {}", e),
    })
}

/// Parses a CDX JSON response body into normalized snapshot records.
///
/// The body is an array of arrays whose first row is the column header.
/// A body that fails to parse yields an empty list, not an error.
fn parse_index_response(source_url: &str, body: &[u8]) -> Vec<SnapshotRecord> {
    let rows: Vec<Vec<String>> = match serde_json::from_slice(body) {
        Ok(rows) => rows,
        Err(e) => {
            warn!(
                "Malformed index response for {}: {}. Treating as no snapshots.",
                source_url, e
            );
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut records: Vec<SnapshotRecord> = rows
        .into_iter()
        .skip(1) // column header
        .filter_map(|row| {
            let [timestamp, original_url] = row.as_slice() else {
                return None;
            };
            if !is_cdx_timestamp(timestamp) {
                return None;
            }
            seen.insert((timestamp.clone(), original_url.clone()))
                .then(|| SnapshotRecord {
                    timestamp: timestamp.clone(),
                    original_url: original_url.clone(),
                })
        })
        .collect();

    records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    records
}

/// A CDX capture timestamp is exactly 14 ASCII digits (`YYYYMMDDhhmmss`).
fn is_cdx_timestamp(timestamp: &str) -> bool {
    timestamp.len() == 14 && timestamp.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_header_row() {
        let body = br#"[["timestamp","original"],["20200101000000","http://example.com/"]]"#;
        let records = parse_index_response("http://example.com", body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp, "20200101000000");
        assert_eq!(records[0].original_url, "http://example.com/");
    }

    #[test]
    fn test_parse_deduplicates_repeated_rows() {
        let body = br#"[["timestamp","original"],
            ["20200101000000","http://example.com/"],
            ["20200101000000","http://example.com/"],
            ["20200102000000","http://example.com/"]]"#;
        let records = parse_index_response("http://example.com", body);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_parse_sorts_ascending_by_timestamp() {
        let body = br#"[["timestamp","original"],
            ["20210101000000","http://example.com/"],
            ["20190101000000","http://example.com/"],
            ["20200101000000","http://example.com/"]]"#;
        let records = parse_index_response("http://example.com", body);
        let timestamps: Vec<&str> = records.iter().map(|r| r.timestamp.as_str()).collect();
        assert_eq!(
            timestamps,
            vec!["20190101000000", "20200101000000", "20210101000000"]
        );
    }

    #[test]
    fn test_parse_drops_malformed_rows() {
        let body = br#"[["timestamp","original"],
            ["not-a-timestamp","http://example.com/"],
            ["20200101000000"],
            ["20200102000000","http://example.com/"]]"#;
        let records = parse_index_response("http://example.com", body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp, "20200102000000");
    }

    #[test]
    fn test_parse_malformed_body_yields_empty() {
        assert!(parse_index_response("http://example.com", b"<html>oops</html>").is_empty());
        assert!(parse_index_response("http://example.com", b"").is_empty());
    }

    #[test]
    fn test_index_query_url_encodes_source() {
        let query = index_query_url(
            "https://web.archive.org/cdx/search/cdx",
            "https://example.com/a b",
        )
        .unwrap();
        let query_string = query.query().unwrap();
        assert!(query_string.contains("output=json"));
        assert!(query_string.contains("fl=timestamp%2Coriginal"));
        assert!(query_string.contains("filter=statuscode%3A200"));
        assert!(!query_string.contains(' '));
    }

    #[test]
    fn test_snapshot_url_shape() {
        let record = SnapshotRecord {
            timestamp: "20200101000000".to_string(),
            original_url: "http://example.com/page".to_string(),
        };
        assert_eq!(
            record.snapshot_url("https://web.archive.org"),
            "https://web.archive.org/web/20200101000000/http://example.com/page"
        );
    }
}
