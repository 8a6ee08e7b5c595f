//! File extension resolution for downloaded snapshots.

use url::Url;

/// Fallback for unknown web content.
const DEFAULT_EXTENSION: &str = ".html";

/// Fixed content-type to extension lookup table.
///
/// Keys are matched against the media type with any `;`-delimited
/// parameters stripped, case-insensitively.
const CONTENT_TYPE_TABLE: &[(&str, &str)] = &[
    ("text/html", ".html"),
    ("application/xhtml+xml", ".html"),
    ("text/plain", ".txt"),
    ("text/css", ".css"),
    ("text/csv", ".csv"),
    ("text/xml", ".xml"),
    ("application/xml", ".xml"),
    ("application/rss+xml", ".xml"),
    ("application/atom+xml", ".xml"),
    ("application/json", ".json"),
    ("application/pdf", ".pdf"),
    ("application/javascript", ".js"),
    ("text/javascript", ".js"),
    ("image/png", ".png"),
    ("image/jpeg", ".jpg"),
    ("image/gif", ".gif"),
    ("image/svg+xml", ".svg"),
    ("image/webp", ".webp"),
    ("image/x-icon", ".ico"),
    ("image/vnd.microsoft.icon", ".ico"),
    ("application/zip", ".zip"),
    ("application/gzip", ".gz"),
    ("font/woff", ".woff"),
    ("font/woff2", ".woff2"),
    ("audio/mpeg", ".mp3"),
    ("video/mp4", ".mp4"),
    ("application/octet-stream", ".bin"),
];

/// Derives a file extension for a snapshot.
///
/// Policy, in priority order:
///
/// 1. a recognizable extension at the end of the snapshot URL path,
/// 2. the declared `Content-Type`, via a fixed lookup table,
/// 3. `.html` as the default for unknown web content.
///
/// Never fails: the result is always a non-empty, filesystem-safe
/// extension starting with `.`.
pub(crate) fn resolve_extension(snapshot_url: &str, content_type: Option<&str>) -> String {
    if let Some(ext) = extension_from_url(snapshot_url) {
        return ext;
    }

    if let Some(declared) = content_type {
        let media_type = declared
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if let Some((_, ext)) = CONTENT_TYPE_TABLE.iter().find(|(k, _)| *k == media_type) {
            return (*ext).to_string();
        }
    }

    DEFAULT_EXTENSION.to_string()
}

/// Extracts a usable extension from the URL path, if one is present.
///
/// Only short ASCII-alphanumeric suffixes count as extensions; anything
/// else (trailing dots, query-ish garbage, overly long suffixes) is
/// rejected so the result stays filesystem-safe.
fn extension_from_url(snapshot_url: &str) -> Option<String> {
    let parsed = Url::parse(snapshot_url).ok()?;
    let last_segment = parsed.path().rsplit('/').next().unwrap_or_default();
    let (stem, ext) = last_segment.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    if ext.is_empty() || ext.len() > 5 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_from_url_path_wins() {
        let url = "https://web.archive.org/web/20200101000000/http://example.com/report.PDF";
        assert_eq!(resolve_extension(url, Some("text/html")), ".pdf");
    }

    #[test]
    fn test_content_type_used_when_path_has_no_extension() {
        let url = "https://web.archive.org/web/20200101000000/http://example.com/page";
        assert_eq!(resolve_extension(url, Some("image/png")), ".png");
    }

    #[test]
    fn test_content_type_parameters_are_stripped() {
        let url = "https://web.archive.org/web/20200101000000/http://example.com/";
        assert_eq!(
            resolve_extension(url, Some("text/html; charset=utf-8")),
            ".html"
        );
    }

    #[test]
    fn test_unknown_content_type_falls_back() {
        let url = "https://web.archive.org/web/20200101000000/http://example.com/thing";
        assert_eq!(resolve_extension(url, Some("application/x-mystery")), ".html");
    }

    #[test]
    fn test_missing_content_type_falls_back() {
        let url = "https://web.archive.org/web/20200101000000/http://example.com/thing";
        assert_eq!(resolve_extension(url, None), ".html");
    }

    #[test]
    fn test_unparsable_url_falls_back() {
        assert_eq!(resolve_extension("not a url", None), ".html");
    }

    #[test]
    fn test_query_string_does_not_leak_into_extension() {
        let url = "https://web.archive.org/web/20200101000000/http://example.com/page.php?id=3.14";
        assert_eq!(resolve_extension(url, None), ".php");
    }

    #[test]
    fn test_overlong_suffix_is_rejected() {
        let url = "https://web.archive.org/web/20200101000000/http://example.com/archive.backup1";
        assert_eq!(resolve_extension(url, None), ".html");
    }

    #[test]
    fn test_result_is_filesystem_safe() {
        let cases = [
            ("https://web.archive.org/web/20200101/http://e.com/a.tar", None),
            ("https://web.archive.org/web/20200101/http://e.com/", Some("application/pdf")),
            ("garbage", Some("also garbage")),
        ];
        for (url, content_type) in cases {
            let ext = resolve_extension(url, content_type);
            assert!(ext.starts_with('.'));
            assert!(ext[1..].chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }
}
