//! Source-URL canonicalization and content hashing for dedup.
//!
//! Two notes are "the same capture" when they share a normalized source URL,
//! or (for URL-less content) when their normalized text hashes match within
//! the dedup window. Normalization is intentionally conservative: it strips
//! what trackers append, not what publishers encode.

use sha2::{Digest, Sha256};
use url::Url;

/// Query parameters that identify a click, not a resource.
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "dclid", "msclkid", "mc_cid", "mc_eid", "igshid", "igsh", "ref",
    "ref_src", "ref_url", "cmpid", "spm",
];

/// Normalize a source URL for dedup lookups.
///
/// Lowercases scheme and host, strips the fragment, removes tracking query
/// parameters (`utm_*` and the known list), and trims a trailing slash from
/// non-root paths. Returns `None` for anything that does not parse as an
/// http(s) URL.
pub fn normalize_source_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.host_str()?;

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(&kept);
    }

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(&trimmed);
    }

    Some(url.to_string())
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}

/// Stable hash over normalized text content.
///
/// Whitespace runs collapse to single spaces and case is folded, so
/// re-submissions that differ only in formatting hash identically.
pub fn content_hash(text: &str) -> String {
    let normalized = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}
