//! Helpers for sanitizing data before it enters tracing span attributes.
//!
//! Object URIs can carry customer file names and model output can quote
//! document content, so neither is logged verbatim.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Longest model response excerpt written to logs.
pub const MAX_LOGGED_RESPONSE_CHARS: usize = 1000;

/// Keeps the scheme, bucket and final path segment of an object URI and
/// replaces everything in between with `…`.
///
/// - `s3://bucket/a/b/c/result.json` → `s3://bucket/…/result.json`
/// - `s3://bucket/file.pdf` → `s3://bucket/file.pdf`
pub fn redact_uri(uri: &str) -> String {
    let Some(scheme_end) = uri.find("://") else {
        return "<invalid-uri>".to_string();
    };
    let scheme = &uri[..scheme_end + 3];
    let rest = uri[scheme_end + 3..].trim_end_matches('/');
    let mut parts = rest.split('/');
    let bucket = parts.next().unwrap_or_default();
    let segments: Vec<&str> = parts.collect();

    match segments.as_slice() {
        [] => format!("{}{}", scheme, bucket),
        [only] => format!("{}{}/{}", scheme, bucket, only),
        [.., last] => format!("{}{}/…/{}", scheme, bucket, last),
    }
}

/// Short deterministic hash of a URI for correlating log lines.
pub fn hash_uri(uri: &str) -> String {
    let mut hasher = DefaultHasher::new();
    uri.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Truncates text to `MAX_LOGGED_RESPONSE_CHARS` characters, marking the cut.
pub fn truncate_for_log(text: &str) -> String {
    match text.char_indices().nth(MAX_LOGGED_RESPONSE_CHARS) {
        Some((byte_idx, _)) => format!("{}… [truncated]", &text[..byte_idx]),
        None => text.to_string(),
    }
}
