//! Recovery of a classification payload from raw model text.
//!
//! Cleanup runs first, then the ordered [`STRATEGIES`] until one yields a
//! payload with a `documents` array, then line-based salvage. When even that
//! finds nothing the outcome is [`RecoveryOutcome::Fallback`]; recovery
//! never fails.

pub mod cleanup;
pub mod manual;
pub mod strategies;

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::sanitize::truncate_for_log;

pub use strategies::RecoveryMethod;
pub(crate) use strategies::STRATEGIES;

#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryOutcome {
    /// A payload whose `documents` field is an array.
    Parsed {
        payload: Value,
        method: RecoveryMethod,
    },
    /// Nothing usable was found.
    Fallback { note: String },
}

impl RecoveryOutcome {
    pub fn method(&self) -> Option<RecoveryMethod> {
        match self {
            RecoveryOutcome::Parsed { method, .. } => Some(*method),
            RecoveryOutcome::Fallback { .. } => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RecoveryOutcome::Fallback { .. })
    }
}

/// Recovers a classification payload from raw model output.
pub fn recover(raw: &str) -> RecoveryOutcome {
    let stripped = cleanup::strip_wrappers(raw);
    let collapsed = cleanup::collapse_duplicate_keys(&stripped);
    let cleaned = cleanup::trim_to_braces(&collapsed);

    let mut last_error = None;
    for (method, strategy) in STRATEGIES {
        match strategy(cleaned) {
            Ok(payload) => {
                debug!(method = method.as_str(), "Recovered model payload");
                return RecoveryOutcome::Parsed {
                    payload,
                    method: *method,
                };
            }
            Err(e) => {
                debug!(method = method.as_str(), error = %e, "Recovery strategy failed");
                last_error = Some(e.to_string());
            }
        }
    }

    warn!("All structured strategies failed, attempting line-based recovery");
    if let Some(payload) = manual::parse_lines(cleaned) {
        info!(
            documents = payload["documents"].as_array().map(Vec::len).unwrap_or(0),
            "Line-based recovery extracted documents"
        );
        return RecoveryOutcome::Parsed {
            payload,
            method: RecoveryMethod::Manual,
        };
    }

    let last_error = last_error.unwrap_or_else(|| "no candidate JSON found".to_string());
    error!(
        error = %last_error,
        response = %truncate_for_log(raw),
        "Could not recover a classification from model output"
    );
    RecoveryOutcome::Fallback {
        note: format!("Fallback parsing used: {}", last_error),
    }
}

/// Compiles a pattern, logging rather than panicking on failure.
pub(crate) fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            error!(pattern, error = %e, "Invalid recovery pattern");
            None
        }
    }
}

pub(crate) fn compiled(pattern: &LazyLock<Option<Regex>>) -> Option<&Regex> {
    Option::as_ref(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_json_is_object_match() {
        let outcome = recover(r#"{"documents": [{"type": "bank_statement"}]}"#);
        assert_eq!(outcome.method(), Some(RecoveryMethod::ObjectMatch));
    }

    #[test]
    fn test_prose_wrapped_json() {
        let raw = "Based on the analysis:\nI found the following.\n{\"documents\": []}\nLet me know!";
        match recover(raw) {
            RecoveryOutcome::Parsed { payload, method } => {
                assert_eq!(method, RecoveryMethod::ObjectMatch);
                assert_eq!(payload, json!({"documents": []}));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_bare_array_response() {
        let outcome = recover(r#"[{"type": "w2"}, {"type": "other"}]"#);
        assert_eq!(outcome.method(), Some(RecoveryMethod::ArrayMatch));
    }

    #[test]
    fn test_malformed_falls_to_manual() {
        let raw = "\"type\": \"bank_statement\"\n\"page_start\": 1\n\"page_end\": 1\n<<<oops";
        let outcome = recover(raw);
        assert_eq!(outcome.method(), Some(RecoveryMethod::Manual));
    }

    #[test]
    fn test_garbage_is_fallback() {
        let outcome = recover("The model declined to answer.");
        assert!(outcome.is_fallback());
        assert_eq!(outcome.method(), None);
    }

    #[test]
    fn test_arbitrary_inputs_never_panic() {
        let inputs = [
            "",
            "{",
            "}",
            "[",
            "```",
            "{\"documents\": [",
            "{\"documents\": 5}",
            "\"documents\": [{\"type\": \"a\\\"\"}",
            "ééé {{{ ]]] \u{0}",
            "[[[[[[[[[[",
        ];
        for input in inputs {
            let _ = recover(input);
        }
    }
}
