//! Ordered parse strategies. Each is a pure function of the cleaned text and
//! succeeds only with a payload that carries a `documents` array.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use super::{compile, compiled};

#[derive(Debug, thiserror::Error)]
pub(crate) enum StrategyError {
    #[error("no candidate JSON found")]
    NoMatch,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parsed JSON has no documents array")]
    MissingDocuments,
}

/// How a model response was turned into a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryMethod {
    ObjectMatch,
    ArrayMatch,
    MarkerExtraction,
    Repair,
    Manual,
}

impl RecoveryMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            RecoveryMethod::ObjectMatch => "object_match",
            RecoveryMethod::ArrayMatch => "array_match",
            RecoveryMethod::MarkerExtraction => "marker_extraction",
            RecoveryMethod::Repair => "repair",
            RecoveryMethod::Manual => "manual",
        }
    }
}

pub(crate) type Strategy = fn(&str) -> Result<Value, StrategyError>;

/// Structured strategies in the order they are tried.
pub(crate) const STRATEGIES: &[(RecoveryMethod, Strategy)] = &[
    (RecoveryMethod::ObjectMatch, object_match),
    (RecoveryMethod::ArrayMatch, array_match),
    (RecoveryMethod::MarkerExtraction, marker_extraction),
    (RecoveryMethod::Repair, repair),
];

static OBJECT_SPAN: LazyLock<Option<Regex>> = LazyLock::new(|| compile(r"(?s)\{.*\}"));
static ARRAY_SPAN: LazyLock<Option<Regex>> = LazyLock::new(|| compile(r"(?s)\[.*\]"));
static FENCED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"(?s)```json\s*(.*?)\s*```", r"(?s)```\s*(.*?)\s*```"]
        .into_iter()
        .filter_map(compile)
        .collect()
});
static DOCUMENTS_KEY: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r#""documents"\s*:\s*\["#));

static TRAILING_COMMA: LazyLock<Option<Regex>> = LazyLock::new(|| compile(r",(\s*[}\]])"));
static BARE_KEY: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:"));
static SINGLE_QUOTED_KEY: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"([{,]\s*)'([^']*)'\s*:"));
static SINGLE_QUOTED_VALUE: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r":\s*'([^']*)'"));
static WHITESPACE_RUN: LazyLock<Option<Regex>> = LazyLock::new(|| compile(r"\s+"));

/// Accepts an object with a `documents` array, or wraps a bare array of
/// document objects.
fn into_payload(value: Value) -> Result<Value, StrategyError> {
    if value.get("documents").is_some_and(Value::is_array) {
        return Ok(value);
    }
    match value {
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
            let mut map = Map::new();
            map.insert("documents".to_string(), Value::Array(items));
            Ok(Value::Object(map))
        }
        _ => Err(StrategyError::MissingDocuments),
    }
}

fn parse_payload(candidate: &str) -> Result<Value, StrategyError> {
    into_payload(serde_json::from_str(candidate)?)
}

fn first_match<'t>(pattern: &LazyLock<Option<Regex>>, text: &'t str) -> Option<&'t str> {
    compiled(pattern)?.find(text).map(|m| m.as_str())
}

/// Greedy span from the first `{` to the last `}`.
pub(crate) fn object_match(text: &str) -> Result<Value, StrategyError> {
    let candidate = first_match(&OBJECT_SPAN, text).ok_or(StrategyError::NoMatch)?;
    parse_payload(candidate)
}

/// Greedy span from the first `[` to the last `]`.
pub(crate) fn array_match(text: &str) -> Result<Value, StrategyError> {
    let candidate = first_match(&ARRAY_SPAN, text).ok_or(StrategyError::NoMatch)?;
    parse_payload(candidate)
}

/// Fenced blocks, then a `"documents": [...]` fragment re-wrapped into a
/// full object.
pub(crate) fn marker_extraction(text: &str) -> Result<Value, StrategyError> {
    let mut last_error = StrategyError::NoMatch;

    for fence in FENCED.iter() {
        if let Some(body) = fence.captures(text).and_then(|c| c.get(1)) {
            match parse_payload(body.as_str()) {
                Ok(payload) => return Ok(payload),
                Err(e) => last_error = e,
            }
        }
    }

    if let Some(key) = compiled(&DOCUMENTS_KEY).and_then(|re| re.find(text)) {
        // The match ends just past the opening bracket.
        let open = key.end() - 1;
        if let Some(array) = balanced_array(&text[open..]) {
            return parse_payload(&format!("{{\"documents\":{}}}", array));
        }
    }

    Err(last_error)
}

/// Mechanical repair of common syntax slips, then a full parse.
pub(crate) fn repair(text: &str) -> Result<Value, StrategyError> {
    let mut repaired = text.replace(['\r', '\n', '\t'], " ");

    let rewrites: [(&LazyLock<Option<Regex>>, &str); 5] = [
        (&WHITESPACE_RUN, " "),
        (&TRAILING_COMMA, "$1"),
        (&SINGLE_QUOTED_KEY, "$1\"$2\":"),
        (&BARE_KEY, "$1\"$2\":"),
        (&SINGLE_QUOTED_VALUE, ": \"$1\""),
    ];
    for (pattern, replacement) in rewrites {
        if let Some(re) = compiled(pattern) {
            repaired = re.replace_all(&repaired, replacement).into_owned();
        }
    }

    let candidate = first_match(&OBJECT_SPAN, &repaired).unwrap_or(&repaired);
    parse_payload(candidate)
}

/// Returns the JSON array starting at `text[0] == '['`, honoring strings.
///
/// A truncated array is cut back to its last complete element so a response
/// that ran out of tokens still yields the documents it finished.
fn balanced_array(text: &str) -> Option<String> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;
    let mut last_complete = None;

    for (i, c) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '[' | '{' if !in_string => depth += 1,
            ']' | '}' if !in_string => {
                depth = depth.saturating_sub(1);
                match depth {
                    0 => return Some(text[..=i].to_string()),
                    1 => last_complete = Some(i),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    last_complete.map(|end| format!("{}]", &text[..=end]))
}
