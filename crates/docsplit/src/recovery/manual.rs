//! Line-based salvage for output no structured strategy could parse.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Map, Value};

use super::{compile, compiled};

/// Confidence assigned to the whole analysis when it was salvaged by hand.
pub const MANUAL_ANALYSIS_CONFIDENCE: f64 = 0.7;

static FIELD: LazyLock<Option<Regex>> = LazyLock::new(|| {
    compile(
        r#""(type)"\s*:\s*"([^"]+)"|"(page_start|page_end)"\s*:\s*(\d+)|"(confidence)"\s*:\s*(\d+(?:\.\d+)?|\.\d+)"#,
    )
});

/// Scans each line for `type`, `page_start`, `page_end` and `confidence`
/// occurrences in positional order. Every `type` opens a new document.
///
/// Returns `None` when nothing at all was found.
pub fn parse_lines(text: &str) -> Option<Value> {
    let field = compiled(&FIELD)?;

    let mut documents: Vec<Value> = Vec::new();
    let mut current = Map::new();

    for line in text.lines() {
        for caps in field.captures_iter(line.trim()) {
            if let Some(doc_type) = caps.get(2) {
                if !current.is_empty() {
                    documents.push(Value::Object(std::mem::take(&mut current)));
                }
                current.insert("type".to_string(), json!(doc_type.as_str()));
            } else if let (Some(key), Some(number)) = (caps.get(3), caps.get(4)) {
                if let Ok(page) = number.as_str().parse::<u64>() {
                    current.insert(key.as_str().to_string(), json!(page));
                }
            } else if let Some(confidence) = caps.get(6) {
                if let Ok(value) = confidence.as_str().parse::<f64>() {
                    current.insert("confidence".to_string(), json!(value));
                }
            }
        }
    }

    if !current.is_empty() {
        documents.push(Value::Object(current));
    }

    if documents.is_empty() {
        return None;
    }

    let found = documents.len();
    Some(json!({
        "total_documents_found": found,
        "documents": documents,
        "analysis_confidence": MANUAL_ANALYSIS_CONFIDENCE,
        "parsing_method": "manual",
    }))
}
