//! Text cleanup applied before any parse attempt.

use std::sync::LazyLock;

use regex::Regex;

use super::{compile, compiled};

/// Wrappers models put around JSON: fences, stray backticks, lead-in lines.
static WRAPPER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?m)^```json\s*",
        r"(?m)^```\s*",
        r"(?m)\s*```$",
        r"(?m)^`+",
        r"(?m)`+$",
        r"(?m)^Here's the analysis:",
        r"(?m)^Based on the analysis:",
        r"(?m)^The documents are:",
    ]
    .into_iter()
    .filter_map(compile)
    .collect()
});

/// A `"key": <scalar>` pair. Nested values never collapse.
static SCALAR_PAIR: LazyLock<Option<Regex>> = LazyLock::new(|| {
    compile(
        r#""([A-Za-z_][A-Za-z0-9_]*)"\s*:\s*(?:"(?:[^"\\]|\\.)*"|-?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?|true|false|null)"#,
    )
});

pub fn strip_wrappers(raw: &str) -> String {
    WRAPPER_PATTERNS
        .iter()
        .fold(raw.trim().to_string(), |text, pattern| {
            pattern.replace_all(&text, "").into_owned()
        })
}

/// Collapses runs of adjacent pairs with the same key, keeping the last.
///
/// `"page_end": 5, "page_end": 5` becomes `"page_end": 5`.
pub fn collapse_duplicate_keys(text: &str) -> String {
    let Some(pair) = compiled(&SCALAR_PAIR) else {
        return text.to_string();
    };

    let pairs: Vec<(usize, usize, &str)> = pair
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let key = caps.get(1)?;
            Some((whole.start(), whole.end(), key.as_str()))
        })
        .collect();

    let mut output = String::with_capacity(text.len());
    let mut copied_to = 0;
    for window in pairs.windows(2) {
        let (start, end, key) = window[0];
        let (next_start, _, next_key) = window[1];
        if key == next_key && text[end..next_start].trim() == "," {
            output.push_str(&text[copied_to..start]);
            copied_to = next_start;
        }
    }
    output.push_str(&text[copied_to..]);
    output
}

/// Trims to the span between the first `{` and the last `}` when the text
/// is object-shaped. Array-shaped text (a `[` before any `{`) is untouched.
pub fn trim_to_braces(text: &str) -> &str {
    let Some(open) = text.find('{') else {
        return text;
    };
    if text.find('[').is_some_and(|bracket| bracket < open) {
        return text;
    }
    match text.rfind('}') {
        Some(close) if close > open => &text[open..=close],
        _ => text,
    }
}
