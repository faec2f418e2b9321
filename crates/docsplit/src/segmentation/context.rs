use super::grouping::PageGroup;
use crate::extraction::DocumentLevel;

/// Escapes the five reserved markup characters.
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Serializes one page group, plus the segment's document-level fields, into
/// the tagged block sent to the model.
///
/// Page sections carry `number` and `type` attributes so that page ranges
/// returned by the model can be mapped back onto the source text.
pub fn build_structured_context(group: &PageGroup, document: &DocumentLevel) -> String {
    let summary = document
        .summary
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(escape_markup)
        .unwrap_or_else(|| "No document summary available".to_string());
    let description = document
        .description
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(escape_markup)
        .unwrap_or_else(|| "No document description available".to_string());
    let stats = &document.statistics;
    let reason = group
        .group_reason
        .map(|hint| hint.label())
        .unwrap_or("Content-based grouping");

    let mut lines = vec![
        "<document_analysis>".to_string(),
        "<document_context>".to_string(),
        format!("<summary>{}</summary>", summary),
        format!("<description>{}</description>", description),
        format!(
            "<statistics>Tables: {}, Figures: {}, Elements: {}</statistics>",
            stats.table_count, stats.figure_count, stats.element_count
        ),
        format!("<group_reason>{}</group_reason>", reason),
        "</document_context>".to_string(),
        String::new(),
        "<pages>".to_string(),
    ];

    for page in &group.pages {
        let number = page.record.page_number();
        let title = if page.analysis.title.is_empty() {
            format!("Page {}", number)
        } else {
            page.analysis.title.clone()
        };

        lines.push(format!(
            "<page number=\"{}\" type=\"{}\" title=\"{}\">",
            number,
            page.analysis.hint.label(),
            escape_markup(&title)
        ));
        lines.push(escape_markup(page.record.markdown()));
        lines.push("</page>".to_string());
        lines.push(String::new());
    }

    lines.push("</pages>".to_string());
    lines.push("</document_analysis>".to_string());
    lines.join("\n")
}
