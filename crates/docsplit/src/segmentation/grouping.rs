use serde::Serialize;
use tracing::{debug, info};

use crate::categorizer::{IndicatorMatcher, PageHint};
use crate::config::GroupingConfig;
use crate::extraction::PageRecord;

/// Heuristic read of a single page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageAnalysis {
    pub page_number: u32,
    pub hint: PageHint,
    pub word_count: usize,
    pub is_likely_first_page: bool,
    pub has_substantive_content: bool,
    /// First `# ` heading on the page, empty when there is none.
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct AnalyzedPage {
    pub record: PageRecord,
    pub analysis: PageAnalysis,
}

/// A contiguous run of pages believed to form one logical document.
#[derive(Debug, Clone)]
pub struct PageGroup {
    pub pages: Vec<AnalyzedPage>,
    /// The hint that opened the group. The first group records the first
    /// non-continuation hint it sees instead.
    pub group_reason: Option<PageHint>,
}

impl PageGroup {
    fn opened_by(reason: Option<PageHint>) -> Self {
        Self {
            pages: Vec::new(),
            group_reason: reason,
        }
    }

    pub fn page_numbers(&self) -> Vec<u32> {
        self.pages.iter().map(|p| p.record.page_number()).collect()
    }

    /// `"3"` for a single page, `"3-5"` otherwise.
    pub fn page_range(&self) -> String {
        match (self.pages.first(), self.pages.last()) {
            (Some(first), Some(last)) if first.record.page_index != last.record.page_index => {
                format!("{}-{}", first.record.page_number(), last.record.page_number())
            }
            (Some(first), _) => first.record.page_number().to_string(),
            _ => String::new(),
        }
    }
}

/// Partitions a page sequence into groups at likely document boundaries.
pub struct PageGrouper {
    matcher: IndicatorMatcher,
    substantive_words: usize,
    first_page_words: usize,
}

impl PageGrouper {
    pub fn new(config: &GroupingConfig) -> Self {
        Self {
            matcher: IndicatorMatcher::new(),
            substantive_words: config.substantive_word_threshold,
            first_page_words: config.first_page_word_threshold,
        }
    }

    /// `position` is the page's place in the sequence being grouped.
    pub fn analyze(&self, page: &PageRecord, position: usize) -> PageAnalysis {
        let markdown = page.markdown();
        let word_count = page.word_count();

        let is_likely_first_page = markdown.contains("Page 1")
            || page.detected_page_number == Some(1)
            || (word_count > self.first_page_words && position > 0);

        PageAnalysis {
            page_number: page.page_number(),
            hint: self.matcher.match_text(markdown),
            word_count,
            is_likely_first_page,
            has_substantive_content: word_count > self.substantive_words,
            title: extract_title(markdown),
        }
    }

    /// Groups pages in order. Every input page lands in exactly one group.
    pub fn group(&self, pages: Vec<PageRecord>) -> Vec<PageGroup> {
        let total = pages.len();
        let mut groups = Vec::new();
        let mut current = PageGroup::opened_by(None);

        for (position, record) in pages.into_iter().enumerate() {
            let analysis = self.analyze(&record, position);

            if starts_new_group(&analysis, &current, position) && !current.pages.is_empty() {
                debug!(page = analysis.page_number, hint = %analysis.hint, "Starting new page group");
                groups.push(std::mem::replace(
                    &mut current,
                    PageGroup::opened_by(Some(analysis.hint)),
                ));
            }

            if current.group_reason.is_none() && analysis.hint != PageHint::Continuation {
                current.group_reason = Some(analysis.hint);
            }
            current.pages.push(AnalyzedPage { record, analysis });
        }

        if !current.pages.is_empty() {
            groups.push(current);
        }

        info!(pages = total, groups = groups.len(), "Grouped pages into logical documents");
        groups
    }
}

fn starts_new_group(analysis: &PageAnalysis, current: &PageGroup, position: usize) -> bool {
    if position == 0 {
        return true;
    }

    if analysis.hint.is_substantive() && analysis.has_substantive_content {
        return true;
    }

    analysis.is_likely_first_page && !current.pages.is_empty() && analysis.has_substantive_content
}

fn extract_title(markdown: &str) -> String {
    markdown
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# ").map(str::trim).filter(|t| !t.is_empty()))
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{PageStatistics, Representation};

    fn page(index: u32, markdown: &str, words: u64) -> PageRecord {
        PageRecord {
            page_index: index,
            representation: Representation {
                markdown: Some(markdown.to_string()),
                ..Default::default()
            },
            statistics: Some(PageStatistics {
                word_count: Some(words),
            }),
            detected_page_number: None,
        }
    }

    fn grouper() -> PageGrouper {
        PageGrouper::new(&GroupingConfig::default())
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(extract_title("intro\n  # Bank Statement  \n# Other"), "Bank Statement");
        assert_eq!(extract_title("## Sub heading\n#NoSpace"), "");
        assert_eq!(extract_title("# "), "");
    }

    #[test]
    fn test_analyze_first_page_markers() {
        let g = grouper();
        assert!(g.analyze(&page(4, "Page 1 of 3", 10), 4).is_likely_first_page);

        let mut detected = page(4, "text", 10);
        detected.detected_page_number = Some(1);
        assert!(g.analyze(&detected, 4).is_likely_first_page);

        assert!(g.analyze(&page(4, "text", 101), 4).is_likely_first_page);
        assert!(!g.analyze(&page(0, "text", 101), 0).is_likely_first_page);
        assert!(!g.analyze(&page(4, "text", 100), 4).is_likely_first_page);
    }

    #[test]
    fn test_substantive_threshold_is_exclusive() {
        let g = grouper();
        assert!(!g.analyze(&page(0, "x", 50), 0).has_substantive_content);
        assert!(g.analyze(&page(0, "x", 51), 0).has_substantive_content);
    }

    #[test]
    fn test_instructions_do_not_split() {
        let g = grouper();
        let groups = g.group(vec![
            page(0, "# Loan Application", 80),
            page(1, "Printing instructions for this form", 80),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group_reason, Some(PageHint::LoanApplication));
    }

    #[test]
    fn test_low_content_indicator_page_does_not_split() {
        let g = grouper();
        let groups = g.group(vec![
            page(0, "# Bank Statement", 80),
            page(1, "credit report", 20),
        ]);
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn test_dense_continuation_page_splits_as_first_page() {
        let g = grouper();
        let groups = g.group(vec![
            page(0, "# Bank Statement", 80),
            page(1, "lorem ipsum", 150),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].group_reason, Some(PageHint::Continuation));
        assert_eq!(groups[1].page_range(), "2");
    }

    #[test]
    fn test_first_group_reason_waits_for_indicator() {
        let g = grouper();
        let groups = g.group(vec![page(0, "cover sheet", 10), page(1, "Directions", 10)]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group_reason, Some(PageHint::Instructions));
        assert_eq!(groups[0].page_range(), "1-2");
        assert_eq!(groups[0].page_numbers(), vec![1, 2]);
    }

    #[test]
    fn test_empty_input() {
        assert!(grouper().group(Vec::new()).is_empty());
    }
}
