use regex::Regex;
use serde::{Deserialize, Serialize};

/// Provisional page label produced by [`IndicatorMatcher`].
///
/// Hints only mark likely document boundaries. The generative model makes
/// the final classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageHint {
    BankStatement,
    LoanApplication,
    AppraisalReport,
    TransmittalSummary,
    CreditReport,
    DriversLicense,
    W2Form,
    PayStub,
    Instructions,
    Continuation,
}

impl PageHint {
    pub fn label(self) -> &'static str {
        match self {
            PageHint::BankStatement => "bankStatement",
            PageHint::LoanApplication => "loanApplication",
            PageHint::AppraisalReport => "appraisalReport",
            PageHint::TransmittalSummary => "transmittalSummary",
            PageHint::CreditReport => "creditReport",
            PageHint::DriversLicense => "driversLicense",
            PageHint::W2Form => "w2Form",
            PageHint::PayStub => "payStub",
            PageHint::Instructions => "instructions",
            PageHint::Continuation => "continuation",
        }
    }

    /// True for hints that name an actual document kind.
    pub fn is_substantive(self) -> bool {
        !matches!(self, PageHint::Continuation | PageHint::Instructions)
    }
}

impl std::fmt::Display for PageHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Indicator patterns in evaluation order. The first matching entry wins.
const INDICATORS: &[(PageHint, &str)] = &[
    (
        PageHint::BankStatement,
        r"bank.*statement|account.*statement|royal bank|balance|paid in|paid out|statement.*period",
    ),
    (
        PageHint::LoanApplication,
        r"uniform.*residential.*loan|loan.*application|borrower.*information|mortgage.*loan",
    ),
    (
        PageHint::AppraisalReport,
        r"uniform.*residential.*appraisal|appraisal.*report|property.*address.*city.*state|file.*#",
    ),
    (
        PageHint::TransmittalSummary,
        r"uniform.*underwriting.*transmittal|transmittal.*summary|form.*1008|underwriting.*information",
    ),
    (
        PageHint::CreditReport,
        r"credit.*report|credit.*score|fico.*score|experian|equifax|transunion",
    ),
    (
        PageHint::DriversLicense,
        r"driver.*license|drivers.*license|state.*id|license.*number",
    ),
    (
        PageHint::W2Form,
        r"form.*w-?2|wage.*tax.*statement|employer.*identification",
    ),
    (
        PageHint::PayStub,
        r"pay.*stub|earnings.*statement|gross.*pay|net.*pay",
    ),
    (
        PageHint::Instructions,
        r"instructions|directions|how.*to.*complete|printing.*instructions",
    ),
];

/// Matches page text against the fixed indicator table.
pub struct IndicatorMatcher {
    /// Pre-compiled patterns in priority order
    compiled: Vec<(PageHint, Regex)>,
}

impl IndicatorMatcher {
    pub fn new() -> Self {
        let compiled = INDICATORS
            .iter()
            .filter_map(|(hint, pattern)| match Regex::new(&format!("(?i){}", pattern)) {
                Ok(regex) => Some((*hint, regex)),
                Err(e) => {
                    tracing::warn!(hint = hint.label(), error = %e, "Skipping invalid indicator pattern");
                    None
                }
            })
            .collect();

        Self { compiled }
    }

    /// Returns the first hint whose pattern matches, or `Continuation`.
    pub fn match_text(&self, text: &str) -> PageHint {
        self.compiled
            .iter()
            .find(|(_, regex)| regex.is_match(text))
            .map(|(hint, _)| *hint)
            .unwrap_or(PageHint::Continuation)
    }
}

impl Default for IndicatorMatcher {
    fn default() -> Self {
        Self::new()
    }
}
