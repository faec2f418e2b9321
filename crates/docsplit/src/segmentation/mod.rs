//! Page grouping and per-group model context.

pub mod context;
pub mod grouping;

pub use context::{build_structured_context, escape_markup};
pub use grouping::{AnalyzedPage, PageAnalysis, PageGroup, PageGrouper};
