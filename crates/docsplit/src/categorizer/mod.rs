//! Content-based page hints used as grouping boundaries.

pub mod matcher;

pub use matcher::{IndicatorMatcher, PageHint};
