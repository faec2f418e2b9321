//! Shared test utilities for docsplit integration tests.
//!
//! This module provides:
//! - Builders for extraction output (pages, segments, custom outputs) and
//!   model replies
//! - Fakes for the extraction service and the model runtime that write into
//!   a `FsObjectStore` the way the real services write into a bucket

pub mod builders;
pub mod fakes;

pub use builders::*;
pub use fakes::*;
