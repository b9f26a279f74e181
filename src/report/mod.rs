//! Reporting utilities: run summaries, per-file provenance and column listings.

pub mod format;

pub use format::*;
