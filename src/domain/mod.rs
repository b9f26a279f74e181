//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - column selection and resolution (`ColumnSelector`, `ColumnCatalog`, `ColumnResolution`)
//! - raw and normalized observations (`Cell`, `RawRecord`, `NormalizedRecord`)
//! - aggregated outputs (`WeeklyPoint`, `Series`, `WindowSpec`)

pub mod types;

pub use types::*;
