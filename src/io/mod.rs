//! Input/output helpers.
//!
//! - spreadsheet/CSV readers (`source`)
//! - dataset file discovery (`discover`)
//! - dataset download (`fetch`)
//! - series exports (CSV/JSON) (`export`)

pub mod discover;
pub mod export;
pub mod fetch;
pub mod source;

pub use discover::*;
pub use export::*;
pub use fetch::*;
pub use source::*;
