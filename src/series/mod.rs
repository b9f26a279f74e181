//! Series construction: column resolution, row normalization, weekly
//! aggregation and year windowing.

pub mod normalize;
pub mod resolve;
pub mod weekly;
pub mod window;

pub use normalize::{DATE_COLUMN, normalize, raw_records};
pub use resolve::resolve;
pub use weekly::{aggregate, week_start};
pub use window::window;
