//! Plotting: a terminal preview and the SVG chart artifact.

pub mod ascii;
pub mod chart;

pub use ascii::render_ascii_plot;
pub use chart::{chart_file_name, write_chart};
