//! SVG chart of the weekly series, drawn with Plotters.
//!
//! Weeks are plotted on a numeric day axis and labelled back as `Mon-YY`,
//! which keeps the chart independent of Plotters' date-axis feature.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use plotters::prelude::*;
use tracing::info;

use crate::domain::WeeklyPoint;
use crate::error::AppError;

/// Chart dimensions in pixels.
const CHART_SIZE: (u32, u32) = (1400, 700);

/// `<column>_<tag>_<min>-<max>.svg`, lower-cased, spaces replaced by `_`.
pub fn chart_file_name(column: &str, tag: &str, year_range: (i32, i32)) -> String {
    format!(
        "{}_{}_{}-{}.svg",
        file_safe(column),
        file_safe(tag),
        year_range.0,
        year_range.1
    )
}

fn file_safe(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect()
}

/// Draw the series and write it to `out_dir`; returns the written path.
pub fn write_chart(
    out_dir: &Path,
    points: &[WeeklyPoint],
    column: &str,
    tag: &str,
    year_range: (i32, i32),
) -> Result<PathBuf, AppError> {
    std::fs::create_dir_all(out_dir)
        .map_err(|e| AppError::new(4, format!("Failed to create output folder '{}': {e}", out_dir.display())))?;
    let path = out_dir.join(chart_file_name(column, tag, year_range));
    let title = format!("{column} values in {tag} ({}-{})", year_range.0, year_range.1);

    draw(&path, points, column, &title)
        .map_err(|e| AppError::new(4, format!("Failed to draw chart '{}': {e}", path.display())))?;

    info!(path = %path.display(), points = points.len(), "wrote chart");
    Ok(path)
}

fn draw(path: &Path, points: &[WeeklyPoint], column: &str, title: &str) -> Result<(), Box<dyn std::error::Error>> {
    let xy: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (f64::from(p.week_start.num_days_from_ce()), p.mean_value))
        .collect();
    let (x0, x1) = bounds(xy.iter().map(|&(x, _)| x), 3.5);
    let (y0, y1) = bounds(xy.iter().map(|&(_, y)| y), 0.5);

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 60)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    let y_desc = format!("{column} value");
    chart
        .configure_mesh()
        .x_desc("Week")
        .y_desc(y_desc.as_str())
        .x_labels(12)
        .y_labels(8)
        .x_label_formatter(&|v| month_label(*v))
        .draw()?;

    let blue = RGBColor(31, 119, 180);

    chart.draw_series(LineSeries::new(xy.iter().copied(), blue.mix(0.3).stroke_width(1)))?;
    chart
        .draw_series(xy.iter().map(|&(x, y)| Circle::new((x, y), 4, blue.mix(0.6).filled())))?
        .label(format!("Mean {column}"))
        .legend(move |(x, y)| Circle::new((x, y), 4, blue.filled()));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Min/max of `values`, widened by `pad` when they collapse to one value.
fn bounds(values: impl Iterator<Item = f64>, pad: f64) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !(min.is_finite() && max.is_finite()) {
        return (0.0, 1.0);
    }
    if max > min {
        let margin = (max - min) * 0.03;
        (min - margin, max + margin)
    } else {
        (min - pad, max + pad)
    }
}

fn month_label(days_from_ce: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(days_from_ce.round() as i32)
        .map(|d| d.format("%b-%y").to_string())
        .unwrap_or_default()
}
