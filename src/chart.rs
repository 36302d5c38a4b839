use crate::error::{PipelineError, Result};
use crate::structs::GroupMean;
use log::debug;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

pub const CHART_TITLE: &str = "Average Temperature per City (Celsius)";
pub const X_LABEL: &str = "Temperature (Celsius)";
pub const Y_LABEL: &str = "City";

/// 10x6 inches at 300 dpi.
const CHART_SIZE: (u32, u32) = (3000, 1800);
const FONT: &str = "sans-serif";
const BAR_COLOR: RGBColor = RGBColor(135, 206, 235);

/// Renders a horizontal bar chart, one bar per city in the given order.
///
/// Callers pass the means coolest first so the hottest city ends up on top.
///
/// # Errors
/// Returns `PipelineError::Chart` if there is nothing to plot or the image
/// cannot be drawn or saved.
pub fn render_chart(means: &[GroupMean], output_path: &Path) -> Result<()> {
    if means.is_empty() {
        return Err(PipelineError::Chart(
            "no city has a mean temperature to plot".to_string(),
        ));
    }
    debug!(
        "Rendering {} bars to {}",
        means.len(),
        output_path.display()
    );

    let root = BitMapBackend::new(output_path, CHART_SIZE).into_drawing_area();
    draw_chart(&root, means, true)?;
    root.present().map_err(chart_error)?;
    Ok(())
}

/// Draws the bars onto `root`, plus title, axis names and city labels when
/// `labelled` is set. Labels are the only part that needs system fonts.
fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    means: &[GroupMean],
    labelled: bool,
) -> Result<()> {
    let (x_min, x_max) = x_bounds(means);
    root.fill(&WHITE).map_err(chart_error)?;

    let mut builder = ChartBuilder::on(root);
    builder.margin(40);
    if labelled {
        builder
            .caption(CHART_TITLE, (FONT, 64))
            .x_label_area_size(120)
            .y_label_area_size(320);
    }
    let mut chart = builder
        .build_cartesian_2d(x_min..x_max, (0..means.len()).into_segmented())
        .map_err(chart_error)?;

    if labelled {
        chart
            .configure_mesh()
            .disable_y_mesh()
            .x_desc(X_LABEL)
            .y_desc(Y_LABEL)
            .y_labels(means.len())
            .y_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => means
                    .get(*i)
                    .map(|m| m.group.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .label_style((FONT, 36))
            .axis_desc_style((FONT, 44))
            .draw()
            .map_err(chart_error)?;
    }

    chart
        .draw_series(means.iter().enumerate().map(|(i, m)| {
            let mut bar = Rectangle::new(
                [
                    (0.0, SegmentValue::Exact(i)),
                    (m.mean, SegmentValue::Exact(i + 1)),
                ],
                BAR_COLOR.filled(),
            );
            bar.set_margin(8, 8, 0, 0);
            bar
        }))
        .map_err(chart_error)?;
    Ok(())
}

/// Horizontal extent covering zero and every mean, with some headroom.
fn x_bounds(means: &[GroupMean]) -> (f64, f64) {
    let lo = means.iter().map(|m| m.mean).fold(0.0_f64, f64::min);
    let hi = means.iter().map(|m| m.mean).fold(0.0_f64, f64::max);
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    let x_min = if lo < 0.0 { lo - pad } else { 0.0 };
    (x_min, hi + pad)
}

fn chart_error<E: std::fmt::Display>(e: E) -> PipelineError {
    PipelineError::Chart(e.to_string())
}
