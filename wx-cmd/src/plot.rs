//! SVG line chart of actual against predicted values over the test window.

use anyhow::Context;
use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use std::path::Path;
use wx_utils::paths::ensure_parent_dir;

const SIZE: (u32, u32) = (1000, 400);

/// Consecutive present values as separate line segments, so a missing day
/// breaks the line instead of bridging it.
fn segments(dates: &[NaiveDate], values: &[Option<f64>]) -> Vec<Vec<(NaiveDate, f64)>> {
    let mut out: Vec<Vec<(NaiveDate, f64)>> = Vec::new();
    let mut current = Vec::new();
    for (date, value) in dates.iter().zip(values) {
        match value {
            Some(v) => current.push((*date, *v)),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Render the chart into an SVG document.
pub fn render_forecast_svg(
    title: &str,
    dates: &[NaiveDate],
    actual: &[Option<f64>],
    predicted: &[Option<f64>],
) -> anyhow::Result<String> {
    let (Some(&first), Some(&last)) = (dates.first(), dates.last()) else {
        anyhow::bail!("nothing to plot: no test dates");
    };
    let present: Vec<f64> = actual.iter().chain(predicted).flatten().copied().collect();
    if present.is_empty() {
        anyhow::bail!("nothing to plot: every value is missing");
    }
    let y_min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let y_max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let padding = ((y_max - y_min) * 0.05).max(1.0);
    let x_range: RangedDate<NaiveDate> = (first..last + Duration::days(1)).into();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 20))
            .margin(20i32)
            .x_label_area_size(30u32)
            .y_label_area_size(50u32)
            .build_cartesian_2d(x_range, (y_min - padding)..(y_max + padding))?;
        chart
            .configure_mesh()
            .x_labels(10_usize)
            .y_desc("tavg (°C)")
            .draw()?;

        for (label, values, color) in [("actual", actual, BLUE), ("pred", predicted, RED)] {
            for (i, segment) in segments(dates, values).into_iter().enumerate() {
                let series = chart.draw_series(LineSeries::new(segment, color))?;
                if i == 0 {
                    series
                        .label(label)
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
                }
            }
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        root.present()?;
    }
    Ok(svg)
}

pub fn write_forecast_plot(
    path: &Path,
    title: &str,
    dates: &[NaiveDate],
    actual: &[Option<f64>],
    predicted: &[Option<f64>],
) -> anyhow::Result<()> {
    let svg = render_forecast_svg(title, dates, actual, predicted)?;
    ensure_parent_dir(path)?;
    std::fs::write(path, svg).with_context(|| format!("writing plot to {}", path.display()))?;
    Ok(())
}
