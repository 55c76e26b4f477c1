//! Histogram image generation.

use crate::config::ImageFormat;
use crate::error::{ReportError, Result};
use crate::histogram::Histogram;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::register_font;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const IMAGE_SIZE: (u32, u32) = (800, 600);

/// Text drawn around a histogram
#[derive(Debug, Clone)]
pub struct PlotLabels {
    pub title: String,
    pub subtitle: String,
    pub x_desc: String,
}

/// Sans-serif face for titles and axis labels, bundled so rendering does not
/// depend on fonts installed on the host
static SANS_SERIF: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

static FONT_REGISTERED: OnceLock<bool> = OnceLock::new();

fn register_fonts() -> Result<()> {
    let ok = *FONT_REGISTERED
        .get_or_init(|| register_font("sans-serif", FontStyle::Normal, SANS_SERIF).is_ok());
    if ok {
        Ok(())
    } else {
        Err(ReportError::Render {
            path: PathBuf::from("assets/DejaVuSans.ttf"),
            reason: "bundled font could not be parsed".to_string(),
        })
    }
}

/// Render `hist` to `path` in the requested format
pub fn render_histogram(
    hist: &Histogram,
    labels: &PlotLabels,
    path: &Path,
    format: ImageFormat,
) -> Result<()> {
    register_fonts()?;

    match format {
        ImageFormat::Png => {
            let root = BitMapBackend::new(path, IMAGE_SIZE).into_drawing_area();
            draw_histogram(&root, hist, labels).map_err(|e| render_error(path, e))?;
            root.present().map_err(|e| write_error(path, e))
        }
        ImageFormat::Svg => {
            let root = SVGBackend::new(path, IMAGE_SIZE).into_drawing_area();
            draw_histogram(&root, hist, labels).map_err(|e| render_error(path, e))?;
            root.present().map_err(|e| write_error(path, e))
        }
    }
}

fn render_error(path: &Path, e: impl std::fmt::Display) -> ReportError {
    ReportError::Render {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

fn write_error(path: &Path, e: impl std::fmt::Display) -> ReportError {
    ReportError::OutputWrite {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

fn draw_histogram<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    hist: &Histogram,
    labels: &PlotLabels,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    // Two-line title
    let area = root.titled(&labels.title, ("sans-serif", 22.0))?;
    let area = area.titled(&labels.subtitle, ("sans-serif", 16.0))?;

    let y_max = (f64::from(hist.max_count()) * 1.05).max(1.0);

    let mut chart = ChartBuilder::on(&area)
        .margin(5)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(hist.lower..hist.upper, 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(labels.x_desc.as_str())
        .y_desc("count")
        .draw()?;

    draw_bars(&mut chart, hist)
}

fn draw_bars<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    hist: &Histogram,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    chart.draw_series(hist.bins().map(|(range, count)| {
        Rectangle::new(
            [(range.start, 0.0), (range.end, f64::from(count))],
            BLUE.mix(0.8).filled(),
        )
    }))?;
    Ok(())
}
