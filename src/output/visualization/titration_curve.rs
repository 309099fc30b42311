//! Titration curve charts
//!
//! Draws a sampled [`TitrationCurve`] with:
//! - the theoretical pX curve
//! - a shaded tolerance band around the equivalence volume
//! - a solid equivalence line and a marker at the equivalence point
//! - a dashed line at the student's reading, annotated with the signed volume
//!   error and the percent error
//!
//! # Usage
//!
//! ```rust,ignore
//! use titra_rs::output::visualization::{plot_titration_curve, render_curve, ImageFormat};
//!
//! let curve = model.curve(practice, &request, &CurveConfig::default())?;
//!
//! // In memory (HTTP response body)
//! let svg = render_curve(&curve, Some(6.55), ImageFormat::Svg, None)?;
//!
//! // To a file, backend chosen by extension
//! plot_titration_curve(&curve, Some(6.55), "hardness.png", None)?;
//! ```

use std::error::Error;

use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;

use super::config::PlotConfig;
use crate::chemistry::TitrationCurve;
use crate::error::{LabError, Result};

/// Dash and gap length of the reading line, as a fraction of the y span
const DASH_FRACTION: f64 = 0.025;

/// Height of the error annotation, as a fraction of the y span
const ANNOTATION_HEIGHT: f64 = 0.87;

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Vector, `image/svg+xml`
    Svg,
    /// Raster, `image/png`
    Png,
}

impl ImageFormat {
    /// Format for a file extension, PNG unless the extension is `svg`
    pub fn from_extension(ext: &str) -> Self {
        if ext.eq_ignore_ascii_case("svg") {
            Self::Svg
        } else {
            Self::Png
        }
    }

    /// Format for an output path
    pub fn from_path(path: &str) -> Self {
        std::path::Path::new(path)
            .extension()
            .and_then(|s| s.to_str())
            .map_or(Self::Png, Self::from_extension)
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
        }
    }
}

// =================================================================================================
// Public API
// =================================================================================================

/// Render a titration curve to image bytes
///
/// # Arguments
///
/// * `curve`: Sampled curve
/// * `recorded_volume`: Student reading; `None` omits the reading line
/// * `format`: SVG or PNG
/// * `config`: Optional plot configuration; `None` uses defaults
///
/// # Errors
///
/// `Render` when the curve is empty, the configuration is invalid, or the
/// backend or PNG encoder fails.
pub fn render_curve(
    curve: &TitrationCurve,
    recorded_volume: Option<f64>,
    format: ImageFormat,
    config: Option<&PlotConfig>,
) -> Result<Vec<u8>> {
    let default_config = PlotConfig::default();
    let config = config.unwrap_or(&default_config);
    check_inputs(curve, config)?;
    let size = (config.width, config.height);

    match format {
        ImageFormat::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
                draw_curve(root, curve, recorded_volume, config).map_err(render_error)?;
            }
            Ok(svg.into_bytes())
        }
        ImageFormat::Png => {
            let mut pixels = vec![0u8; (config.width as usize) * (config.height as usize) * 3];
            {
                let root = BitMapBackend::with_buffer(&mut pixels, size).into_drawing_area();
                draw_curve(root, curve, recorded_volume, config).map_err(render_error)?;
            }
            let mut png = Vec::new();
            image::codecs::png::PngEncoder::new(&mut png)
                .write_image(&pixels, config.width, config.height, image::ColorType::Rgb8)
                .map_err(|e| LabError::Render(format!("PNG encoding failed: {e}")))?;
            Ok(png)
        }
    }
}

/// Plot a titration curve to a file (`.svg` → vector, anything else → PNG)
///
/// # Example
///
/// ```rust,ignore
/// plot_titration_curve(&curve, session.recorded_volume, "volhard.svg", None)?;
/// ```
pub fn plot_titration_curve(
    curve: &TitrationCurve,
    recorded_volume: Option<f64>,
    output_path: &str,
    config: Option<&PlotConfig>,
) -> Result<()> {
    let default_config = PlotConfig::default();
    let config = config.unwrap_or(&default_config);
    check_inputs(curve, config)?;
    let size = (config.width, config.height);

    log::debug!("Plotting {} curve to {output_path}", curve.family);

    match ImageFormat::from_path(output_path) {
        ImageFormat::Svg => {
            let root = SVGBackend::new(output_path, size).into_drawing_area();
            draw_curve(root, curve, recorded_volume, config).map_err(render_error)
        }
        ImageFormat::Png => {
            let root = BitMapBackend::new(output_path, size).into_drawing_area();
            draw_curve(root, curve, recorded_volume, config).map_err(render_error)
        }
    }
}

// =================================================================================================
// Rendering
// =================================================================================================

fn check_inputs(curve: &TitrationCurve, config: &PlotConfig) -> Result<()> {
    if curve.is_empty() {
        return Err(LabError::Render("cannot plot an empty curve".to_string()));
    }
    config.validate().map_err(LabError::Render)
}

fn render_error(e: Box<dyn Error>) -> LabError {
    LabError::Render(e.to_string())
}

/// Draw every layer of the chart onto a drawing area
fn draw_curve<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    curve: &TitrationCurve,
    recorded_volume: Option<f64>,
    config: &PlotConfig,
) -> std::result::Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    root.fill(&config.background)?;

    let (x_min, x_max) = curve.volume_range;
    let (y_min, y_max) = curve.px_range;
    let title = if config.title.is_empty() { &curve.title } else { &config.title };
    let xlabel = if config.xlabel.is_empty() {
        format!("V {} (mL)", curve.titrant_label)
    } else {
        config.xlabel.clone()
    };
    let ylabel = if config.ylabel.is_empty() {
        format!("p[{}]", curve.species_label)
    } else {
        config.ylabel.clone()
    };

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24).into_font())
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    let x_format = |x: &f64| format!("{:.1}", x);
    let y_format = |y: &f64| format!("{:.0}", y);
    let mut mesh = chart.configure_mesh();
    mesh.x_desc(xlabel)
        .y_desc(ylabel)
        .x_label_formatter(&x_format)
        .y_label_formatter(&y_format);
    if !config.show_grid {
        mesh.disable_mesh();
    }
    mesh.draw()?;

    let veq = curve.equivalence_volume;
    let eq_color = config.equivalence_color;
    let line = |color: &RGBColor| ShapeStyle::from(color).stroke_width(config.line_width);

    // ── tolerance band ──
    let band_fill = eq_color.mix(config.band_opacity);
    chart
        .draw_series(std::iter::once(Rectangle::new(
            [
                ((veq - curve.tolerance).max(x_min), y_min),
                ((veq + curve.tolerance).min(x_max), y_max),
            ],
            band_fill.filled(),
        )))?
        .label(format!("Tolerance ±{} mL", curve.tolerance))
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], band_fill.filled()));

    // ── theoretical curve ──
    let curve_color = config.curve_color;
    chart
        .draw_series(LineSeries::new(curve.points(), line(&curve_color)))?
        .label("Theoretical curve")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], curve_color));

    // ── equivalence line and marker ──
    chart
        .draw_series(LineSeries::new(vec![(veq, y_min), (veq, y_max)], line(&eq_color)))?
        .label(format!("Equivalence point {veq:.2} mL"))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], eq_color));

    chart.draw_series(std::iter::once(Circle::new(
        (veq, curve.equivalence_px.clamp(y_min, y_max)),
        6,
        eq_color.filled(),
    )))?;

    // ── student reading ──
    if let Some(recorded) = recorded_volume {
        let reading_color = config.reading_color;

        // dashes drawn as separate segments, portable across plotters releases
        let dash = (y_max - y_min) * DASH_FRACTION;
        let mut dashes = Vec::new();
        let mut y = y_min;
        while y < y_max {
            dashes.push(PathElement::new(
                vec![(recorded, y), (recorded, (y + dash).min(y_max))],
                line(&reading_color),
            ));
            y += 2.0 * dash;
        }
        chart
            .draw_series(dashes)?
            .label(format!("Student reading {recorded:.2} mL"))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], reading_color));

        let deviation = curve.deviation(recorded);
        let text_x = (recorded + veq * 0.06).min(x_max);
        let text_y = y_min + (y_max - y_min) * ANNOTATION_HEIGHT;
        chart.draw_series(std::iter::once(Text::new(
            deviation.label(),
            (text_x, text_y),
            ("sans-serif", 15).into_font().color(&reading_color),
        )))?;
    }

    if config.show_legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&config.background.mix(0.9))
            .border_style(&BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================
