use history_analysis::analysis::{Analysis, AnalyzedBar};
use log::debug;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::error::Error;
use std::fmt;
use std::path::Path;

const PRICE_COLOR: RGBColor = RGBColor(31, 119, 180);
const SMA_COLOR: RGBColor = RED;
const VOLUME_COLOR: RGBColor = RGBColor(127, 127, 127);
const VOLUME_OPACITY: f64 = 0.3;
// volume bars fill at most the lower quarter of the plot
const VOLUME_HEADROOM: f64 = 4.0;
const BAR_HALF_WIDTH: f64 = 0.4;
const X_LABELS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            width: 1400,
            height: 700,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    #[cfg(feature = "png")]
    Png,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<OutputFormat, RenderError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "svg" => Ok(OutputFormat::Svg),
            #[cfg(feature = "png")]
            "png" => Ok(OutputFormat::Png),
            _ => Err(RenderError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Writes the price/SMA and volume chart for `analysis` to `path`.
///
/// The file format follows the extension: `.svg`, or `.png` with the `png`
/// feature. Nothing is written for an empty analysis. Without any SMA values
/// only price and volume are drawn.
pub fn render_chart(
    analysis: &Analysis,
    symbol: &str,
    path: &Path,
    options: &RenderOptions,
) -> Result<(), RenderError> {
    if analysis.is_empty() {
        return Err(RenderError::NoData);
    }

    let format = OutputFormat::from_path(path)?;
    let size = (options.width, options.height);

    debug!(
        "render_chart | path: {} | format: {:?} | rows: {} | sma: {}",
        path.display(),
        format,
        analysis.len(),
        analysis.has_sma()
    );

    match format {
        OutputFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw(root, analysis, symbol)
        }
        #[cfg(feature = "png")]
        OutputFormat::Png => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw(root, analysis, symbol)
        }
    }
}

fn draw<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    analysis: &Analysis,
    symbol: &str,
) -> Result<(), RenderError> {
    root.fill(&WHITE).map_err(draw_err)?;

    let rows = analysis.rows();
    let (y_min, y_max) = price_axis(rows);

    let max_volume = rows
        .iter()
        .map(|row| row.bar.volume)
        .max()
        .unwrap_or(0)
        .max(1) as f64;

    // x is the row index so that non-trading days leave no gaps
    let x_range = -0.5..(rows.len() as f64 - 0.5);

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!(
                "Historical Price and Volume Analysis for {} (Last {} Days)",
                symbol,
                rows.len()
            ),
            ("sans-serif", 24.0).into_font(),
        )
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .right_y_label_area_size(90)
        .build_cartesian_2d(x_range.clone(), y_min..y_max)
        .map_err(draw_err)?
        .set_secondary_coord(x_range, 0.0..max_volume * VOLUME_HEADROOM);

    let dates: Vec<String> = rows
        .iter()
        .map(|row| row.bar.trade_date.format("%Y-%m-%d").to_string())
        .collect();
    let date_label = |x: &f64| date_at(&dates, *x);

    chart
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(BLACK.mix(0.1))
        .x_labels(X_LABELS)
        .x_label_formatter(&date_label)
        .y_label_formatter(&|y: &f64| format!("{:.2}", y))
        .x_desc("Date")
        .y_desc("Closing Price ($)")
        .draw()
        .map_err(draw_err)?;

    chart
        .configure_secondary_axes()
        .y_label_formatter(&|v: &f64| format!("{:.0}", v))
        .y_desc("Trading Volume")
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_secondary_series(rows.iter().enumerate().map(|(i, row)| {
            let x = i as f64;
            Rectangle::new(
                [
                    (x - BAR_HALF_WIDTH, 0.0),
                    (x + BAR_HALF_WIDTH, row.bar.volume as f64),
                ],
                VOLUME_COLOR.mix(VOLUME_OPACITY).filled(),
            )
        }))
        .map_err(draw_err)?;

    chart
        .draw_series(LineSeries::new(
            rows.iter()
                .enumerate()
                .map(|(i, row)| (i as f64, row.bar.close)),
            PRICE_COLOR.stroke_width(2),
        ))
        .map_err(draw_err)?
        .label("Closing Price")
        .legend(|(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], PRICE_COLOR.stroke_width(2))
        });

    if analysis.has_sma() {
        let sma_points: Vec<(f64, f64)> = rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| row.sma.map(|sma| (i as f64, sma)))
            .collect();

        chart
            .draw_series(DashedLineSeries::new(sma_points, 10, 6, SMA_COLOR.stroke_width(2)))
            .map_err(draw_err)?
            .label(format!("{}-day SMA", analysis.sma_period()))
            .legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], SMA_COLOR.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

fn price_bounds(rows: &[AnalyzedBar]) -> (f64, f64) {
    rows.iter()
        .flat_map(|row| std::iter::once(row.bar.close).chain(row.sma))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), price| {
            (lo.min(price), hi.max(price))
        })
}

/// Price axis range with 10% padding. A flat series gets at least one price
/// unit either side so the axis does not collapse.
fn price_axis(rows: &[AnalyzedBar]) -> (f64, f64) {
    let (min_price, max_price) = price_bounds(rows);
    let range = max_price - min_price;
    let padding = if range > 0.0 {
        range * 0.1
    } else {
        (max_price.abs() * 0.01).max(1.0)
    };
    ((min_price - padding).max(0.0), max_price + padding)
}

// labels only sit on whole indices
fn date_at(dates: &[String], x: f64) -> String {
    let index = x.round();
    if index < 0.0 || (x - index).abs() > 1e-6 {
        return String::new();
    }
    dates.get(index as usize).cloned().unwrap_or_default()
}

fn draw_err<E: Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> RenderError {
    RenderError::Draw(err.to_string())
}

#[derive(Debug)]
pub enum RenderError {
    NoData,
    UnsupportedFormat(String),
    Draw(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RenderError::NoData => write!(f, "No data to render"),
            RenderError::UnsupportedFormat(path) => {
                write!(f, "Unsupported chart format for {}", path)
            }
            RenderError::Draw(e) => write!(f, "Drawing error: {}", e),
        }
    }
}

impl Error for RenderError {}
