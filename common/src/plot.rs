use std::{fs, io::Cursor, ops::Range, path::Path};

use image::{ImageError, ImageFormat, RgbImage};
use plotters::{prelude::*, series::DashedLineSeries};
use tracing::debug;

use crate::{
    error::ReportError,
    record::{BenchmarkSeries, read_series},
};

pub const CHART_SIZE: (u32, u32) = (1024, 768);
pub const CHART_TITLE: &str = "KV Store Throughput and Time Taken vs Data Size";
pub const X_AXIS_LABEL: &str = "Data Size (GB)";
pub const THROUGHPUT_AXIS_LABEL: &str = "Throughput (KB/s)";
pub const TIME_AXIS_LABEL: &str = "Time Taken (s)";

/// Fraction of the spanned interval added on each side of an axis.
const AXIS_MARGIN: f64 = 0.05;

/// The dual axis chart derived from one [`BenchmarkSeries`]: throughput over
/// data size on the left y axis, time taken on the right.
#[derive(Debug, Clone, PartialEq)]
pub struct ThroughputChart {
    pub throughput: Vec<(f64, f64)>,
    pub time_taken: Vec<(f64, f64)>,
}

impl ThroughputChart {
    pub fn from_series(series: &BenchmarkSeries) -> Self {
        Self {
            throughput: series.throughput_points(),
            time_taken: series.time_points(),
        }
    }

    /// Draws the chart into an RGB pixel buffer of [`CHART_SIZE`]. Both y
    /// axes scale to their own series; the x axis spans both.
    fn rasterize(&self) -> Result<Vec<u8>, ReportError> {
        let (width, height) = CHART_SIZE;
        let mut pixels = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut pixels, CHART_SIZE).into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;

            let x_range = padded_range(
                self.throughput
                    .iter()
                    .chain(self.time_taken.iter())
                    .map(|p| p.0),
            );
            let throughput_range = padded_range(self.throughput.iter().map(|p| p.1));
            let time_range = padded_range(self.time_taken.iter().map(|p| p.1));

            let mut chart = ChartBuilder::on(&root)
                .caption(CHART_TITLE, ("sans-serif", 20).into_font())
                .margin(20)
                .x_label_area_size(40)
                .y_label_area_size(60)
                .right_y_label_area_size(60)
                .build_cartesian_2d(x_range.clone(), throughput_range)
                .map_err(render_err)?
                .set_secondary_coord(x_range, time_range);

            chart
                .configure_mesh()
                .disable_mesh()
                .x_desc(X_AXIS_LABEL)
                .y_desc(THROUGHPUT_AXIS_LABEL)
                .axis_desc_style(("sans-serif", 16))
                .y_label_style(("sans-serif", 14).into_font().color(&BLUE))
                .draw()
                .map_err(render_err)?;
            chart
                .configure_secondary_axes()
                .y_desc(TIME_AXIS_LABEL)
                .axis_desc_style(("sans-serif", 16))
                .label_style(("sans-serif", 14).into_font().color(&RED))
                .draw()
                .map_err(render_err)?;

            chart
                .draw_series(LineSeries::new(
                    self.throughput.iter().copied(),
                    BLUE.stroke_width(2),
                ))
                .map_err(render_err)?;
            chart
                .draw_series(
                    self.throughput
                        .iter()
                        .map(|(x, y)| Circle::new((*x, *y), 4, BLUE.filled())),
                )
                .map_err(render_err)?;

            chart
                .draw_secondary_series(DashedLineSeries::new(
                    self.time_taken.iter().copied(),
                    8,
                    5,
                    RED.stroke_width(2),
                ))
                .map_err(render_err)?;
            chart
                .draw_secondary_series(
                    self.time_taken
                        .iter()
                        .map(|(x, y)| Cross::new((*x, *y), 6, RED.stroke_width(2))),
                )
                .map_err(render_err)?;

            root.present().map_err(render_err)?;
        }
        Ok(pixels)
    }

    /// Draws the chart and writes it to `output`. The raster format follows
    /// the output extension. Drawing and encoding happen fully in memory;
    /// the file is written in one shot once the encoded image is complete.
    pub fn render_to(&self, output: &Path) -> Result<(), ReportError> {
        let (width, height) = CHART_SIZE;
        let pixels = self.rasterize()?;
        let image = RgbImage::from_raw(width, height, pixels).ok_or_else(|| {
            ReportError::Render("pixel buffer does not match chart size".to_owned())
        })?;

        let format = ImageFormat::from_path(output).map_err(|source| write_err(output, source))?;
        let mut encoded = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut encoded), format)
            .map_err(|source| write_err(output, source))?;
        fs::write(output, &encoded)
            .map_err(|source| write_err(output, ImageError::IoError(source)))?;
        debug!("wrote {width}x{height} chart to {}", output.display());
        Ok(())
    }
}

fn render_err<E: std::error::Error>(err: E) -> ReportError {
    ReportError::Render(err.to_string())
}

fn write_err(output: &Path, source: ImageError) -> ReportError {
    ReportError::OutputWrite {
        path: output.to_path_buf(),
        source,
    }
}

/// Axis bounds for `values`, widened by [`AXIS_MARGIN`] on each side so no
/// marker sits on the plot border. Non finite values carry no usable bound
/// and are ignored; without any usable value the axis falls back to 0..1.
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for value in values.filter(|value| value.is_finite()) {
        min = min.min(value);
        max = max.max(value);
    }
    if min > max {
        return 0.0..1.0;
    }
    if min == max {
        return (min - 0.5)..(max + 0.5);
    }
    let pad = (max - min) * AXIS_MARGIN;
    (min - pad)..(max + pad)
}

/// Reads the benchmark CSV at `input` and writes its chart to `output`.
/// Parse and render failures happen before the output file is created, so a
/// failed run never leaves a chart behind.
pub fn generate_report(input: &Path, output: &Path) -> Result<(), ReportError> {
    let series = read_series(input)?;
    debug!(
        "plotting {} records from {} to {}",
        series.len(),
        input.display(),
        output.display()
    );
    ThroughputChart::from_series(&series).render_to(output)
}
