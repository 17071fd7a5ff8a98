//! SVG chart backend built on plotters.
//!
//! One SVG file per drawing surface under the configured chart directory.
//! Destroying a chart handle removes its file.

use std::path::PathBuf;

use plotters::element::Pie;
use plotters::prelude::*;

use crate::dashboard::render::{BoxedLoad, ChartBackend, ChartHandle, ChartSurface, RenderError};
use crate::services::series::{palette_color, ChartType, SeriesDescriptor};

const CHART_WIDTH: u32 = 800;
const CHART_HEIGHT: u32 = 500;

pub struct SvgChartBackend {
    chart_dir: PathBuf,
}

impl SvgChartBackend {
    pub fn new(chart_dir: impl Into<PathBuf>) -> Self {
        Self {
            chart_dir: chart_dir.into(),
        }
    }

    fn surface_path(&self, surface: &ChartSurface) -> PathBuf {
        self.chart_dir.join(format!("{}.svg", surface.0))
    }
}

pub struct SvgChart {
    path: PathBuf,
}

impl ChartHandle for SvgChart {
    fn destroy(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!(path = %self.path.display(), "Could not remove chart file: {}", e);
        }
    }
}

impl ChartBackend for SvgChartBackend {
    fn load(&self) -> BoxedLoad {
        let dir = self.chart_dir.clone();
        Box::pin(async move {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| RenderError::LoadFailed(format!("{}: {}", dir.display(), e)))
        })
    }

    fn render(
        &self,
        surface: &ChartSurface,
        descriptor: &SeriesDescriptor,
    ) -> Result<Box<dyn ChartHandle>, RenderError> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (CHART_WIDTH, CHART_HEIGHT))
                .into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            match descriptor.chart_type {
                ChartType::Pie => draw_pie(&root, descriptor)?,
                ChartType::Bar => draw_bars(&root, descriptor)?,
                ChartType::Line => draw_lines(&root, descriptor)?,
            }

            root.present().map_err(draw_err)?;
        }

        let path = self.surface_path(surface);
        std::fs::write(&path, svg)
            .map_err(|e| RenderError::DrawFailed(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), "Rendered chart");
        Ok(Box::new(SvgChart { path }))
    }
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::DrawFailed(e.to_string())
}

fn parse_hex(hex: &str) -> RGBColor {
    let bytes = hex.strip_prefix('#').unwrap_or(hex);
    if bytes.len() == 6 {
        if let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&bytes[0..2], 16),
            u8::from_str_radix(&bytes[2..4], 16),
            u8::from_str_radix(&bytes[4..6], 16),
        ) {
            return RGBColor(r, g, b);
        }
    }
    RGBColor(107, 114, 128)
}

/// Upper bound of the y axis: tallest stack for stacked bars, largest
/// single value otherwise. Never zero.
fn y_max(descriptor: &SeriesDescriptor) -> f64 {
    let max = if descriptor.stacked {
        (0..descriptor.labels.len())
            .map(|i| {
                descriptor
                    .series
                    .iter()
                    .map(|s| s.values.get(i).copied().unwrap_or(0.0))
                    .sum::<f64>()
            })
            .fold(0.0, f64::max)
    } else {
        descriptor
            .series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0, f64::max)
    };
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

fn draw_bars(
    root: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>,
    descriptor: &SeriesDescriptor,
) -> Result<(), RenderError> {
    let n = descriptor.labels.len();
    let labels = descriptor.labels.clone();

    let mut chart = ChartBuilder::on(root)
        .margin(12)
        .x_label_area_size(36)
        .y_label_area_size(56)
        .build_cartesian_2d(0f64..n as f64, 0f64..y_max(descriptor))
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&move |x| {
            let idx = x.floor() as usize;
            labels.get(idx).cloned().unwrap_or_default()
        })
        .label_style(("sans-serif", 13))
        .draw()
        .map_err(draw_err)?;

    if descriptor.stacked {
        let mut base = vec![0.0f64; n];
        for series in &descriptor.series {
            let color = parse_hex(&series.color);
            chart
                .draw_series((0..n).map(|i| {
                    let value = series.values.get(i).copied().unwrap_or(0.0);
                    let rect = Rectangle::new(
                        [
                            (i as f64 + 0.15, base[i]),
                            (i as f64 + 0.85, base[i] + value),
                        ],
                        color.filled(),
                    );
                    base[i] += value;
                    rect
                }))
                .map_err(draw_err)?
                .label(series.name.clone())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                });
        }
    } else {
        let groups = descriptor.series.len().max(1);
        let slot = 0.7 / groups as f64;
        for (s_idx, series) in descriptor.series.iter().enumerate() {
            let color = parse_hex(&series.color);
            chart
                .draw_series((0..n).map(|i| {
                    let value = series.values.get(i).copied().unwrap_or(0.0);
                    let left = i as f64 + 0.15 + s_idx as f64 * slot;
                    Rectangle::new([(left, 0.0), (left + slot, value)], color.filled())
                }))
                .map_err(draw_err)?
                .label(series.name.clone())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                });
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK.mix(0.4))
        .draw()
        .map_err(draw_err)?;

    Ok(())
}

fn draw_lines(
    root: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>,
    descriptor: &SeriesDescriptor,
) -> Result<(), RenderError> {
    let n = descriptor.labels.len();
    let labels = descriptor.labels.clone();

    let mut chart = ChartBuilder::on(root)
        .margin(12)
        .x_label_area_size(36)
        .y_label_area_size(56)
        .build_cartesian_2d(0f64..n as f64, 0f64..y_max(descriptor))
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_labels(n)
        .x_label_formatter(&move |x| {
            let idx = x.floor() as usize;
            labels.get(idx).cloned().unwrap_or_default()
        })
        .label_style(("sans-serif", 13))
        .draw()
        .map_err(draw_err)?;

    for series in &descriptor.series {
        let color = parse_hex(&series.color);
        chart
            .draw_series(LineSeries::new(
                series
                    .values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i as f64 + 0.5, *v)),
                color.stroke_width(2),
            ))
            .map_err(draw_err)?
            .label(series.name.clone())
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
            });
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK.mix(0.4))
        .draw()
        .map_err(draw_err)?;

    Ok(())
}

fn draw_pie(
    root: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>,
    descriptor: &SeriesDescriptor,
) -> Result<(), RenderError> {
    let sizes: Vec<f64> = descriptor
        .series
        .first()
        .map(|s| s.values.clone())
        .unwrap_or_default();
    // A zero total has no slice angles to distribute; leave the canvas
    // blank rather than hand plotters a NaN.
    if sizes.iter().sum::<f64>() <= 0.0 {
        return Ok(());
    }
    let colors: Vec<RGBColor> = (0..descriptor.labels.len())
        .map(|i| parse_hex(palette_color(i)))
        .collect();

    let center = (
        CHART_WIDTH as i32 / 2,
        CHART_HEIGHT as i32 / 2,
    );
    let radius = (CHART_HEIGHT as f64 / 2.0) - 40.0;

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &descriptor.labels);
    pie.label_style(("sans-serif", 14).into_font());
    root.draw(&pie).map_err(draw_err)?;

    Ok(())
}
