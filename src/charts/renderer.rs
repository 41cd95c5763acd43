//! Static Chart Renderer
//! Renders a 3D scatter of the loan file to PNG, one color per cluster.
//!
//! Layout:
//! 1. Title: "Loan Clusters: Term vs Balance vs Rate"
//! 2. 3D axes over the raw term, balance and rate values
//! 3. Points colored by cluster, legend in the upper right corner

use crate::data::LoanRecord;
use image::{ImageFormat, RgbImage};
use log::{info, warn};
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

pub const TITLE: &str = "Loan Clusters: Term vs Balance vs Rate";

/// Matplotlib's tab10 palette.
pub const TAB10: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Drawing(String),
    #[error("Pixel buffer does not match {0}x{1}")]
    Buffer(u32, u32),
    #[error("PNG encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn drawing_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Drawing(e.to_string())
}

/// Whether plotters can resolve a font for text.
fn fonts_available() -> bool {
    ("sans-serif", 12).into_font().box_size("Ag").is_ok()
}

pub fn cluster_color(cluster: i64) -> RGBColor {
    TAB10[cluster.rem_euclid(TAB10.len() as i64) as usize]
}

/// Group (term, balance, rate) points by cluster id; missing clusters count as 0.
pub fn points_by_cluster(records: &[LoanRecord]) -> BTreeMap<i64, Vec<(f64, f64, f64)>> {
    let mut groups: BTreeMap<i64, Vec<(f64, f64, f64)>> = BTreeMap::new();
    for r in records {
        groups
            .entry(r.cluster.unwrap_or(0))
            .or_default()
            .push((r.term_or_age_months, r.balance, r.rate));
    }
    groups
}

/// Axis range covering `values`, padded so single values still get an axis.
pub fn axis_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if min == max {
        return (min - 1.0)..(max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}

pub struct StaticPlotRenderer;

impl StaticPlotRenderer {
    /// Render the cluster scatter into PNG bytes.
    pub fn render_cluster_scatter_to_bytes(
        records: &[LoanRecord],
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        Self::draw_cluster_scatter(&mut buffer, records, width, height)?;

        let img = RgbImage::from_raw(width, height, buffer)
            .ok_or(RenderError::Buffer(width, height))?;
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Render the cluster scatter and write it to `path`.
    pub fn render_cluster_scatter_png(
        records: &[LoanRecord],
        path: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let bytes = Self::render_cluster_scatter_to_bytes(records, width, height)?;
        std::fs::write(path, bytes)?;
        info!("Wrote {}x{} cluster plot to {}", width, height, path.display());
        Ok(())
    }

    fn draw_cluster_scatter(
        buffer: &mut [u8],
        records: &[LoanRecord],
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let root = BitMapBackend::with_buffer(buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing_err)?;

        let x_range = axis_range(records.iter().map(|r| r.term_or_age_months));
        let y_range = axis_range(records.iter().map(|r| r.balance));
        let z_range = axis_range(records.iter().map(|r| r.rate));
        let label_anchor_x = (x_range.end, y_range.start, z_range.start);
        let label_anchor_y = (x_range.start, y_range.end, z_range.start);
        let label_anchor_z = (x_range.start, y_range.start, z_range.end);

        let with_text = fonts_available();
        if !with_text {
            warn!("No usable font found, rendering plot without text");
        }

        let mut builder = ChartBuilder::on(&root);
        builder.margin(20);
        if with_text {
            builder.caption(TITLE, ("sans-serif", 26).into_font());
        }
        let mut chart = builder
            .build_cartesian_3d(x_range, y_range, z_range)
            .map_err(drawing_err)?;

        chart.with_projection(|mut pb| {
            pb.yaw = 0.6;
            pb.pitch = 0.35;
            pb.scale = 0.8;
            pb.into_matrix()
        });

        if with_text {
            chart
                .configure_axes()
                .light_grid_style(BLACK.mix(0.1))
                .max_light_lines(4)
                .draw()
                .map_err(drawing_err)?;
        }

        for (cluster, points) in points_by_cluster(records) {
            let color = cluster_color(cluster);
            chart
                .draw_series(
                    points
                        .into_iter()
                        .map(|p| Circle::new(p, 3, color.mix(0.6).filled())),
                )
                .map_err(drawing_err)?
                .label(format!("Cluster {}", cluster))
                .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.filled()));
        }

        if with_text {
            let axis_font = ("sans-serif", 16).into_font().color(&BLACK);
            chart
                .draw_series([
                    Text::new("Term (Months)", label_anchor_x, axis_font.clone()),
                    Text::new("Balance ($)", label_anchor_y, axis_font.clone()),
                    Text::new("Rate (%)", label_anchor_z, axis_font),
                ])
                .map_err(drawing_err)?;
        }

        if with_text && !records.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(drawing_err)?;
        }

        root.present().map_err(drawing_err)?;
        Ok(())
    }
}
