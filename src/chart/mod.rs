//! PNG line charts of resampled workload series.
//!
//! ```text
//!   Chart ── title, axis descriptions, note
//!     │  └── Line (label, points, colour, dashed, axis)
//!     ▼  x over every line, y per axis
//!   plotters ChartBuilder ── BitMapBackend ──▶ .png
//! ```

pub mod workload;

use std::fmt;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontStyle;

use crate::color;

pub const WIDTH: u32 = 2000;
pub const HEIGHT: u32 = 800;

const FONT: &str = "sans-serif";
const DASH_SIZE: i32 = 12;
const DASH_GAP: i32 = 8;

fn plot_err(err: impl fmt::Display) -> anyhow::Error {
    anyhow!("{err}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Left,
    Right,
}

/// One plotted series. `None` points leave a gap.
#[derive(Clone)]
pub struct Line {
    pub label: String,
    pub points: Vec<Option<(f64, f64)>>,
    pub color: RGBColor,
    pub dashed: bool,
    pub axis: Axis,
}

impl Line {
    pub fn new(label: impl Into<String>, points: Vec<Option<(f64, f64)>>) -> Self {
        Line {
            label: label.into(),
            points,
            color: color::PRIMARY,
            dashed: false,
            axis: Axis::Left,
        }
    }

    pub fn color(mut self, color: RGBColor) -> Self {
        self.color = color;
        self
    }

    pub fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }

    pub fn right_axis(mut self) -> Self {
        self.axis = Axis::Right;
        self
    }

    fn known(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().flatten().copied()
    }

    /// Maximal stretches of consecutive known points.
    fn runs(&self) -> Vec<Vec<(f64, f64)>> {
        self.points
            .split(|p| p.is_none())
            .filter(|run| !run.is_empty())
            .map(|run| run.iter().flatten().copied().collect())
            .collect()
    }
}

/// Inclusive value range, widened when degenerate.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Range {
    min: f64,
    max: f64,
}

impl Range {
    const UNIT: Range = Range { min: 0.0, max: 1.0 };

    fn of(values: impl Iterator<Item = f64>) -> Option<Range> {
        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        if max - min < f64::EPSILON {
            let pad = if min.abs() < f64::EPSILON { 1.0 } else { min.abs() * 0.1 };
            return Some(Range {
                min: min - pad,
                max: max + pad,
            });
        }
        Some(Range { min, max })
    }

    /// Add 5% head-room above and below.
    fn padded(self) -> Range {
        let pad = (self.max - self.min) * 0.05;
        Range {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    fn span(self) -> std::ops::Range<f64> {
        self.min..self.max
    }
}

/// A titled line chart with an optional second y axis and a text note.
#[derive(Clone, Default)]
pub struct Chart {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub right_desc: Option<String>,
    pub note: Option<String>,
    pub lines: Vec<Line>,
}

impl Chart {
    pub fn new(title: impl Into<String>) -> Self {
        Chart {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn x_desc(mut self, desc: impl Into<String>) -> Self {
        self.x_desc = desc.into();
        self
    }

    pub fn y_desc(mut self, desc: impl Into<String>) -> Self {
        self.y_desc = desc.into();
        self
    }

    pub fn right_desc(mut self, desc: impl Into<String>) -> Self {
        self.right_desc = Some(desc.into());
        self
    }

    /// Bold text drawn in the upper left of the plot.
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn line(mut self, line: Line) -> Self {
        self.lines.push(line);
        self
    }

    /// True when no line has a single known point.
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.known().next().is_none())
    }

    fn y_range(&self, axis: Axis) -> Range {
        Range::of(
            self.lines
                .iter()
                .filter(|l| l.axis == axis)
                .flat_map(|l| l.known().map(|(_, y)| y)),
        )
        .map_or(Range::UNIT, Range::padded)
    }

    /// Draw onto any plotters drawing area.
    pub fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        root.fill(&WHITE).map_err(plot_err)?;

        let x = Range::of(self.lines.iter().flat_map(|l| l.known().map(|(x, _)| x)))
            .unwrap_or(Range::UNIT);
        let (left, right) = (self.y_range(Axis::Left), self.y_range(Axis::Right));

        let mut builder = ChartBuilder::on(root);
        builder
            .caption(&self.title, (FONT, 32))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90);
        if self.right_desc.is_some() {
            builder.right_y_label_area_size(90);
        }
        let mut chart = builder
            .build_cartesian_2d(x.span(), left.span())
            .map_err(plot_err)?
            .set_secondary_coord(x.span(), right.span());

        chart
            .configure_mesh()
            .x_desc(self.x_desc.as_str())
            .y_desc(self.y_desc.as_str())
            .axis_desc_style((FONT, 20))
            .draw()
            .map_err(plot_err)?;
        if let Some(desc) = &self.right_desc {
            chart
                .configure_secondary_axes()
                .y_desc(desc.as_str())
                .axis_desc_style((FONT, 20))
                .draw()
                .map_err(plot_err)?;
        }

        for line in &self.lines {
            let style = line.color.stroke_width(2);
            for (i, run) in line.runs().into_iter().enumerate() {
                let anno = match (line.axis, line.dashed) {
                    (Axis::Left, false) => chart.draw_series(LineSeries::new(run, style)),
                    (Axis::Left, true) => {
                        chart.draw_series(DashedLineSeries::new(run, DASH_SIZE, DASH_GAP, style))
                    }
                    (Axis::Right, false) => {
                        chart.draw_secondary_series(LineSeries::new(run, style))
                    }
                    (Axis::Right, true) => chart.draw_secondary_series(DashedLineSeries::new(
                        run, DASH_SIZE, DASH_GAP, style,
                    )),
                }
                .map_err(plot_err)?;
                // one legend entry per line, not per run
                if i == 0 && !line.label.is_empty() {
                    anno.label(line.label.as_str()).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 24, y)], style)
                    });
                }
            }
        }

        if self.lines.iter().any(|l| !l.label.is_empty() && l.known().next().is_some()) {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .label_font((FONT, 18))
                .background_style(WHITE.mix(0.85))
                .border_style(BLACK)
                .draw()
                .map_err(plot_err)?;
        }

        if let Some(note) = &self.note {
            let (w, h) = root.dim_in_pixel();
            let style = (FONT, 22)
                .into_font()
                .style(FontStyle::Bold)
                .color(&color::SECONDARY);
            let at = ((w as f64 * 0.3) as i32, (h as f64 * 0.2) as i32);
            root.draw(&Text::new(note.as_str(), at, style))
                .map_err(plot_err)?;
        }
        Ok(())
    }

    /// Render to a `WIDTH` × `HEIGHT` PNG, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        self.draw(&root)
            .with_context(|| format!("drawing chart {}", path.display()))?;
        root.present()
            .map_err(plot_err)
            .with_context(|| format!("saving chart {}", path.display()))
    }
}
