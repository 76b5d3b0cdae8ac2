use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{error, info};

use super::{Chart, Line};
use crate::color::{self, generate_palette, lighten};
use crate::data::aggregate::{chart_rows, ChartRow};
use crate::data::model::Field;
use crate::data::registry::DatasetRegistry;

// ---------------------------------------------------------------------------
// X axes
// ---------------------------------------------------------------------------

/// `Interval` column, falling back to the bucket index where it is missing.
fn interval_axis(rows: &[ChartRow]) -> Vec<f64> {
    rows.iter()
        .enumerate()
        .map(|(i, r)| r.interval.unwrap_or(i as f64))
        .collect()
}

/// Seconds since the first bucket.
fn time_axis(rows: &[ChartRow]) -> Vec<f64> {
    let Some(first) = rows.first().map(|r| r.timestamp) else {
        return Vec::new();
    };
    rows.iter()
        .map(|r| (r.timestamp - first).num_milliseconds() as f64 / 1000.0)
        .collect()
}

fn points(xs: &[f64], ys: impl Iterator<Item = Option<f64>>) -> Vec<Option<(f64, f64)>> {
    xs.iter().zip(ys).map(|(&x, y)| y.map(|y| (x, y))).collect()
}

fn field_points(xs: &[f64], rows: &[ChartRow], field: Field) -> Vec<Option<(f64, f64)>> {
    points(xs, rows.iter().map(|r| r.value(field)))
}

/// Axis description for a field.
fn axis_desc(field: Field) -> &'static str {
    match field {
        Field::Rate => "IOPS",
        Field::Throughput => "Throughput (MB/sec)",
        Field::Response => "Latency(ms)",
        Field::Interval => "Interval",
        Field::MbRead => "MB_read",
        Field::MbWrite => "MB_write",
    }
}

/// Legend entry for a field.
fn series_name(field: Field) -> &'static str {
    match field {
        Field::Rate => "IOPS",
        Field::Throughput => "Throughput",
        Field::Response => "Latency",
        Field::Interval => "Interval",
        Field::MbRead => "Throughput(MB_read)",
        Field::MbWrite => "Throughput(MB_write)",
    }
}

// ---------------------------------------------------------------------------
// Per-workload charts
// ---------------------------------------------------------------------------

/// A field against `Interval` with its dashed workload average.
fn field_with_average(id: &str, rows: &[ChartRow], field: Field) -> Chart {
    let xs = interval_axis(rows);
    let name = series_name(field);
    let mut chart = Chart::new(format!("{id} - {name}"))
        .x_desc("Interval")
        .y_desc(axis_desc(field))
        .line(Line::new(name, field_points(&xs, rows, field)).color(color::PRIMARY))
        .line(
            Line::new(
                format!("Average {name}"),
                points(&xs, rows.iter().map(|r| r.average(field))),
            )
            .color(color::SECONDARY)
            .dashed(),
        );
    if let Some(average) = rows.iter().find_map(|r| r.average(field)) {
        chart = chart.note(format!("Average {}: {average:.2}", field.column()));
    }
    chart
}

/// Two fields against time, each on its own y axis.
fn dual_axis(id: &str, title: &str, rows: &[ChartRow], left: Field, right: Field) -> Chart {
    let xs = time_axis(rows);
    Chart::new(format!("{id} - {title}"))
        .x_desc("Time (s)")
        .y_desc(axis_desc(left))
        .right_desc(axis_desc(right))
        .line(Line::new(series_name(left), field_points(&xs, rows, left)).color(color::PRIMARY))
        .line(
            Line::new(series_name(right), field_points(&xs, rows, right))
                .color(color::SECONDARY)
                .right_axis(),
        )
}

/// Sub-directory, file suffix and chart for every per-workload plot.
pub fn workload_charts(
    id: &str,
    rows: &[ChartRow],
) -> Vec<(&'static str, &'static str, Chart)> {
    vec![
        ("IOPS", "IOPS", field_with_average(id, rows, Field::Rate)),
        ("Throughput", "Throughput", field_with_average(id, rows, Field::Throughput)),
        ("Latency", "Latency", field_with_average(id, rows, Field::Response)),
        (
            "Throughput_RW",
            "Throughput_RW",
            dual_axis(id, "Throughput (Read/Write)", rows, Field::MbRead, Field::MbWrite),
        ),
        (
            "Latency_MB",
            "Throughput_Latency",
            dual_axis(id, "Throughput/Latency", rows, Field::Throughput, Field::Response),
        ),
        (
            "Latency_IOPS",
            "IOPS_Latency",
            dual_axis(id, "IOPS/Latency", rows, Field::Rate, Field::Response),
        ),
    ]
}

// ---------------------------------------------------------------------------
// Cross-workload charts
// ---------------------------------------------------------------------------

/// One line per workload (two for read/write), distinct colour each.
pub fn overview_charts(
    workloads: &[(&str, Vec<ChartRow>)],
) -> Vec<(&'static str, &'static str, Chart)> {
    let palette = generate_palette(workloads.len());
    let overlay = |title: &str, field: Field| {
        let base = Chart::new(title).x_desc("Interval").y_desc(axis_desc(field));
        workloads
            .iter()
            .zip(&palette)
            .fold(base, |chart, ((id, rows), &rgb)| {
                let xs = interval_axis(rows);
                chart.line(Line::new(*id, field_points(&xs, rows, field)).color(rgb))
            })
    };
    let read_write = workloads.iter().zip(&palette).fold(
        Chart::new("Throughput (Read/Write)")
            .x_desc("Interval")
            .y_desc("MB/sec"),
        |chart, ((id, rows), &rgb)| {
            let xs = interval_axis(rows);
            let read = field_points(&xs, rows, Field::MbRead);
            chart
                .line(Line::new(format!("{id}_read"), read).color(rgb))
                .line(
                    Line::new(format!("{id}_write"), field_points(&xs, rows, Field::MbWrite))
                        .color(lighten(rgb))
                        .dashed(),
                )
        },
    );

    vec![
        ("plot_all_IOPS", "all_rate", overlay("IOPS", Field::Rate)),
        ("plot_all_Throughput", "Throughput", overlay("Throughput", Field::Throughput)),
        ("plot_all_Latency", "Latency", overlay("Latency", Field::Response)),
        ("plot_all_Throughput_RW", "Throughput_RW", read_write),
    ]
}

// ---------------------------------------------------------------------------
// Rendering to disk
// ---------------------------------------------------------------------------

fn save_logged(chart: &Chart, path: PathBuf, written: &mut Vec<PathBuf>) {
    if chart.is_blank() {
        info!("nothing to plot for {}", path.display());
        return;
    }
    match chart.save(&path) {
        Ok(()) => {
            info!("saved chart {}", path.display());
            written.push(path);
        }
        Err(err) => error!("chart {} failed: {err:#}", path.display()),
    }
}

/// Render every chart for every processed workload under `out_dir`.
/// `stamp` prefixes the cross-workload file names. Individual chart
/// failures are logged and skipped.
pub fn render_all(
    registry: &DatasetRegistry,
    out_dir: &Path,
    stamp: &str,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)?;

    let workloads: Vec<(&str, Vec<ChartRow>)> = registry
        .processed()
        .map(|(id, w)| (id, chart_rows(&w.series, &w.summary)))
        .collect();

    let mut written = Vec::new();
    for (dir, suffix, chart) in overview_charts(&workloads) {
        let path = out_dir.join(dir).join(format!("{stamp}_{suffix}.png"));
        save_logged(&chart, path, &mut written);
    }
    for (id, rows) in &workloads {
        for (dir, suffix, chart) in workload_charts(id, rows) {
            let path = out_dir.join(dir).join(format!("{id}_{suffix}.png"));
            save_logged(&chart, path, &mut written);
        }
    }
    Ok(written)
}
