use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::data::aggregate::chart_rows;
use crate::data::model::WorkloadSummary;
use crate::data::registry::{DatasetRegistry, WorkloadOutcome};

// ---------------------------------------------------------------------------
// summary.csv
// ---------------------------------------------------------------------------

/// Column headers of `summary.csv`, in [`SummaryRow`] field order.
pub const SUMMARY_HEADER: [&str; 13] = [
    "workload_type",
    "Average_rate",
    "Average_resp",
    "Average_MB/sec",
    "Rate_50th",
    "Rate_95th",
    "Rate_98th",
    "Resp_50th",
    "Resp_95th",
    "Resp_98th",
    "MB_sec_50th",
    "MB_sec_95th",
    "MB_sec_98th",
];

/// One line of `summary.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow<'a> {
    pub workload_type: &'a str,
    pub average_rate: Option<f64>,
    pub average_resp: Option<f64>,
    pub average_mb_sec: Option<f64>,
    pub rate_50th: Option<f64>,
    pub rate_95th: Option<f64>,
    pub rate_98th: Option<f64>,
    pub resp_50th: Option<f64>,
    pub resp_95th: Option<f64>,
    pub resp_98th: Option<f64>,
    pub mb_sec_50th: Option<f64>,
    pub mb_sec_95th: Option<f64>,
    pub mb_sec_98th: Option<f64>,
}

impl<'a> SummaryRow<'a> {
    pub fn new(workload_type: &'a str, s: &WorkloadSummary) -> Self {
        SummaryRow {
            workload_type,
            average_rate: s.rate.average,
            average_resp: s.response.average,
            average_mb_sec: s.throughput.average,
            rate_50th: s.rate.p50,
            rate_95th: s.rate.p95,
            rate_98th: s.rate.p98,
            resp_50th: s.response.p50,
            resp_95th: s.response.p95,
            resp_98th: s.response.p98,
            mb_sec_50th: s.throughput.p50,
            mb_sec_95th: s.throughput.p95,
            mb_sec_98th: s.throughput.p98,
        }
    }
}

/// Write one row per workload, in registry order. Skipped workloads get
/// empty cells. The header is written even when the registry is empty.
pub fn write_summary(registry: &DatasetRegistry, path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(SUMMARY_HEADER).context("writing summary header")?;

    let absent = WorkloadSummary::absent();
    for (id, outcome) in registry.iter() {
        let summary = outcome.processed().map_or(&absent, |w| &w.summary);
        writer
            .serialize(SummaryRow::new(id, summary))
            .with_context(|| format!("writing summary row for {id}"))?;
    }
    writer.flush().context("flushing summary")?;
    info!("summary table saved to {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// run_report.csv
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReportRow<'a> {
    pub workload_type: &'a str,
    pub status: &'static str,
    pub reason: String,
}

pub fn run_report_rows(registry: &DatasetRegistry) -> Vec<RunReportRow<'_>> {
    registry
        .iter()
        .map(|(id, outcome)| match outcome {
            WorkloadOutcome::Processed(_) => RunReportRow {
                workload_type: id,
                status: "processed",
                reason: String::new(),
            },
            WorkloadOutcome::Skipped(err) => RunReportRow {
                workload_type: id,
                status: "skipped",
                reason: format!("{}: {err}", err.kind()),
            },
        })
        .collect()
}

pub fn write_run_report(registry: &DatasetRegistry, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in run_report_rows(registry) {
        writer.serialize(&row).context("writing run report row")?;
    }
    writer.flush().context("flushing run report")?;
    Ok(())
}

/// Human-readable listing of processed and skipped workloads.
pub fn render_run_report(registry: &DatasetRegistry) -> String {
    let processed = registry.processed().count();
    let skipped = registry.skipped().count();
    let mut out = format!("{processed} workload(s) processed, {skipped} skipped\n");
    for row in run_report_rows(registry) {
        if row.reason.is_empty() {
            out.push_str(&format!("  {:<10} {}\n", row.status, row.workload_type));
        } else {
            out.push_str(&format!(
                "  {:<10} {} ({})\n",
                row.status, row.workload_type, row.reason
            ));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Per-workload series export
// ---------------------------------------------------------------------------

/// Write `<dir>/<id>.csv` with the broadcast rows of every processed workload.
pub fn write_series(registry: &DatasetRegistry, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut written = Vec::new();
    for (id, workload) in registry.processed() {
        let path = dir.join(format!("{id}.csv"));
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("creating {}", path.display()))?;
        for row in chart_rows(&workload.series, &workload.summary) {
            writer.serialize(row).with_context(|| format!("writing {}", path.display()))?;
        }
        writer.flush()?;
        written.push(path);
    }
    Ok(written)
}
