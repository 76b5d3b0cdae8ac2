use anyhow::{Context, Result};
use log::{info, warn};
use rayon::prelude::*;

use super::aggregate::summarize_checked;
use super::clean::{clean_rows, trim_checked, ColumnMap};
use super::error::PipelineError;
use super::model::{RawSeries, ResampledSeries, WorkloadSummary};
use super::resample::resample;
use crate::config::PipelineConfig;

// ---------------------------------------------------------------------------
// Per-workload pipeline
// ---------------------------------------------------------------------------

/// Output of the pipeline for one workload.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedWorkload {
    pub series: ResampledSeries,
    pub summary: WorkloadSummary,
    /// Rows that survived trimming but had an unparseable timestamp.
    pub dropped_rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkloadOutcome {
    Processed(ProcessedWorkload),
    Skipped(PipelineError),
}

impl WorkloadOutcome {
    pub fn processed(&self) -> Option<&ProcessedWorkload> {
        match self {
            WorkloadOutcome::Processed(p) => Some(p),
            WorkloadOutcome::Skipped(_) => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&PipelineError> {
        match self {
            WorkloadOutcome::Processed(_) => None,
            WorkloadOutcome::Skipped(reason) => Some(reason),
        }
    }
}

/// Trim → clean → resample → summarise one workload.
pub fn process_workload(
    raw: &RawSeries,
    config: &PipelineConfig,
) -> Result<ProcessedWorkload, PipelineError> {
    let columns = ColumnMap::resolve(raw)?;
    let rows = trim_checked(&raw.rows, config.trim_count)?;

    let cleaned = clean_rows(&columns, rows);
    if cleaned.samples.is_empty() {
        // every remaining row had a bad timestamp
        return Err(cleaned
            .first_error
            .unwrap_or(PipelineError::EmptySeriesSummary));
    }

    let series = resample(&cleaned.samples, config.bucket_width(), config.max_buckets)?;
    let summary = summarize_checked(&series)?;

    Ok(ProcessedWorkload {
        series,
        summary,
        dropped_rows: cleaned.dropped,
    })
}

// ---------------------------------------------------------------------------
// DatasetRegistry
// ---------------------------------------------------------------------------

/// Input for one workload: its table, or why it could not be read.
pub type WorkloadInput = (String, Result<RawSeries, PipelineError>);

/// Workload identifier → outcome, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    entries: Vec<(String, WorkloadOutcome)>,
}

impl DatasetRegistry {
    /// Run every workload through the pipeline. A failing workload is
    /// recorded as skipped and never stops the others.
    ///
    /// With `config.jobs != 1` the workloads are processed on a rayon pool;
    /// results are still inserted in input order.
    pub fn build(inputs: Vec<WorkloadInput>, config: &PipelineConfig) -> Result<Self> {
        let outcomes: Vec<(String, WorkloadOutcome)> = if config.jobs == 1 {
            inputs
                .into_iter()
                .map(|(id, raw)| run_one(id, raw, config))
                .collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.jobs)
                .build()
                .context("building worker pool")?;
            pool.install(|| {
                inputs
                    .into_par_iter()
                    .map(|(id, raw)| run_one(id, raw, config))
                    .collect()
            })
        };

        let mut registry = DatasetRegistry::default();
        for (id, outcome) in outcomes {
            registry.insert(id, outcome);
        }
        Ok(registry)
    }

    /// Convenience for already-loaded tables.
    pub fn from_series<I>(inputs: I, config: &PipelineConfig) -> Result<Self>
    where
        I: IntoIterator<Item = (String, RawSeries)>,
    {
        let inputs = inputs.into_iter().map(|(id, raw)| (id, Ok(raw))).collect();
        Self::build(inputs, config)
    }

    /// Last write wins; the replaced entry keeps its position.
    fn insert(&mut self, id: String, outcome: WorkloadOutcome) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == id) {
            warn!("workload '{id}' appears more than once; earlier result discarded");
            slot.1 = outcome;
        } else {
            self.entries.push((id, outcome));
        }
    }

    pub fn get(&self, id: &str) -> Option<&WorkloadOutcome> {
        self.entries.iter().find(|(k, _)| k == id).map(|(_, o)| o)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WorkloadOutcome)> {
        self.entries.iter().map(|(k, o)| (k.as_str(), o))
    }

    pub fn processed(&self) -> impl Iterator<Item = (&str, &ProcessedWorkload)> {
        self.iter().filter_map(|(k, o)| o.processed().map(|p| (k, p)))
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &PipelineError)> {
        self.iter().filter_map(|(k, o)| o.skip_reason().map(|r| (k, r)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn run_one(
    id: String,
    raw: Result<RawSeries, PipelineError>,
    config: &PipelineConfig,
) -> (String, WorkloadOutcome) {
    let outcome = match raw.and_then(|raw| {
        let rows_in = raw.len();
        process_workload(&raw, config).map(|p| (rows_in, p))
    }) {
        Ok((rows_in, processed)) => {
            info!(
                "{id}: {rows_in} rows -> {} buckets ({} dropped)",
                processed.series.len(),
                processed.dropped_rows
            );
            WorkloadOutcome::Processed(processed)
        }
        Err(reason) => {
            warn!("{id}: skipped ({}): {reason}", reason.kind());
            WorkloadOutcome::Skipped(reason)
        }
    };
    (id, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Field;

    fn header() -> Vec<String> {
        ["timestamp", "Interval", "Rate", "MB/sec", "Resp", "MB_read", "MB_write"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// `n` rows one second apart with rate = row index.
    fn series(n: usize) -> RawSeries {
        let rows = (0..n)
            .map(|i| {
                vec![
                    format!("04/18/2023-14:{:02}:{:02}-BST", i / 60, i % 60),
                    (i + 1).to_string(),
                    i.to_string(),
                    "2.0".into(),
                    "0.5".into(),
                    "1.0".into(),
                    "1.0".into(),
                ]
            })
            .collect();
        RawSeries::new(header(), rows)
    }

    fn config(trim_count: usize) -> PipelineConfig {
        PipelineConfig {
            trim_count,
            ..Default::default()
        }
    }

    #[test]
    fn short_workload_is_skipped_and_others_continue() {
        let inputs = vec![("short".to_string(), series(5)), ("long".to_string(), series(200))];
        let registry = DatasetRegistry::from_series(inputs, &config(60)).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(matches!(
            registry.get("short"),
            Some(WorkloadOutcome::Skipped(PipelineError::InsufficientSamples {
                available: 5,
                trim_count: 60
            }))
        ));
        let long = registry.get("long").and_then(|o| o.processed()).unwrap();
        // rows 60..140 → 80 seconds → 8 buckets of 10s
        assert_eq!(long.series.len(), 8);
        assert_eq!(long.summary.throughput.average, Some(2.0));
    }

    #[test]
    fn missing_column_skips_workload() {
        let mut raw = series(10);
        raw.columns[4] = "Latency".into();
        let registry =
            DatasetRegistry::from_series(vec![("w".to_string(), raw)], &config(0)).unwrap();
        assert_eq!(
            registry.get("w").and_then(|o| o.skip_reason()),
            Some(&PipelineError::UnknownField {
                column: "Resp".into()
            })
        );
    }

    #[test]
    fn all_bad_timestamps_skip_with_malformed_timestamp() {
        let mut raw = series(3);
        for row in &mut raw.rows {
            row[0] = "not a time".into();
        }
        let err = process_workload(&raw, &config(0)).unwrap_err();
        assert_eq!(err.kind(), "MalformedTimestamp");
    }

    #[test]
    fn load_failures_are_recorded_in_order() {
        let inputs = vec![
            ("a".to_string(), Err(PipelineError::Load("bad csv".into()))),
            ("b".to_string(), Ok(series(3))),
        ];
        let registry = DatasetRegistry::build(inputs, &config(0)).unwrap();
        let order: Vec<&str> = registry.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["a", "b"]);
        assert_eq!(registry.skipped().count(), 1);
        assert_eq!(registry.processed().count(), 1);
    }

    #[test]
    fn duplicate_identifier_last_wins_in_first_position() {
        let inputs = vec![
            ("dup".to_string(), series(5)),
            ("other".to_string(), series(3)),
            ("dup".to_string(), series(30)),
        ];
        let registry = DatasetRegistry::from_series(inputs, &config(1)).unwrap();
        let order: Vec<&str> = registry.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["dup", "other"]);
        // 28 rows after trim: seconds 1..=28 → 3 buckets
        let dup = registry.get("dup").and_then(|o| o.processed()).unwrap();
        assert_eq!(dup.series.len(), 3);
    }

    #[test]
    fn pool_matches_sequential() {
        let make = || {
            (0..6)
                .map(|i| (format!("w{i}"), series(20 + i * 15)))
                .collect::<Vec<_>>()
        };
        let sequential = DatasetRegistry::from_series(make(), &config(2)).unwrap();
        let pooled = DatasetRegistry::from_series(
            make(),
            &PipelineConfig {
                jobs: 3,
                ..config(2)
            },
        )
        .unwrap();

        let a: Vec<_> = sequential.iter().collect();
        let b: Vec<_> = pooled.iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn rate_summary_over_buckets() {
        // 11 rows, seconds 0..=10, one bucket [0,10) and one [10,20)
        let registry =
            DatasetRegistry::from_series(vec![("w".to_string(), series(11))], &config(0))
                .unwrap();
        let w = registry.get("w").and_then(|o| o.processed()).unwrap();
        let rates = w.series.values(Field::Rate);
        assert_eq!(rates, vec![4.5, 10.0]);
        assert_eq!(w.summary.rate.average, Some(7.25));
    }
}
