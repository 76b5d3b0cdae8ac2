use chrono::NaiveDateTime;
use serde::Serialize;

use super::error::PipelineError;
use super::model::{Field, FieldSummary, ResampledSeries, WorkloadSummary};

// ---------------------------------------------------------------------------
// Scalar statistics
// ---------------------------------------------------------------------------

/// Round half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Percentile of ascending `sorted` data, `p` in `[0, 1]`.
///
/// Rank is `p * (n - 1)`; the value is interpolated linearly between the
/// order statistics on either side of it.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = p.clamp(0.0, 1.0) * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Mean and 50th/95th/98th percentiles of one set of values.
pub fn summarise_values(values: &[f64]) -> FieldSummary {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    FieldSummary {
        average: mean(&sorted).map(round2),
        p50: percentile(&sorted, 0.50),
        p95: percentile(&sorted, 0.95),
        p98: percentile(&sorted, 0.98),
    }
}

// ---------------------------------------------------------------------------
// Workload summary
// ---------------------------------------------------------------------------

/// Summarise rate, throughput and response time over every non-missing
/// bucket value. Zero rows is an error.
pub fn summarize_checked(series: &ResampledSeries) -> Result<WorkloadSummary, PipelineError> {
    if series.is_empty() {
        return Err(PipelineError::EmptySeriesSummary);
    }
    let mut summary = WorkloadSummary::absent();
    for field in Field::SUMMARISED {
        if let Some(slot) = summary.field_mut(field) {
            *slot = summarise_values(&series.values(field));
        }
    }
    Ok(summary)
}

/// Like [`summarize_checked`], with every value absent for an empty series.
pub fn summarize(series: &ResampledSeries) -> WorkloadSummary {
    summarize_checked(series).unwrap_or_else(|_| WorkloadSummary::absent())
}

// ---------------------------------------------------------------------------
// Broadcast view
// ---------------------------------------------------------------------------

/// A resampled row with the workload averages attached, as consumed by the
/// charts and the series export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartRow {
    pub timestamp: NaiveDateTime,
    #[serde(rename = "Interval")]
    pub interval: Option<f64>,
    #[serde(rename = "Rate")]
    pub rate: Option<f64>,
    #[serde(rename = "Average_Rate")]
    pub average_rate: Option<f64>,
    #[serde(rename = "MB/sec")]
    pub mb_sec: Option<f64>,
    #[serde(rename = "Average_MB/sec")]
    pub average_mb_sec: Option<f64>,
    #[serde(rename = "Resp")]
    pub resp: Option<f64>,
    #[serde(rename = "Average_Resp")]
    pub average_resp: Option<f64>,
    #[serde(rename = "MB_read")]
    pub mb_read: Option<f64>,
    #[serde(rename = "MB_write")]
    pub mb_write: Option<f64>,
}

impl ChartRow {
    pub fn value(&self, field: Field) -> Option<f64> {
        match field {
            Field::Rate => self.rate,
            Field::Throughput => self.mb_sec,
            Field::Response => self.resp,
            Field::Interval => self.interval,
            Field::MbRead => self.mb_read,
            Field::MbWrite => self.mb_write,
        }
    }

    pub fn average(&self, field: Field) -> Option<f64> {
        match field {
            Field::Rate => self.average_rate,
            Field::Throughput => self.average_mb_sec,
            Field::Response => self.average_resp,
            _ => None,
        }
    }
}

/// Attach the per-workload averages to every row of `series`.
pub fn chart_rows(series: &ResampledSeries, summary: &WorkloadSummary) -> Vec<ChartRow> {
    series
        .rows
        .iter()
        .map(|row| ChartRow {
            timestamp: row.timestamp,
            interval: row.values[Field::Interval],
            rate: row.values[Field::Rate],
            average_rate: summary.average(Field::Rate),
            mb_sec: row.values[Field::Throughput],
            average_mb_sec: summary.average(Field::Throughput),
            resp: row.values[Field::Response],
            average_resp: summary.average(Field::Response),
            mb_read: row.values[Field::MbRead],
            mb_write: row.values[Field::MbWrite],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{FieldValues, ResampledRow};
    use chrono::{NaiveDate, TimeDelta};

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    fn series_of(rates: &[f64]) -> ResampledSeries {
        let t0 = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let width = TimeDelta::seconds(10);
        let rows = rates
            .iter()
            .enumerate()
            .map(|(i, &r)| {
                let mut values = FieldValues::default();
                values[Field::Rate] = Some(r);
                ResampledRow {
                    timestamp: t0 + width * i as i32,
                    values,
                }
            })
            .collect();
        ResampledSeries { width, rows }
    }

    #[test]
    fn percentiles_interpolate_between_ranks() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(close(percentile(&data, 0.50), 3.0));
        assert!(close(percentile(&data, 0.95), 4.8));
        assert!(close(percentile(&data, 0.98), 4.92));
        assert!(close(percentile(&data, 0.0), 1.0));
        assert!(close(percentile(&data, 1.0), 5.0));
    }

    #[test]
    fn percentile_of_nothing_is_none() {
        assert_eq!(percentile(&[], 0.5), None);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn median_of_median_is_exact() {
        let data = [1.0, 7.0, 9.0];
        let median = percentile(&data, 0.5).unwrap();
        assert_eq!(percentile(&[median], 0.5), Some(median));
        assert_eq!(percentile(&[median, median, median], 0.5), Some(median));
    }

    #[test]
    fn constant_series_summarises_to_constant() {
        let v = 12.5;
        let t0 = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let width = TimeDelta::seconds(10);
        let rows = (0..7)
            .map(|i| ResampledRow {
                timestamp: t0 + width * i,
                values: FieldValues::splat(v),
            })
            .collect();
        let summary = summarize(&ResampledSeries { width, rows });

        for field in Field::SUMMARISED {
            let s = summary.field(field).unwrap();
            assert_eq!(s.average, Some(v));
            assert_eq!(s.p50, Some(v));
            assert_eq!(s.p95, Some(v));
            assert_eq!(s.p98, Some(v));
        }
    }

    #[test]
    fn average_is_rounded_and_broadcast() {
        let series = series_of(&[1.0, 1.0, 2.0]);
        let summary = summarize(&series);
        assert_eq!(summary.rate.average, Some(1.33));

        let rows = chart_rows(&series, &summary);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.average_rate == Some(1.33)));
        assert_eq!(rows[2].rate, Some(2.0));
        // nothing observed for throughput
        assert!(rows.iter().all(|r| r.average_mb_sec.is_none()));
    }

    #[test]
    fn single_bucket_scenario() {
        let series = series_of(&[20.0]);
        let summary = summarize(&series);
        assert_eq!(summary.rate.average, Some(20.0));
        let rows = chart_rows(&series, &summary);
        assert_eq!(rows[0].average(Field::Rate), Some(20.0));
    }

    #[test]
    fn missing_values_are_skipped() {
        let mut series = series_of(&[4.0, 8.0]);
        series.rows[1].values[Field::Rate] = None;
        let summary = summarize(&series);
        assert_eq!(summary.rate.average, Some(4.0));
        assert_eq!(summary.rate.p98, Some(4.0));
    }

    #[test]
    fn empty_series_has_absent_summary() {
        let empty = ResampledSeries::empty(TimeDelta::seconds(10));
        assert_eq!(
            summarize_checked(&empty),
            Err(PipelineError::EmptySeriesSummary)
        );
        assert_eq!(summarize(&empty), WorkloadSummary::absent());
        assert!(chart_rows(&empty, &WorkloadSummary::absent()).is_empty());
    }

    #[test]
    fn unsorted_input_is_sorted_before_ranking() {
        let s = summarise_values(&[5.0, 1.0, 4.0, 2.0, 3.0]);
        assert_eq!(s.p50, Some(3.0));
        assert_eq!(s.average, Some(3.0));
    }
}
