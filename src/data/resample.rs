use chrono::TimeDelta;
use log::debug;

use super::error::PipelineError;
use super::model::{CleanSample, Field, ResampledRow, ResampledSeries};

/// Bucket `samples` onto a grid of `width` starting at the earliest
/// timestamp, averaging each field per bucket and interpolating empty ones.
///
/// Grid arithmetic is done in whole milliseconds; widths below one
/// millisecond are treated as one millisecond.
pub fn resample(
    samples: &[CleanSample],
    width: TimeDelta,
    max_buckets: usize,
) -> Result<ResampledSeries, PipelineError> {
    let width_ms = width.num_milliseconds().max(1);
    let width = TimeDelta::milliseconds(width_ms);

    let (Some(first), Some(last)) = (
        samples.iter().map(|s| s.timestamp).min(),
        samples.iter().map(|s| s.timestamp).max(),
    ) else {
        return Ok(ResampledSeries::empty(width));
    };

    let span_ms = (last - first).num_milliseconds();
    let buckets = (span_ms / width_ms) as u64 + 1;
    if buckets > max_buckets as u64 {
        return Err(PipelineError::SpanTooLarge {
            buckets,
            limit: max_buckets,
        });
    }
    let buckets = buckets as usize;

    let bucket_of: Vec<usize> = samples
        .iter()
        .map(|s| ((s.timestamp - first).num_milliseconds() / width_ms) as usize)
        .collect();

    let mut rows: Vec<ResampledRow> = (0..buckets)
        .map(|i| ResampledRow {
            timestamp: first + TimeDelta::milliseconds(width_ms * i as i64),
            values: Default::default(),
        })
        .collect();

    for field in Field::ALL {
        let mut sum = vec![0.0; buckets];
        let mut count = vec![0u32; buckets];
        for (sample, &bucket) in samples.iter().zip(&bucket_of) {
            if let Some(v) = sample.values[field] {
                sum[bucket] += v;
                count[bucket] += 1;
            }
        }

        let mut column: Vec<Option<f64>> = sum
            .iter()
            .zip(&count)
            .map(|(&s, &c)| (c > 0).then(|| s / c as f64))
            .collect();
        let filled = interpolate_gaps(&mut column);
        if filled > 0 {
            debug!("{field}: filled {filled} of {buckets} buckets");
        }

        for (row, value) in rows.iter_mut().zip(column) {
            row.values[field] = value;
        }
    }

    Ok(ResampledSeries { width, rows })
}

/// Fill `None` entries in place: linear between known neighbours, flat
/// from the nearest known value at either edge. A column with no known
/// value is left untouched. Returns how many entries were filled.
pub fn interpolate_gaps(column: &mut [Option<f64>]) -> usize {
    let known: Vec<usize> = column
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|_| i))
        .collect();
    let (Some(&head), Some(&tail)) = (known.first(), known.last()) else {
        return 0;
    };

    let mut filled = 0;
    let mut fill = |slot: &mut Option<f64>, value: f64| {
        *slot = Some(value);
        filled += 1;
    };

    let head_value = column[head].unwrap_or_default();
    for slot in &mut column[..head] {
        fill(slot, head_value);
    }
    let tail_value = column[tail].unwrap_or_default();
    for slot in &mut column[tail + 1..] {
        fill(slot, tail_value);
    }

    for pair in known.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if b - a < 2 {
            continue;
        }
        let (va, vb) = (column[a].unwrap_or_default(), column[b].unwrap_or_default());
        let steps = (b - a) as f64;
        for i in a + 1..b {
            let frac = (i - a) as f64 / steps;
            fill(&mut column[i], va + (vb - va) * frac);
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::FieldValues;
    use chrono::{NaiveDate, NaiveDateTime};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 4, 18)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap()
    }

    fn sample(offset_ms: i64, rate: f64) -> CleanSample {
        let mut values = FieldValues::default();
        values[Field::Rate] = Some(rate);
        CleanSample {
            timestamp: t0() + TimeDelta::milliseconds(offset_ms),
            values,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_input_gives_empty_series() {
        let out = resample(&[], TimeDelta::seconds(10), 100).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.width, TimeDelta::seconds(10));
    }

    #[test]
    fn single_timestamp_gives_one_bucket() {
        let out = resample(&[sample(0, 7.0)], TimeDelta::seconds(10), 100).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.rows[0].timestamp, t0());
        assert_eq!(out.rows[0].values[Field::Rate], Some(7.0));
    }

    #[test]
    fn one_bucket_averages_all_samples() {
        let samples = [sample(0, 10.0), sample(1_000, 20.0), sample(2_000, 30.0)];
        let out = resample(&samples, TimeDelta::seconds(10), 100).unwrap();
        assert_eq!(out.len(), 1);
        assert!(close(out.rows[0].values[Field::Rate].unwrap(), 20.0));
    }

    #[test]
    fn grid_is_contiguous_and_spaced_by_width() {
        let samples = [sample(0, 1.0), sample(3_700, 2.0), sample(95_200, 3.0)];
        let width = TimeDelta::seconds(10);
        let out = resample(&samples, width, 100).unwrap();

        assert_eq!(out.len(), 10);
        assert_eq!(out.rows[0].timestamp, t0());
        for pair in out.rows.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, width);
        }
        let last = out.rows.last().unwrap().timestamp;
        let last_sample = t0() + TimeDelta::milliseconds(95_200);
        assert!(last <= last_sample && last_sample < last + width);
    }

    #[test]
    fn empty_buckets_are_interpolated_linearly() {
        // buckets 0 and 3 populated, 1 and 2 empty
        let samples = [sample(0, 10.0), sample(30_000, 40.0)];
        let out = resample(&samples, TimeDelta::seconds(10), 100).unwrap();
        let rates = out.values(Field::Rate);
        assert_eq!(rates.len(), 4);
        assert!(close(rates[1], 20.0));
        assert!(close(rates[2], 30.0));
    }

    #[test]
    fn fields_interpolate_independently() {
        let mut a = sample(0, 1.0);
        a.values[Field::Response] = Some(5.0);
        let b = sample(10_000, 3.0);
        let mut c = sample(20_000, 5.0);
        c.values[Field::Response] = Some(9.0);

        let out = resample(&[a, b, c], TimeDelta::seconds(10), 100).unwrap();
        assert_eq!(out.rows[1].values[Field::Rate], Some(3.0));
        assert!(close(out.rows[1].values[Field::Response].unwrap(), 7.0));
        // never observed
        assert!(out.rows.iter().all(|r| r.values[Field::MbRead].is_none()));
    }

    #[test]
    fn mean_preserved_without_interpolation() {
        let rates = [3.0, 8.0, 1.5, 9.25, 4.0];
        let samples: Vec<CleanSample> = rates
            .iter()
            .enumerate()
            .map(|(i, &r)| sample(i as i64 * 10_000 + 250, r))
            .collect();
        let out = resample(&samples, TimeDelta::seconds(10), 100).unwrap();

        let direct = rates.iter().sum::<f64>() / rates.len() as f64;
        let bucketed = out.values(Field::Rate);
        let resampled = bucketed.iter().sum::<f64>() / bucketed.len() as f64;
        assert!(close(direct, resampled));
    }

    #[test]
    fn out_of_order_samples_still_start_at_earliest() {
        let samples = [sample(20_000, 3.0), sample(0, 1.0)];
        let out = resample(&samples, TimeDelta::seconds(10), 100).unwrap();
        assert_eq!(out.rows[0].timestamp, t0());
        assert_eq!(out.values(Field::Rate), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn oversized_span_is_rejected() {
        let samples = [sample(0, 1.0), sample(1_000_000, 2.0)];
        let err = resample(&samples, TimeDelta::seconds(1), 100).unwrap_err();
        assert_eq!(
            err,
            PipelineError::SpanTooLarge {
                buckets: 1001,
                limit: 100
            }
        );
    }

    #[test]
    fn edges_extrapolate_flat() {
        let mut column = vec![None, None, Some(4.0), None, Some(8.0), None];
        let filled = interpolate_gaps(&mut column);
        assert_eq!(filled, 4);
        assert_eq!(
            column,
            vec![Some(4.0), Some(4.0), Some(4.0), Some(6.0), Some(8.0), Some(8.0)]
        );
    }

    #[test]
    fn all_missing_column_untouched() {
        let mut column = vec![None; 3];
        assert_eq!(interpolate_gaps(&mut column), 0);
        assert_eq!(column, vec![None; 3]);
    }
}
