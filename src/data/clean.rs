use log::debug;

use super::error::PipelineError;
use super::model::{CleanSample, Field, FieldValues, RawSample, RawSeries, TIMESTAMP_COLUMN};
use super::timestamp::parse_timestamp;

// ---------------------------------------------------------------------------
// Trimmer
// ---------------------------------------------------------------------------

/// Drop `k` samples from each end. Fails when fewer than `2k + 1` remain.
pub fn trim_checked<T>(samples: &[T], k: usize) -> Result<&[T], PipelineError> {
    let n = samples.len();
    if n <= k.saturating_mul(2) {
        return Err(PipelineError::InsufficientSamples {
            available: n,
            trim_count: k,
        });
    }
    Ok(&samples[k..n - k])
}

/// Like [`trim_checked`] but yields an empty slice for short input.
pub fn trim<T>(samples: &[T], k: usize) -> &[T] {
    trim_checked(samples, k).unwrap_or(&[])
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

/// Positions of the required columns inside a [`RawSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    timestamp: usize,
    fields: [usize; Field::COUNT],
}

impl ColumnMap {
    /// Locate every required column, or name the first one that is missing.
    pub fn resolve(raw: &RawSeries) -> Result<Self, PipelineError> {
        let find = |name: &str| {
            raw.column_index(name)
                .ok_or_else(|| PipelineError::UnknownField {
                    column: name.to_string(),
                })
        };

        let timestamp = find(TIMESTAMP_COLUMN)?;
        let mut fields = [0; Field::COUNT];
        for (slot, field) in fields.iter_mut().zip(Field::ALL) {
            *slot = find(field.column())?;
        }
        Ok(ColumnMap { timestamp, fields })
    }

    /// View a row through the map. Short rows read as empty cells.
    pub fn sample<'a>(&self, row: &'a [String]) -> RawSample<'a> {
        let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");
        RawSample {
            timestamp: cell(self.timestamp),
            cells: self.fields.map(cell),
        }
    }
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

/// Result of cleaning the trimmed rows of one workload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cleaned {
    pub samples: Vec<CleanSample>,
    /// Rows dropped for an unparseable timestamp.
    pub dropped: usize,
    /// The first of those, kept for reporting.
    pub first_error: Option<PipelineError>,
}

/// Numeric coercion: blank, non-numeric and non-finite text is missing.
pub fn parse_value(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse one raw sample.
pub fn clean_sample(sample: &RawSample<'_>) -> Result<CleanSample, PipelineError> {
    let timestamp = parse_timestamp(sample.timestamp)?;
    let mut values = FieldValues::default();
    for field in Field::ALL {
        values[field] = parse_value(sample.cell(field));
    }
    Ok(CleanSample { timestamp, values })
}

/// Clean a run of rows, dropping those whose timestamp does not parse.
pub fn clean_rows(columns: &ColumnMap, rows: &[Vec<String>]) -> Cleaned {
    let mut cleaned = Cleaned {
        samples: Vec::with_capacity(rows.len()),
        ..Cleaned::default()
    };

    for (row_no, row) in rows.iter().enumerate() {
        match clean_sample(&columns.sample(row)) {
            Ok(sample) => cleaned.samples.push(sample),
            Err(err) => {
                debug!("dropping row {row_no}: {err}");
                cleaned.dropped += 1;
                cleaned.first_error.get_or_insert(err);
            }
        }
    }
    cleaned
}
