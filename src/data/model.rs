use std::fmt;
use std::ops::{Index, IndexMut};

use chrono::{NaiveDateTime, TimeDelta};

// ---------------------------------------------------------------------------
// Field – the measurement columns the pipeline understands
// ---------------------------------------------------------------------------

/// Name of the column holding the sample timestamp.
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// A numeric measurement column of a workload log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Operations per second.
    Rate,
    /// Throughput in MB/sec.
    Throughput,
    /// Response time in milliseconds.
    Response,
    /// Reporting interval index.
    Interval,
    /// Read throughput in MB/sec.
    MbRead,
    /// Write throughput in MB/sec.
    MbWrite,
}

impl Field {
    pub const COUNT: usize = 6;

    /// Every field, in column order.
    pub const ALL: [Field; Field::COUNT] = [
        Field::Rate,
        Field::Throughput,
        Field::Response,
        Field::Interval,
        Field::MbRead,
        Field::MbWrite,
    ];

    /// Fields that get a mean and percentiles in the workload summary.
    pub const SUMMARISED: [Field; 3] = [Field::Rate, Field::Throughput, Field::Response];

    /// Column header used in input logs.
    pub fn column(self) -> &'static str {
        match self {
            Field::Rate => "Rate",
            Field::Throughput => "MB/sec",
            Field::Response => "Resp",
            Field::Interval => "Interval",
            Field::MbRead => "MB_read",
            Field::MbWrite => "MB_write",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// FieldValues – one optional number per field
// ---------------------------------------------------------------------------

/// Per-field values where `None` marks a missing measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FieldValues([Option<f64>; Field::COUNT]);

impl FieldValues {
    /// The same value for every field.
    pub fn splat(value: f64) -> Self {
        FieldValues([Some(value); Field::COUNT])
    }
}

impl Index<Field> for FieldValues {
    type Output = Option<f64>;

    fn index(&self, field: Field) -> &Option<f64> {
        &self.0[field.index()]
    }
}

impl IndexMut<Field> for FieldValues {
    fn index_mut(&mut self, field: Field) -> &mut Option<f64> {
        &mut self.0[field.index()]
    }
}

// ---------------------------------------------------------------------------
// RawSeries – one workload log as read from disk
// ---------------------------------------------------------------------------

/// An uninterpreted table: column names plus text cells, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSeries {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawSeries {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        RawSeries { columns, rows }
    }

    /// Number of samples (rows).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.trim() == name)
    }
}

/// One row of a [`RawSeries`] with the known columns picked out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample<'a> {
    pub timestamp: &'a str,
    pub cells: [&'a str; Field::COUNT],
}

impl<'a> RawSample<'a> {
    pub fn cell(&self, field: Field) -> &'a str {
        self.cells[field.index()]
    }
}

// ---------------------------------------------------------------------------
// CleanSample – parsed timestamp and coerced numbers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanSample {
    pub timestamp: NaiveDateTime,
    pub values: FieldValues,
}

// ---------------------------------------------------------------------------
// ResampledSeries – uniform time grid
// ---------------------------------------------------------------------------

/// One bucket of the regular grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampledRow {
    /// Bucket start.
    pub timestamp: NaiveDateTime,
    pub values: FieldValues,
}

/// Buckets spaced exactly `width` apart, in chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledSeries {
    pub width: TimeDelta,
    pub rows: Vec<ResampledRow>,
}

impl ResampledSeries {
    pub fn empty(width: TimeDelta) -> Self {
        ResampledSeries {
            width,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Non-missing values of one field, in bucket order.
    pub fn values(&self, field: Field) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.values[field]).collect()
    }
}

// ---------------------------------------------------------------------------
// WorkloadSummary – per-workload scalars
// ---------------------------------------------------------------------------

/// Mean and interpolated percentiles of one field. `None` means "no value".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FieldSummary {
    /// Arithmetic mean rounded to two decimals.
    pub average: Option<f64>,
    pub p50: Option<f64>,
    pub p95: Option<f64>,
    pub p98: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorkloadSummary {
    pub rate: FieldSummary,
    pub throughput: FieldSummary,
    pub response: FieldSummary,
}

impl WorkloadSummary {
    /// Every summary value absent.
    pub fn absent() -> Self {
        WorkloadSummary::default()
    }

    pub fn field(&self, field: Field) -> Option<&FieldSummary> {
        match field {
            Field::Rate => Some(&self.rate),
            Field::Throughput => Some(&self.throughput),
            Field::Response => Some(&self.response),
            _ => None,
        }
    }

    pub fn field_mut(&mut self, field: Field) -> Option<&mut FieldSummary> {
        match field {
            Field::Rate => Some(&mut self.rate),
            Field::Throughput => Some(&mut self.throughput),
            Field::Response => Some(&mut self.response),
            _ => None,
        }
    }

    /// Shorthand for the broadcast average of a summarised field.
    pub fn average(&self, field: Field) -> Option<f64> {
        self.field(field).and_then(|s| s.average)
    }
}
