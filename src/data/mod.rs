/// Data layer: core types, loading, and the cleaning pipeline.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read file → RawSeries (text cells)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  clean    │  trim k rows each end, parse timestamps, coerce numbers
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ resample  │  fixed-width buckets, mean per bucket, fill gaps
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ aggregate │  mean + p50/p95/p98 → WorkloadSummary
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ registry  │  workload id → processed series or skip reason
///   └──────────┘
/// ```

pub mod aggregate;
pub mod clean;
pub mod error;
pub mod loader;
pub mod model;
pub mod registry;
pub mod resample;
pub mod timestamp;
