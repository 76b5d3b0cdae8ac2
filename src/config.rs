use std::path::Path;

use anyhow::{Context, Result};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Knobs of the cleaning / resampling pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Samples dropped from each end of every workload.
    pub trim_count: usize,
    /// Resample bucket width in seconds.
    pub bucket_width_secs: u64,
    /// Upper bound on buckets per workload.
    pub max_buckets: usize,
    /// Worker threads across workloads. 1 runs inline, 0 uses every CPU.
    pub jobs: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            trim_count: 60,
            bucket_width_secs: 10,
            max_buckets: 1_000_000,
            jobs: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("bucket_width_secs must be greater than zero")]
    ZeroBucketWidth,
    #[error("bucket_width_secs {0} is too large")]
    BucketWidthTooLarge(u64),
    #[error("max_buckets must be greater than zero")]
    ZeroMaxBuckets,
}

impl PipelineConfig {
    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_width_secs == 0 {
            return Err(ConfigError::ZeroBucketWidth);
        }
        // TimeDelta::try_seconds bound
        if self.bucket_width_secs > (i64::MAX / 1_000) as u64 {
            return Err(ConfigError::BucketWidthTooLarge(self.bucket_width_secs));
        }
        if self.max_buckets == 0 {
            return Err(ConfigError::ZeroMaxBuckets);
        }
        Ok(())
    }

    /// Bucket width as a duration. Call [`validate`](Self::validate) first.
    pub fn bucket_width(&self) -> TimeDelta {
        i64::try_from(self.bucket_width_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }
}
