use thiserror::Error;

/// Why a row was dropped or a workload was skipped.
///
/// Row-level errors (`MalformedTimestamp`) are recovered inside cleaning.
/// Everything else is contained to the workload that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("malformed timestamp '{value}'")]
    MalformedTimestamp { value: String },

    #[error("{available} samples cannot survive trimming {trim_count} from each end")]
    InsufficientSamples { available: usize, trim_count: usize },

    #[error("no rows left to summarise")]
    EmptySeriesSummary,

    #[error("required column '{column}' is missing")]
    UnknownField { column: String },

    #[error("time span needs {buckets} buckets, limit is {limit}")]
    SpanTooLarge { buckets: u64, limit: usize },

    #[error("input could not be loaded: {0}")]
    Load(String),
}

impl PipelineError {
    /// Stable name of the error class, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::MalformedTimestamp { .. } => "MalformedTimestamp",
            PipelineError::InsufficientSamples { .. } => "InsufficientSamples",
            PipelineError::EmptySeriesSummary => "EmptySeriesSummary",
            PipelineError::UnknownField { .. } => "UnknownField",
            PipelineError::SpanTooLarge { .. } => "SpanTooLarge",
            PipelineError::Load(_) => "Load",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_details() {
        let err = PipelineError::InsufficientSamples {
            available: 5,
            trim_count: 60,
        };
        assert_eq!(err.kind(), "InsufficientSamples");
        assert!(err.to_string().contains("5 samples"));
    }
}
