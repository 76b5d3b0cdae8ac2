use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::error::PipelineError;

/// Timezone names that loggers append to timestamps. They are stripped, not
/// applied: every log is read as naive local time.
pub const ZONE_SUFFIXES: [&str; 3] = ["-BST", "-UTC", "-GMT"];

/// Layouts tried in order after the suffix is gone. `%.f` also matches no
/// fractional part.
const LAYOUTS: [&str; 6] = [
    // vdbench flatfile
    "%m/%d/%Y-%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d-%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S%.f",
];

/// Remove one known zone suffix from the end of `raw`, if present.
pub fn strip_zone_suffix(raw: &str) -> &str {
    let trimmed = raw.trim();
    ZONE_SUFFIXES
        .iter()
        .find_map(|suffix| trimmed.strip_suffix(suffix))
        .unwrap_or(trimmed)
}

/// Parse a log timestamp into a naive instant.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, PipelineError> {
    let text = strip_zone_suffix(raw);

    LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| PipelineError::MalformedTimestamp {
            value: raw.to_string(),
        })
}
