use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

use crate::model::Ms;

/// A point in time as a caller or a store hands it over: with or without an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// No zone information. Read as UTC wall-clock time.
    Naive(NaiveDateTime),
    Aware(DateTime<FixedOffset>),
}

impl Timestamp {
    /// Normalize to UTC.
    ///
    /// Naive values are assigned UTC without shifting the clock value; aware
    /// values are converted. Normalizing an already-UTC value is a no-op.
    pub fn to_utc(self) -> DateTime<Utc> {
        match self {
            Timestamp::Naive(naive) => Utc.from_utc_datetime(&naive),
            Timestamp::Aware(aware) => aware.with_timezone(&Utc),
        }
    }

    /// Interpret unix milliseconds as a UTC instant.
    pub fn from_epoch_ms(ms: Ms) -> Result<Self, TimeError> {
        Utc.timestamp_millis_opt(ms)
            .single()
            .map(Timestamp::from)
            .ok_or(TimeError::OutOfRange(ms))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp::Aware(dt.fixed_offset())
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Timestamp::Aware(dt)
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(naive: NaiveDateTime) -> Self {
        Timestamp::Naive(naive)
    }
}

/// Normalize anything timestamp-like to UTC.
pub fn to_utc(ts: impl Into<Timestamp>) -> DateTime<Utc> {
    ts.into().to_utc()
}

pub fn to_ms(dt: DateTime<Utc>) -> Ms {
    dt.timestamp_millis()
}

/// Inverse of [`to_ms`]. Values outside chrono's range clamp to the epoch;
/// stored spans are range-checked on the way in so this never happens in practice.
pub fn from_ms(ms: Ms) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

const AWARE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%#z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse RFC 3339 / ISO 8601 text, with or without an offset.
pub fn parse_timestamp(input: &str) -> Result<Timestamp, TimeError> {
    let s = input.trim();
    if let Ok(aware) = DateTime::parse_from_rfc3339(s) {
        return Ok(Timestamp::Aware(aware));
    }
    for fmt in AWARE_FORMATS {
        if let Ok(aware) = DateTime::parse_from_str(s, fmt) {
            return Ok(Timestamp::Aware(aware));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Timestamp::Naive(naive));
        }
    }
    Err(TimeError::Unparseable(s.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum TimeError {
    #[error("unparseable timestamp: {0:?}")]
    Unparseable(String),
    #[error("timestamp out of range: {0}")]
    OutOfRange(Ms),
}
