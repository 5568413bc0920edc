use chrono::{DateTime, Utc};
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::time;

use super::EngineError;

/// Build the candidate interval for a booking, rejecting out-of-range input.
pub(crate) fn candidate_span(start: DateTime<Utc>, duration_minutes: u32) -> Result<Span, EngineError> {
    if duration_minutes == 0 {
        return Err(EngineError::InvalidAppointment("duration must be positive"));
    }
    if duration_minutes > MAX_DURATION_MINUTES {
        return Err(EngineError::InvalidAppointment("duration too long"));
    }
    let span = Span::from_minutes(time::to_ms(start), duration_minutes);
    if span.start < MIN_VALID_TIMESTAMP_MS || span.end > MAX_VALID_TIMESTAMP_MS {
        return Err(EngineError::InvalidAppointment("start time out of range"));
    }
    Ok(span)
}

/// First existing appointment intersecting `candidate`, if any.
pub fn find_overlap(ds: &DoctorState, candidate: &Span) -> Option<Ulid> {
    ds.overlapping(candidate)
        .find(|existing| existing.span.overlaps(candidate))
        .map(|existing| existing.id)
}

pub fn has_overlap(ds: &DoctorState, candidate: &Span) -> bool {
    find_overlap(ds, candidate).is_some()
}
