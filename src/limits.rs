use crate::model::Ms;

pub const MAX_DOCTORS: usize = 100_000;
pub const MAX_APPOINTMENTS_PER_DOCTOR: usize = 100_000;

pub const MAX_NAME_LEN: usize = 256;
pub const MAX_PATIENT_LEN: usize = 256;
pub const MAX_NOTES_LEN: usize = 4096;

/// One full day.
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;

/// 1970-01-01T00:00:00Z
pub const MIN_VALID_TIMESTAMP_MS: Ms = 0;
/// 2100-01-01T00:00:00Z
pub const MAX_VALID_TIMESTAMP_MS: Ms = 4_102_444_800_000;
