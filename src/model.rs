use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::time::{self, Timestamp};

/// Unix milliseconds, UTC. All interval math happens in this unit.
pub type Ms = i64;

pub const MS_PER_MINUTE: Ms = 60_000;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    /// Span of `minutes` beginning at `start`.
    pub fn from_minutes(start: Ms, minutes: u32) -> Self {
        Self::new(start, start + Ms::from(minutes) * MS_PER_MINUTE)
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    /// Back-to-back spans (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doctor {
    pub id: Ulid,
    pub name: Option<String>,
    pub active: bool,
}

/// A persisted appointment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub id: Ulid,
    pub doctor_id: Ulid,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub patient: Option<String>,
    pub notes: Option<String>,
}

impl Appointment {
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + chrono::Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn span(&self) -> Span {
        Span::from_minutes(time::to_ms(self.start_time), self.duration_minutes)
    }
}

/// Everything needed to book an appointment, before validation.
///
/// `id` is optional; the engine generates one when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub id: Option<Ulid>,
    pub doctor_id: Ulid,
    pub start_time: Timestamp,
    pub duration_minutes: u32,
    pub patient: Option<String>,
    pub notes: Option<String>,
}

impl NewAppointment {
    pub fn new(doctor_id: Ulid, start_time: impl Into<Timestamp>, duration_minutes: u32) -> Self {
        Self {
            id: None,
            doctor_id,
            start_time: start_time.into(),
            duration_minutes,
            patient: None,
            notes: None,
        }
    }

    pub fn with_id(mut self, id: Ulid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_patient(mut self, patient: impl Into<String>) -> Self {
        self.patient = Some(patient.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Partial update for a doctor. `None` leaves a field as is;
/// `name: Some(None)` clears the name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctorChanges {
    pub name: Option<Option<String>>,
    pub active: Option<bool>,
}

/// An appointment as held in a doctor's schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledAppointment {
    pub id: Ulid,
    pub span: Span,
    pub patient: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DoctorState {
    pub id: Ulid,
    pub name: Option<String>,
    pub active: bool,
    /// Sorted by `span.start`. Never overlapping.
    pub appointments: Vec<ScheduledAppointment>,
}

impl DoctorState {
    pub fn new(id: Ulid, name: Option<String>, active: bool) -> Self {
        Self {
            id,
            name,
            active,
            appointments: Vec::new(),
        }
    }

    pub fn doctor(&self) -> Doctor {
        Doctor {
            id: self.id,
            name: self.name.clone(),
            active: self.active,
        }
    }

    /// Insert maintaining sort order by span.start.
    pub fn insert_appointment(&mut self, appt: ScheduledAppointment) {
        let pos = self
            .appointments
            .binary_search_by_key(&appt.span.start, |a| a.span.start)
            .unwrap_or_else(|e| e);
        self.appointments.insert(pos, appt);
    }

    /// Appointments whose span overlaps the query window.
    /// Binary search skips everything starting at or after `query.end`.
    pub fn overlapping(&self, query: &Span) -> impl Iterator<Item = &ScheduledAppointment> {
        let right_bound = self
            .appointments
            .partition_point(|a| a.span.start < query.end);
        self.appointments[..right_bound]
            .iter()
            .filter(move |a| a.span.end > query.start)
    }

    pub fn to_record(&self, appt: &ScheduledAppointment) -> Appointment {
        Appointment {
            id: appt.id,
            doctor_id: self.id,
            start_time: time::from_ms(appt.span.start),
            duration_minutes: minutes_in(&appt.span),
            patient: appt.patient.clone(),
            notes: appt.notes.clone(),
        }
    }
}

fn minutes_in(span: &Span) -> u32 {
    u32::try_from(span.duration_ms() / MS_PER_MINUTE).unwrap_or(u32::MAX)
}

/// The log record format. Flat, one variant per state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    DoctorRegistered {
        id: Ulid,
        name: Option<String>,
        active: bool,
    },
    DoctorUpdated {
        id: Ulid,
        name: Option<String>,
        active: bool,
    },
    AppointmentBooked {
        id: Ulid,
        doctor_id: Ulid,
        span: Span,
        patient: Option<String>,
        notes: Option<String>,
    },
}

impl Event {
    /// The doctor this event belongs to.
    pub fn doctor_id(&self) -> Ulid {
        match self {
            Event::DoctorRegistered { id, .. } | Event::DoctorUpdated { id, .. } => *id,
            Event::AppointmentBooked { doctor_id, .. } => *doctor_id,
        }
    }
}
