use ulid::Ulid;

use crate::model::*;
use crate::time::Timestamp;

use super::overlap::{candidate_span, has_overlap};
use super::{Engine, EngineError};

impl Engine {
    pub async fn get_doctor(&self, id: Ulid) -> Option<Doctor> {
        let ds = self.get_doctor_state(&id)?;
        let guard = ds.read().await;
        Some(guard.doctor())
    }

    /// All doctors, ordered by id.
    pub async fn list_doctors(&self) -> Vec<Doctor> {
        let states: Vec<_> = self.doctors.iter().map(|e| e.value().clone()).collect();
        let mut doctors = Vec::with_capacity(states.len());
        for ds in states {
            doctors.push(ds.read().await.doctor());
        }
        doctors.sort_by_key(|d| d.id);
        doctors
    }

    /// A doctor's appointments ordered by start time. Unknown doctor → empty.
    pub async fn appointments_for_doctor(&self, doctor_id: Ulid) -> Vec<Appointment> {
        let Some(ds) = self.get_doctor_state(&doctor_id) else {
            return Vec::new();
        };
        let guard = ds.read().await;
        guard.appointments.iter().map(|a| guard.to_record(a)).collect()
    }

    /// Every appointment, grouped by doctor id then ordered by start time.
    pub async fn all_appointments(&self) -> Vec<Appointment> {
        let mut all = Vec::new();
        for doctor in self.list_doctors().await {
            all.extend(self.appointments_for_doctor(doctor.id).await);
        }
        all
    }

    pub async fn get_appointment(&self, id: Ulid) -> Option<Appointment> {
        let doctor_id = *self.appointment_to_doctor.get(&id)?.value();
        let ds = self.get_doctor_state(&doctor_id)?;
        let guard = ds.read().await;
        guard
            .appointments
            .iter()
            .find(|a| a.id == id)
            .map(|a| guard.to_record(a))
    }

    /// Would `[start, start + duration_minutes)` intersect one of the doctor's
    /// appointments? No side effects. A doctor with no appointments (or no
    /// record at all) has no overlaps.
    pub async fn check_overlap(
        &self,
        doctor_id: Ulid,
        start: impl Into<Timestamp>,
        duration_minutes: u32,
    ) -> Result<bool, EngineError> {
        let span = candidate_span(start.into().to_utc(), duration_minutes)?;
        let Some(ds) = self.get_doctor_state(&doctor_id) else {
            return Ok(false);
        };
        let guard = ds.read().await;
        Ok(has_overlap(&guard, &span))
    }
}
