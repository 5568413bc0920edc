use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use tokio::sync::{oneshot, RwLock};
use tracing::{info, warn};
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::observability;

use super::overlap::{candidate_span, find_overlap};
use super::{Engine, EngineError, WalCommand};

fn too_long(value: Option<&str>, max: usize) -> bool {
    value.is_some_and(|v| v.len() > max)
}

fn check_len(value: Option<&str>, max: usize, what: &'static str) -> Result<(), EngineError> {
    if too_long(value, max) {
        return Err(EngineError::LimitExceeded(what));
    }
    Ok(())
}

/// Over-length patient or notes text makes the appointment invalid.
fn check_appointment_text(new: &NewAppointment) -> Result<(), EngineError> {
    if too_long(new.patient.as_deref(), MAX_PATIENT_LEN) {
        return Err(EngineError::InvalidAppointment("patient name too long"));
    }
    if too_long(new.notes.as_deref(), MAX_NOTES_LEN) {
        return Err(EngineError::InvalidAppointment("notes too long"));
    }
    Ok(())
}

impl Engine {
    pub async fn register_doctor(
        &self,
        id: Ulid,
        name: Option<String>,
        active: bool,
    ) -> Result<Doctor, EngineError> {
        check_len(name.as_deref(), MAX_NAME_LEN, "doctor name too long")?;
        let _gate = self.commit_gate.read().await;
        if self.doctors.len() >= MAX_DOCTORS {
            return Err(EngineError::LimitExceeded("too many doctors"));
        }

        // Claim the id before the append; the held write lock keeps bookings
        // out until the registration is durable.
        let ds = Arc::new(RwLock::new(DoctorState::new(id, name.clone(), active)));
        let guard = ds.clone().write_owned().await;
        match self.doctors.entry(id) {
            Entry::Occupied(_) => return Err(EngineError::AlreadyExists(id)),
            Entry::Vacant(slot) => {
                slot.insert(ds);
            }
        }

        let event = Event::DoctorRegistered { id, name, active };
        if let Err(e) = self.wal_append(&event).await {
            self.doctors.remove(&id);
            return Err(e);
        }
        info!(doctor_id = %id, active, "doctor registered");
        Ok(guard.doctor())
    }

    pub async fn update_doctor(&self, id: Ulid, changes: DoctorChanges) -> Result<Doctor, EngineError> {
        if let Some(name) = &changes.name {
            check_len(name.as_deref(), MAX_NAME_LEN, "doctor name too long")?;
        }
        let _gate = self.commit_gate.read().await;
        let ds = self
            .get_doctor_state(&id)
            .ok_or(EngineError::DoctorNotFound(id))?;
        let mut guard = ds.write().await;

        let event = Event::DoctorUpdated {
            id,
            name: changes.name.unwrap_or_else(|| guard.name.clone()),
            active: changes.active.unwrap_or(guard.active),
        };
        self.persist_and_apply(&mut guard, &event).await?;
        info!(doctor_id = %id, active = guard.active, "doctor updated");
        Ok(guard.doctor())
    }

    /// Book an appointment.
    ///
    /// Fails with [`EngineError::DoctorUnavailable`] when the doctor is unknown
    /// or inactive (checked before overlap), and with [`EngineError::Overlap`]
    /// when the interval intersects one of the doctor's existing appointments.
    /// The doctor's write lock is held from the overlap check through the WAL
    /// append, so concurrent bookings for one doctor are serialized.
    pub async fn create_appointment(&self, new: NewAppointment) -> Result<Appointment, EngineError> {
        let start = new.start_time.to_utc();
        let span = candidate_span(start, new.duration_minutes)
            .and_then(|span| check_appointment_text(&new).map(|()| span))
            .inspect_err(|e| reject(new.doctor_id, e))?;

        let _gate = self.commit_gate.read().await;
        let ds = self
            .get_doctor_state(&new.doctor_id)
            .ok_or(EngineError::DoctorUnavailable(new.doctor_id))
            .inspect_err(|e| reject(new.doctor_id, e))?;
        let mut guard = ds.write().await;
        if !guard.active {
            let err = EngineError::DoctorUnavailable(new.doctor_id);
            reject(new.doctor_id, &err);
            return Err(err);
        }

        if let Some(existing) = find_overlap(&guard, &span) {
            let err = EngineError::Overlap(existing);
            reject(new.doctor_id, &err);
            return Err(err);
        }

        if guard.appointments.len() >= MAX_APPOINTMENTS_PER_DOCTOR {
            return Err(EngineError::LimitExceeded("too many appointments for doctor"));
        }
        let id = new.id.unwrap_or_else(Ulid::new);
        match self.appointment_to_doctor.entry(id) {
            Entry::Occupied(_) => return Err(EngineError::AlreadyExists(id)),
            Entry::Vacant(slot) => {
                slot.insert(new.doctor_id);
            }
        }

        let entry = ScheduledAppointment {
            id,
            span,
            patient: new.patient,
            notes: new.notes,
        };
        let event = Event::AppointmentBooked {
            id,
            doctor_id: new.doctor_id,
            span,
            patient: entry.patient.clone(),
            notes: entry.notes.clone(),
        };
        if let Err(e) = self.persist_and_apply(&mut guard, &event).await {
            self.appointment_to_doctor.remove(&id);
            return Err(e);
        }

        metrics::counter!(observability::APPOINTMENTS_BOOKED_TOTAL).increment(1);
        info!(appointment_id = %id, doctor_id = %new.doctor_id, start = %start, minutes = new.duration_minutes, "appointment booked");
        Ok(guard.to_record(&entry))
    }

    /// Rewrite the WAL with just the events needed to recreate current state.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        let _gate = self.commit_gate.write().await;

        let states: Vec<_> = self.doctors.iter().map(|e| e.value().clone()).collect();
        let mut events = Vec::with_capacity(states.len());
        for ds in states {
            let guard = ds.read().await;
            events.push(Event::DoctorRegistered {
                id: guard.id,
                name: guard.name.clone(),
                active: guard.active,
            });
            events.extend(guard.appointments.iter().map(|a| Event::AppointmentBooked {
                id: a.id,
                doctor_id: guard.id,
                span: a.span,
                patient: a.patient.clone(),
                notes: a.notes.clone(),
            }));
        }

        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact { events, response: tx })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}

fn reject(doctor_id: Ulid, err: &EngineError) {
    let reason = match err {
        EngineError::DoctorUnavailable(_) => "doctor_unavailable",
        EngineError::Overlap(_) => "overlap",
        _ => "invalid",
    };
    metrics::counter!(observability::APPOINTMENTS_REJECTED_TOTAL, "reason" => reason).increment(1);
    warn!(doctor_id = %doctor_id, reason, "appointment rejected: {err}");
}
