mod error;
mod mutations;
mod overlap;
mod queries;

pub use error::{EngineError, ErrorStatus};
pub use overlap::{find_overlap, has_overlap};

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::info;
use ulid::Ulid;

use crate::model::*;
use crate::wal::Wal;

pub type SharedDoctorState = Arc<RwLock<DoctorState>>;

// ── Group-commit WAL channel ─────────────────────────────

type PendingAppend = (Event, oneshot::Sender<io::Result<()>>);

pub(super) enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

/// Owns the WAL. Appends that are already queued behind the first one are
/// written together and share a single fsync; any other command ends the
/// batch and runs right after it.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        let first = match cmd {
            WalCommand::Append { event, response } => (event, response),
            other => {
                handle_non_append(&mut wal, other);
                continue;
            }
        };
        let (mut batch, interrupted_by) = collect_batch(&mut rx, first);
        commit_batch(&mut wal, &mut batch);
        if let Some(other) = interrupted_by {
            handle_non_append(&mut wal, other);
        }
    }
}

/// Drain queued appends without waiting. Stops at the first non-append.
fn collect_batch(
    rx: &mut mpsc::Receiver<WalCommand>,
    first: PendingAppend,
) -> (Vec<PendingAppend>, Option<WalCommand>) {
    let mut batch = vec![first];
    while let Ok(cmd) = rx.try_recv() {
        match cmd {
            WalCommand::Append { event, response } => batch.push((event, response)),
            other => return (batch, Some(other)),
        }
    }
    (batch, None)
}

fn commit_batch(wal: &mut Wal, batch: &mut Vec<PendingAppend>) {
    metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
    let started = std::time::Instant::now();
    let result = wal.append_batch(batch.iter().map(|(event, _)| event));
    metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
        .record(started.elapsed().as_secs_f64());
    for (_, tx) in batch.drain(..) {
        let outcome = result
            .as_ref()
            .map(|_| ())
            .map_err(|e| io::Error::new(e.kind(), e.to_string()));
        let _ = tx.send(outcome);
    }
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events)
                .and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        WalCommand::Append { event, response } => commit_batch(wal, &mut vec![(event, response)]),
    }
}

/// Doctors and their schedules, backed by the WAL.
///
/// Lock order: `commit_gate` before any doctor lock. Every mutation holds the
/// gate shared for its whole check-then-append; compaction holds it exclusive
/// so its snapshot can't miss an in-flight append.
pub struct Engine {
    pub(super) doctors: DashMap<Ulid, SharedDoctorState>,
    /// Reverse lookup: appointment id → doctor id.
    pub(super) appointment_to_doctor: DashMap<Ulid, Ulid>,
    pub(super) wal_tx: mpsc::Sender<WalCommand>,
    pub(super) commit_gate: RwLock<()>,
}

/// Apply an event to a doctor's state. Caller holds the doctor's lock.
fn apply_to_doctor(ds: &mut DoctorState, event: &Event, index: &DashMap<Ulid, Ulid>) {
    match event {
        Event::DoctorUpdated { name, active, .. } => {
            ds.name = name.clone();
            ds.active = *active;
        }
        Event::AppointmentBooked {
            id,
            doctor_id,
            span,
            patient,
            notes,
        } => {
            ds.insert_appointment(ScheduledAppointment {
                id: *id,
                span: *span,
                patient: patient.clone(),
                notes: notes.clone(),
            });
            index.insert(*id, *doctor_id);
        }
        // Registration creates the state itself; handled at the map level.
        Event::DoctorRegistered { .. } => {}
    }
}

impl Engine {
    /// Replay the WAL at `wal_path` and start the background writer.
    /// Must be called inside a tokio runtime.
    pub fn new(wal_path: PathBuf) -> io::Result<Self> {
        let events = Wal::replay(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let engine = Self {
            doctors: DashMap::new(),
            appointment_to_doctor: DashMap::new(),
            wal_tx,
            commit_gate: RwLock::new(()),
        };

        // We're the sole owner of every lock here, so try_write never contends.
        // Blocking lock calls are off-limits because this may run on a runtime thread.
        for event in &events {
            match event {
                Event::DoctorRegistered { id, name, active } => {
                    let ds = DoctorState::new(*id, name.clone(), *active);
                    engine.doctors.insert(*id, Arc::new(RwLock::new(ds)));
                }
                other => {
                    let Some(entry) = engine.doctors.get(&other.doctor_id()) else {
                        continue;
                    };
                    let ds = entry.value().clone();
                    drop(entry);
                    if let Ok(mut guard) = ds.try_write() {
                        apply_to_doctor(&mut guard, other, &engine.appointment_to_doctor);
                    }
                }
            }
        }

        info!(
            doctors = engine.doctors.len(),
            appointments = engine.appointment_to_doctor.len(),
            "replayed {} WAL events",
            events.len()
        );
        Ok(engine)
    }

    /// Write an event via the background group-commit writer.
    pub(super) async fn wal_append(&self, event: &Event) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    /// WAL-append then apply in memory.
    pub(super) async fn persist_and_apply(
        &self,
        ds: &mut DoctorState,
        event: &Event,
    ) -> Result<(), EngineError> {
        self.wal_append(event).await?;
        apply_to_doctor(ds, event, &self.appointment_to_doctor);
        Ok(())
    }

    pub fn get_doctor_state(&self, id: &Ulid) -> Option<SharedDoctorState> {
        self.doctors.get(id).map(|e| e.value().clone())
    }

    pub fn doctor_count(&self) -> usize {
        self.doctors.len()
    }
}
