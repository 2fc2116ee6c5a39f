mod availability;
mod error;
mod mutations;
mod queries;
#[cfg(test)]
mod tests;

pub use availability::{
    available_staff, occupied_staff_at, scheduled_staff_for_day, weekday_number,
};
pub use error::ClinicError;

use std::io;
use std::path::PathBuf;

use dashmap::DashMap;
use tokio::sync::{RwLock, mpsc, oneshot};
use ulid::Ulid;

use crate::model::*;
use crate::wal::Wal;

// ── Group-commit WAL channel ─────────────────────────────

pub(crate) enum WalCommand {
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

/// Background task owning the WAL. Batches whatever appends are immediately
/// available into a single buffered write + fsync, then acks them all.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        let WalCommand::Append { event, response } = cmd else {
            handle_non_append(&mut wal, cmd);
            continue;
        };

        let mut batch = vec![(event, response)];
        let mut deferred = None;
        while let Ok(next) = rx.try_recv() {
            match next {
                WalCommand::Append { event, response } => batch.push((event, response)),
                other => {
                    // Flush the in-flight batch before e.g. compacting over it.
                    deferred = Some(other);
                    break;
                }
            }
        }

        metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE)
            .record(batch.len() as f64);
        let flush_start = std::time::Instant::now();
        let result = flush_batch(&mut wal, &batch);
        metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
            .record(flush_start.elapsed().as_secs_f64());

        for (_, tx) in batch {
            let ack = match &result {
                Ok(()) => Ok(()),
                Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
            };
            let _ = tx.send(ack);
        }

        if let Some(other) = deferred {
            handle_non_append(&mut wal, other);
        }
    }
}

fn flush_batch(wal: &mut Wal, batch: &[(Event, oneshot::Sender<io::Result<()>>)]) -> io::Result<()> {
    let mut append_err = None;
    for (event, _) in batch {
        if let Err(e) = wal.append_buffered(event) {
            append_err = Some(e);
            break;
        }
    }
    // Always flush so partially buffered bytes of a failed batch don't leak
    // into the next one (every caller in this batch was told it failed).
    let flush_err = wal.flush_sync().err();
    match (append_err, flush_err) {
        (Some(e), _) | (None, Some(e)) => Err(e),
        (None, None) => Ok(()),
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
        WalCommand::Append { .. } => unreachable!(),
    }
}

// ── Engine ───────────────────────────────────────────────

/// The single clinic's state: an in-memory document behind one write lock,
/// plus the bookings ledger, durably backed by the WAL. Every mutation is
/// WAL-append-then-apply, so a failed append leaves no partial state.
pub struct Engine {
    state: RwLock<ClinicState>,
    bookings: DashMap<Ulid, Booking>,
    wal_tx: mpsc::Sender<WalCommand>,
}

/// Schedule with exactly one entry per catalog staff member: missing entries
/// become empty sets, entries for unknown staff are dropped, and out-of-range
/// weekday values (only possible in hand-edited WALs) are discarded.
fn normalize_schedule(staff: &[Staff], schedule: &WeeklySchedule) -> WeeklySchedule {
    staff
        .iter()
        .map(|member| {
            let days = schedule
                .get(&member.id)
                .map(|days| days.iter().copied().filter(|d| *d <= 6).collect())
                .unwrap_or_default();
            (member.id, days)
        })
        .collect()
}

/// Apply an event to state + bookings. No locking — the caller holds the
/// write lock (or exclusively owns the state during replay).
fn apply_event(state: &mut ClinicState, bookings: &DashMap<Ulid, Booking>, event: &Event) {
    match event {
        Event::ClinicUpdated { document } => {
            state.info = document.info.clone();
            state.staff = document.staff.clone();
            state.services = document.services.clone();
            state.faq = document.faq.clone();
            state.weekly_schedule = normalize_schedule(&document.staff, &document.weekly_schedule);
            // Cascade: sessions of removed staff go, and booking-paired
            // sessions take their booking with them.
            let removed: Vec<Ulid> = state
                .sessions
                .iter()
                .filter(|s| state.staff.iter().all(|m| m.id != s.staff_id))
                .map(|s| s.id)
                .collect();
            for id in removed {
                state.remove_session(&id);
                bookings.remove(&id);
            }
        }
        Event::SessionAdded { session } => {
            state.insert_session(session.clone());
        }
        Event::SessionRemoved { id } => {
            state.remove_session(id);
        }
        Event::BookingCreated { booking } => {
            state.insert_session(booking.session());
            bookings.insert(booking.id, booking.clone());
        }
        Event::BookingCancelled { id } => {
            state.remove_session(id);
            bookings.remove(id);
        }
    }
}

impl Engine {
    /// Replay the WAL at `wal_path` (if any), then start the group-commit
    /// writer task for new appends.
    pub fn new(wal_path: PathBuf) -> io::Result<Self> {
        let events = Wal::replay(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let mut state = ClinicState::default();
        let bookings = DashMap::new();
        for event in &events {
            apply_event(&mut state, &bookings, event);
        }

        Ok(Self {
            state: RwLock::new(state),
            bookings,
            wal_tx,
        })
    }

    /// Write an event to the WAL via the background group-commit writer.
    async fn wal_append(&self, event: &Event) -> Result<(), ClinicError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| ClinicError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| ClinicError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| ClinicError::WalError(e.to_string()))
    }

    /// WAL-append + apply in one call: the all-or-nothing transaction every
    /// mutation goes through.
    async fn persist_and_apply(
        &self,
        state: &mut ClinicState,
        event: &Event,
    ) -> Result<(), ClinicError> {
        self.wal_append(event).await?;
        apply_event(state, &self.bookings, event);
        Ok(())
    }
}
