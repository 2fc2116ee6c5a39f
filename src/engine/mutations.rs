use chrono::DateTime;
use tokio::sync::oneshot;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::{ClinicError, Engine, WalCommand};

fn validate_document(document: &ClinicDocument) -> Result<(), ClinicError> {
    if document.info.name.is_empty() {
        return Err(ClinicError::Validation("clinic name is required"));
    }
    if document.info.name.len() > MAX_NAME_LEN
        || document.info.address.len() > MAX_TEXT_LEN
        || document.info.hours.len() > MAX_TEXT_LEN
        || document.info.phone.len() > MAX_NAME_LEN
    {
        return Err(ClinicError::LimitExceeded("clinic info field too long"));
    }

    if document.staff.len() > MAX_STAFF {
        return Err(ClinicError::LimitExceeded("too many staff"));
    }
    for (i, member) in document.staff.iter().enumerate() {
        if member.name.is_empty() {
            return Err(ClinicError::Validation("staff name cannot be empty"));
        }
        if member.name.len() > MAX_NAME_LEN {
            return Err(ClinicError::LimitExceeded("staff name too long"));
        }
        if document.staff[..i].iter().any(|m| m.id == member.id) {
            return Err(ClinicError::Validation("duplicate staff id"));
        }
    }

    if document.services.len() > MAX_SERVICES {
        return Err(ClinicError::LimitExceeded("too many services"));
    }
    for (i, service) in document.services.iter().enumerate() {
        if service.name.is_empty() {
            return Err(ClinicError::Validation("service name cannot be empty"));
        }
        if service.name.len() > MAX_NAME_LEN {
            return Err(ClinicError::LimitExceeded("service name too long"));
        }
        if service.duration_minutes == 0 {
            return Err(ClinicError::Validation("service duration must be positive"));
        }
        if service.price < 0.0 || !service.price.is_finite() {
            return Err(ClinicError::Validation("service price cannot be negative"));
        }
        if document.services[..i].iter().any(|s| s.id == service.id) {
            return Err(ClinicError::Validation("duplicate service id"));
        }
    }

    if document.faq.len() > MAX_FAQ_ENTRIES {
        return Err(ClinicError::LimitExceeded("too many FAQ entries"));
    }
    for entry in &document.faq {
        if entry.question.is_empty() || entry.answer.is_empty() {
            return Err(ClinicError::Validation("FAQ question and answer cannot be empty"));
        }
        if entry.question.len() > MAX_TEXT_LEN || entry.answer.len() > MAX_TEXT_LEN {
            return Err(ClinicError::LimitExceeded("FAQ entry too long"));
        }
    }

    for days in document.weekly_schedule.values() {
        if days.iter().any(|d| *d > 6) {
            return Err(ClinicError::Validation("weekday numbers must be 0..=6"));
        }
    }

    Ok(())
}

impl Engine {
    /// Wholesale replacement of the clinic document (the admin save path).
    ///
    /// Applying the event normalizes the weekly schedule — every staff member
    /// ends up with an entry, empty for the never-scheduled — and cascades
    /// sessions (and their bookings) of removed staff out of the ledger.
    pub async fn update_clinic(&self, document: ClinicDocument) -> Result<(), ClinicError> {
        validate_document(&document)?;
        let mut state = self.state.write().await;
        let event = Event::ClinicUpdated { document };
        self.persist_and_apply(&mut state, &event).await
    }

    /// Add a standalone ledger session. Staff and service must exist; overlap
    /// with existing sessions is deliberately NOT checked — the ledger accepts
    /// colliding sessions and the resolver simply shows the staff member busy.
    pub async fn add_session(
        &self,
        staff_id: Ulid,
        service_id: Ulid,
        start_time: String,
    ) -> Result<Ulid, ClinicError> {
        if start_time.len() > MAX_TIMESTAMP_LEN {
            return Err(ClinicError::LimitExceeded("start time too long"));
        }
        let mut state = self.state.write().await;
        if state.sessions.len() >= MAX_SESSIONS {
            return Err(ClinicError::LimitExceeded("too many sessions"));
        }
        if state.staff_by_id(&staff_id).is_none() {
            return Err(ClinicError::UnknownStaff(staff_id));
        }
        if state.service_by_id(&service_id).is_none() {
            return Err(ClinicError::UnknownService(service_id));
        }

        let id = Ulid::new();
        let event = Event::SessionAdded {
            session: Session {
                id,
                staff_id,
                service_id,
                start_time,
            },
        };
        self.persist_and_apply(&mut state, &event).await?;
        Ok(id)
    }

    pub async fn remove_session(&self, id: Ulid) -> Result<(), ClinicError> {
        let mut state = self.state.write().await;
        if state.sessions.iter().all(|s| s.id != id) {
            return Err(ClinicError::NotFound(id));
        }
        if self.bookings.contains_key(&id) {
            // The pair may only die together, through cancel_booking.
            return Err(ClinicError::Validation(
                "session is paired with a booking; cancel the booking instead",
            ));
        }
        let event = Event::SessionRemoved { id };
        self.persist_and_apply(&mut state, &event).await
    }

    /// Create a booking and its paired session atomically: one WAL record,
    /// one state application under the write lock. A WAL failure leaves
    /// neither record behind.
    pub async fn create_booking(
        &self,
        client_name: String,
        service_id: Ulid,
        staff_id: Ulid,
        start_time: String,
    ) -> Result<Booking, ClinicError> {
        if client_name.is_empty() {
            return Err(ClinicError::Validation("client name is required"));
        }
        if client_name.len() > MAX_NAME_LEN {
            return Err(ClinicError::LimitExceeded("client name too long"));
        }
        if start_time.len() > MAX_TIMESTAMP_LEN {
            return Err(ClinicError::LimitExceeded("start time too long"));
        }
        if DateTime::parse_from_rfc3339(&start_time).is_err() {
            return Err(ClinicError::InvalidTimestamp(start_time));
        }

        let mut state = self.state.write().await;
        if self.bookings.len() >= MAX_BOOKINGS {
            return Err(ClinicError::LimitExceeded("too many bookings"));
        }
        if state.sessions.len() >= MAX_SESSIONS {
            return Err(ClinicError::LimitExceeded("too many sessions"));
        }
        if state.staff_by_id(&staff_id).is_none() {
            return Err(ClinicError::UnknownStaff(staff_id));
        }
        if state.service_by_id(&service_id).is_none() {
            return Err(ClinicError::UnknownService(service_id));
        }

        let booking = Booking {
            id: Ulid::new(),
            client_name,
            service_id,
            staff_id,
            start_time,
        };
        let event = Event::BookingCreated {
            booking: booking.clone(),
        };
        self.persist_and_apply(&mut state, &event).await?;
        Ok(booking)
    }

    /// Mirror of `create_booking`: one record removes booking and session.
    pub async fn cancel_booking(&self, id: Ulid) -> Result<(), ClinicError> {
        let mut state = self.state.write().await;
        if !self.bookings.contains_key(&id) {
            return Err(ClinicError::NotFound(id));
        }
        let event = Event::BookingCancelled { id };
        self.persist_and_apply(&mut state, &event).await
    }

    /// Rewrite the WAL with the minimal events recreating current state.
    ///
    /// Holds the write lock across snapshot and swap so no mutation can land
    /// between the two and be lost by the rewrite.
    pub async fn compact_wal(&self) -> Result<(), ClinicError> {
        let state = self.state.write().await;

        let mut events = vec![Event::ClinicUpdated {
            document: state.document(),
        }];
        // Replay order = ledger order; booking-paired sessions re-enter
        // through their booking record.
        for session in &state.sessions {
            match self.bookings.get(&session.id) {
                Some(entry) => events.push(Event::BookingCreated {
                    booking: entry.value().clone(),
                }),
                None => events.push(Event::SessionAdded {
                    session: session.clone(),
                }),
            }
        }

        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact {
                events,
                response: tx,
            })
            .await
            .map_err(|_| ClinicError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| ClinicError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| ClinicError::WalError(e.to_string()))
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
