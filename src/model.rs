use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Days a staff member recurringly works, 0=Sunday .. 6=Saturday.
pub type WeekdaySet = BTreeSet<u8>;

/// Staff id → weekday set. A missing entry means "works no days".
pub type WeeklySchedule = HashMap<Ulid, WeekdaySet>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub id: Ulid,
    pub name: String,
}

/// A bookable offering. `duration_minutes` drives derived session end times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Ulid,
    pub name: String,
    pub duration_minutes: u32,
    pub price: f64,
}

/// A committed, time-bounded occupation of one staff member.
///
/// `start_time` is stored as the raw RFC 3339 string the client sent; the end
/// time is never stored, it is derived from the linked service's duration at
/// resolution time. Catalog edits can leave a session pointing at a service id
/// that no longer exists — readers must tolerate that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Ulid,
    pub staff_id: Ulid,
    pub service_id: Ulid,
    pub start_time: String,
}

impl Session {
    pub fn parsed_start(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.start_time)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Half-open occupancy window `[start, start + duration)`.
    ///
    /// `None` if the start time does not parse or the service id is unknown —
    /// such a session occupies nobody.
    pub fn occupancy(&self, services: &[Service]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.parsed_start()?;
        let service = services.iter().find(|s| s.id == self.service_id)?;
        let end = start + TimeDelta::minutes(i64::from(service.duration_minutes));
        Some((start, end))
    }
}

/// The client-facing appointment record, paired 1:1 with a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub client_name: String,
    pub service_id: Ulid,
    pub staff_id: Ulid,
    pub start_time: String,
}

impl Booking {
    /// The paired session carries the booking's own id — that is the whole
    /// id derivation, so either record can locate the other.
    pub fn session(&self) -> Session {
        Session {
            id: self.id,
            staff_id: self.staff_id,
            service_id: self.service_id,
            start_time: self.start_time.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicInfo {
    pub name: String,
    pub address: String,
    pub hours: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    pub id: Ulid,
    pub question: String,
    pub answer: String,
}

/// The admin-editable clinic document: everything except the session ledger
/// and bookings, which have their own lifecycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicDocument {
    pub info: ClinicInfo,
    pub staff: Vec<Staff>,
    pub services: Vec<Service>,
    pub faq: Vec<Faq>,
    pub weekly_schedule: WeeklySchedule,
}

/// Full in-memory clinic state. Staff and service order is catalog order and
/// is preserved across writes and replays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicState {
    pub info: ClinicInfo,
    pub staff: Vec<Staff>,
    pub services: Vec<Service>,
    pub faq: Vec<Faq>,
    pub weekly_schedule: WeeklySchedule,
    pub sessions: Vec<Session>,
}

impl ClinicState {
    pub fn staff_by_id(&self, id: &Ulid) -> Option<&Staff> {
        self.staff.iter().find(|s| s.id == *id)
    }

    pub fn service_by_id(&self, id: &Ulid) -> Option<&Service> {
        self.services.iter().find(|s| s.id == *id)
    }

    pub fn insert_session(&mut self, session: Session) {
        self.sessions.push(session);
    }

    pub fn remove_session(&mut self, id: &Ulid) -> Option<Session> {
        let pos = self.sessions.iter().position(|s| s.id == *id)?;
        Some(self.sessions.remove(pos))
    }

    pub fn document(&self) -> ClinicDocument {
        ClinicDocument {
            info: self.info.clone(),
            staff: self.staff.clone(),
            services: self.services.clone(),
            faq: self.faq.clone(),
            weekly_schedule: self.weekly_schedule.clone(),
        }
    }
}

/// The event types — flat, no nesting. This is the WAL record format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Wholesale replacement of the clinic document (admin save).
    ClinicUpdated { document: ClinicDocument },
    /// A standalone ledger entry (admin-created, not booking-paired).
    SessionAdded { session: Session },
    SessionRemoved { id: Ulid },
    /// Creates the booking AND its paired session in one record, so the pair
    /// is durable (or absent) as a unit.
    BookingCreated { booking: Booking },
    /// Removes the booking and its paired session in one record.
    BookingCancelled { id: Ulid },
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyReportItem {
    pub staff_name: String,
    pub service_name: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyReport {
    pub date: String,
    pub items: Vec<DailyReportItem>,
    pub total: f64,
}
