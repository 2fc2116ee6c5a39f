//! Wire request types. One JSON object per line; the `cmd` field selects the
//! operation. Replies are `{"ok":true,...}` or `{"ok":false,"error":"..."}`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use ulid::Ulid;

use crate::model::ClinicDocument;

#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Request {
    /// Full clinic state: profile, catalogs, schedule, sessions.
    GetClinic,
    /// Wholesale replacement of the admin-editable clinic document.
    UpdateClinic { document: ClinicDocument },
    AddSession {
        staff_id: Ulid,
        service_id: Ulid,
        start_time: String,
    },
    RemoveSession { id: Ulid },
    ListSessions,
    /// Staff scheduled on the date's weekday (date as `YYYY-MM-DD`).
    ScheduledStaff { date: NaiveDate },
    /// Staff scheduled AND unoccupied at the instant (RFC 3339).
    AvailableStaff { at: DateTime<Utc> },
    CreateBooking {
        client_name: String,
        service_id: Ulid,
        staff_id: Ulid,
        start_time: String,
    },
    CancelBooking { id: Ulid },
    ListBookings,
    DailyReport { date: NaiveDate },
    /// Assembled LLM prompt for a visitor question; no model is called here.
    ChatContext { question: String },
}
