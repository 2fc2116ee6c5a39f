use chrono::{DateTime, NaiveDate, Utc};
use ulid::Ulid;

use crate::model::*;

use super::{Engine, availability};

impl Engine {
    /// Snapshot of the full clinic state (catalog + ledger).
    pub async fn clinic(&self) -> ClinicState {
        self.state.read().await.clone()
    }

    pub async fn sessions(&self) -> Vec<Session> {
        self.state.read().await.sessions.clone()
    }

    pub async fn scheduled_staff_for_day(&self, date: NaiveDate) -> Vec<Staff> {
        let state = self.state.read().await;
        availability::scheduled_staff_for_day(&state, date)
    }

    pub async fn available_staff(&self, at: DateTime<Utc>) -> Vec<Staff> {
        let state = self.state.read().await;
        availability::available_staff(&state, at)
    }

    pub fn booking(&self, id: &Ulid) -> Option<Booking> {
        self.bookings.get(id).map(|e| e.value().clone())
    }

    /// All bookings, ordered by id. Ulids sort by creation time at
    /// millisecond granularity, so this is effectively creation order.
    pub fn list_bookings(&self) -> Vec<Booking> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .iter()
            .map(|e| e.value().clone())
            .collect();
        bookings.sort_by_key(|b| b.id);
        bookings
    }

    /// Bookings falling on `date` (UTC), joined against the catalog for
    /// display names and prices. Dangling staff/service references render as
    /// "Unknown" with price 0 rather than dropping the row.
    pub async fn daily_report(&self, date: NaiveDate) -> DailyReport {
        let state = self.state.read().await;
        let mut items = Vec::new();
        let mut total = 0.0;

        for booking in self.list_bookings() {
            let on_date = DateTime::parse_from_rfc3339(&booking.start_time)
                .map(|t| t.with_timezone(&Utc).date_naive() == date)
                .unwrap_or(false);
            if !on_date {
                continue;
            }
            let service = state.service_by_id(&booking.service_id);
            let item = DailyReportItem {
                staff_name: state
                    .staff_by_id(&booking.staff_id)
                    .map_or_else(|| "Unknown".into(), |m| m.name.clone()),
                service_name: service.map_or_else(|| "Unknown".into(), |s| s.name.clone()),
                price: service.map_or(0.0, |s| s.price),
            };
            total += item.price;
            items.push(item);
        }

        DailyReport {
            date: date.to_string(),
            items,
            total,
        }
    }
}
