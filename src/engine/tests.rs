use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use ulid::Ulid;

use super::*;
use crate::model::*;

fn test_wal_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("clinicd_test_engine");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = std::fs::remove_file(&path);
    path
}

fn instant(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

/// Two staff, two services, Mon–Fri schedule for the first staff member only.
fn base_document() -> ClinicDocument {
    let evelyn = Staff { id: Ulid::new(), name: "Dr. Evelyn Reed".into() };
    let marco = Staff { id: Ulid::new(), name: "Marco Jimenez".into() };
    let swedish = Service {
        id: Ulid::new(),
        name: "Swedish Massage".into(),
        duration_minutes: 60,
        price: 90.0,
    };
    let express = Service {
        id: Ulid::new(),
        name: "Express Neck & Shoulders".into(),
        duration_minutes: 30,
        price: 50.0,
    };
    let mut schedule = WeeklySchedule::new();
    schedule.insert(evelyn.id, WeekdaySet::from([1, 2, 3, 4, 5]));
    schedule.insert(marco.id, WeekdaySet::from([3, 6]));
    ClinicDocument {
        info: ClinicInfo {
            name: "Tranquil Wellness Spa".into(),
            address: "123 Zen Garden".into(),
            hours: "Mon-Fri: 9am - 8pm".into(),
            phone: "555-0101".into(),
        },
        staff: vec![evelyn, marco],
        services: vec![swedish, express],
        faq: Vec::new(),
        weekly_schedule: schedule,
    }
}

async fn seeded_engine(name: &str) -> (Engine, ClinicDocument) {
    let engine = Engine::new(test_wal_path(name)).unwrap();
    let doc = base_document();
    engine.update_clinic(doc.clone()).await.unwrap();
    (engine, doc)
}

// ── Schedule store ───────────────────────────────────────

#[tokio::test]
async fn update_initializes_missing_schedule_entries() {
    let engine = Engine::new(test_wal_path("schedule_default.wal")).unwrap();
    let mut doc = base_document();
    let newcomer = Staff { id: Ulid::new(), name: "Aisha Chen".into() };
    doc.staff.push(newcomer.clone());
    // No schedule entry for the newcomer on purpose.
    engine.update_clinic(doc).await.unwrap();

    let state = engine.clinic().await;
    let entry = state.weekly_schedule.get(&newcomer.id);
    assert_eq!(entry, Some(&WeekdaySet::new()));
}

#[tokio::test]
async fn update_drops_schedule_entries_for_unknown_staff() {
    let engine = Engine::new(test_wal_path("schedule_stale.wal")).unwrap();
    let mut doc = base_document();
    doc.weekly_schedule.insert(Ulid::new(), WeekdaySet::from([1]));
    engine.update_clinic(doc.clone()).await.unwrap();

    let state = engine.clinic().await;
    assert_eq!(state.weekly_schedule.len(), doc.staff.len());
    assert!(state.staff.iter().all(|m| state.weekly_schedule.contains_key(&m.id)));
}

#[tokio::test]
async fn update_rejects_invalid_documents() {
    let engine = Engine::new(test_wal_path("bad_doc.wal")).unwrap();

    let mut no_clinic_name = base_document();
    no_clinic_name.info.name.clear();
    assert!(matches!(
        engine.update_clinic(no_clinic_name).await,
        Err(ClinicError::Validation(_))
    ));

    let mut empty_staff_name = base_document();
    empty_staff_name.staff[0].name.clear();
    assert!(matches!(
        engine.update_clinic(empty_staff_name).await,
        Err(ClinicError::Validation(_))
    ));

    let mut zero_duration = base_document();
    zero_duration.services[0].duration_minutes = 0;
    assert!(matches!(
        engine.update_clinic(zero_duration).await,
        Err(ClinicError::Validation(_))
    ));

    let mut negative_price = base_document();
    negative_price.services[0].price = -1.0;
    assert!(matches!(
        engine.update_clinic(negative_price).await,
        Err(ClinicError::Validation(_))
    ));

    let mut bad_weekday = base_document();
    let staff_id = bad_weekday.staff[0].id;
    bad_weekday.weekly_schedule.insert(staff_id, WeekdaySet::from([7]));
    assert!(matches!(
        engine.update_clinic(bad_weekday).await,
        Err(ClinicError::Validation(_))
    ));

    // Nothing was applied.
    assert!(engine.clinic().await.staff.is_empty());
}

#[tokio::test]
async fn removing_staff_cascades_their_sessions_and_bookings() {
    let (engine, mut doc) = seeded_engine("cascade.wal").await;
    let kept = doc.staff[0].clone();
    let removed = doc.staff[1].clone();
    let svc = doc.services[0].clone();

    engine
        .add_session(kept.id, svc.id, "2024-06-05T09:00:00Z".into())
        .await
        .unwrap();
    engine
        .add_session(removed.id, svc.id, "2024-06-05T09:00:00Z".into())
        .await
        .unwrap();
    let booking = engine
        .create_booking("Ada".into(), svc.id, removed.id, "2024-06-05T14:00:00Z".into())
        .await
        .unwrap();

    doc.staff.retain(|m| m.id != removed.id);
    engine.update_clinic(doc).await.unwrap();

    let state = engine.clinic().await;
    assert_eq!(state.sessions.len(), 1);
    assert_eq!(state.sessions[0].staff_id, kept.id);
    assert!(engine.booking(&booking.id).is_none());
}

// ── Session ledger ───────────────────────────────────────

#[tokio::test]
async fn add_session_requires_known_references() {
    let (engine, doc) = seeded_engine("session_refs.wal").await;
    let svc = doc.services[0].id;
    let member = doc.staff[0].id;

    assert!(matches!(
        engine.add_session(Ulid::new(), svc, "2024-06-05T10:00:00Z".into()).await,
        Err(ClinicError::UnknownStaff(_))
    ));
    assert!(matches!(
        engine.add_session(member, Ulid::new(), "2024-06-05T10:00:00Z".into()).await,
        Err(ClinicError::UnknownService(_))
    ));
}

#[tokio::test]
async fn ledger_accepts_colliding_sessions() {
    let (engine, doc) = seeded_engine("collide.wal").await;
    let member = doc.staff[0].id;
    let svc = doc.services[0].id;

    engine.add_session(member, svc, "2024-06-05T10:00:00Z".into()).await.unwrap();
    engine.add_session(member, svc, "2024-06-05T10:30:00Z".into()).await.unwrap();
    assert_eq!(engine.sessions().await.len(), 2);
}

#[tokio::test]
async fn remove_session_guards() {
    let (engine, doc) = seeded_engine("remove_session.wal").await;
    let member = doc.staff[0].id;
    let svc = doc.services[0].id;

    assert!(matches!(
        engine.remove_session(Ulid::new()).await,
        Err(ClinicError::NotFound(_))
    ));

    let id = engine.add_session(member, svc, "2024-06-05T10:00:00Z".into()).await.unwrap();
    engine.remove_session(id).await.unwrap();
    assert!(engine.sessions().await.is_empty());

    // A booking-paired session may only die through cancel_booking.
    let booking = engine
        .create_booking("Ada".into(), svc, member, "2024-06-05T10:00:00Z".into())
        .await
        .unwrap();
    assert!(matches!(
        engine.remove_session(booking.id).await,
        Err(ClinicError::Validation(_))
    ));
    assert_eq!(engine.sessions().await.len(), 1);
}

// ── Booking writer ───────────────────────────────────────

#[tokio::test]
async fn booking_creates_paired_session_with_same_id() {
    let (engine, doc) = seeded_engine("booking_pair.wal").await;
    let booking = engine
        .create_booking(
            "Ada".into(),
            doc.services[0].id,
            doc.staff[0].id,
            "2024-06-05T10:00:00Z".into(),
        )
        .await
        .unwrap();

    let sessions = engine.sessions().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, booking.id);
    assert_eq!(sessions[0].staff_id, booking.staff_id);
    assert_eq!(sessions[0].start_time, booking.start_time);
    assert_eq!(engine.booking(&booking.id).unwrap(), booking);
}

#[tokio::test]
async fn create_then_cancel_restores_ledger_exactly() {
    let (engine, doc) = seeded_engine("booking_roundtrip.wal").await;
    let member = doc.staff[0].id;
    let svc = doc.services[0].id;
    engine.add_session(member, svc, "2024-06-05T08:00:00Z".into()).await.unwrap();
    let before = engine.sessions().await;

    let booking = engine
        .create_booking("Grace".into(), svc, member, "2024-06-05T10:00:00Z".into())
        .await
        .unwrap();
    assert_eq!(engine.sessions().await.len(), before.len() + 1);

    engine.cancel_booking(booking.id).await.unwrap();
    assert_eq!(engine.sessions().await, before);
    assert!(engine.booking(&booking.id).is_none());
    assert!(engine.list_bookings().is_empty());
}

#[tokio::test]
async fn create_booking_validations() {
    let (engine, doc) = seeded_engine("booking_validate.wal").await;
    let member = doc.staff[0].id;
    let svc = doc.services[0].id;

    assert!(matches!(
        engine.create_booking("".into(), svc, member, "2024-06-05T10:00:00Z".into()).await,
        Err(ClinicError::Validation(_))
    ));
    assert!(matches!(
        engine.create_booking("Ada".into(), svc, member, "next tuesday".into()).await,
        Err(ClinicError::InvalidTimestamp(_))
    ));
    assert!(matches!(
        engine.create_booking("Ada".into(), Ulid::new(), member, "2024-06-05T10:00:00Z".into()).await,
        Err(ClinicError::UnknownService(_))
    ));
    assert!(matches!(
        engine.create_booking("Ada".into(), svc, Ulid::new(), "2024-06-05T10:00:00Z".into()).await,
        Err(ClinicError::UnknownStaff(_))
    ));

    // No partial state from any failed attempt.
    assert!(engine.sessions().await.is_empty());
    assert!(engine.list_bookings().is_empty());
}

#[tokio::test]
async fn cancel_unknown_booking_fails() {
    let (engine, _) = seeded_engine("cancel_unknown.wal").await;
    assert!(matches!(
        engine.cancel_booking(Ulid::new()).await,
        Err(ClinicError::NotFound(_))
    ));
}

#[tokio::test]
async fn list_bookings_is_ordered_by_id() {
    let (engine, doc) = seeded_engine("booking_order.wal").await;
    let member = doc.staff[0].id;
    let svc = doc.services[0].id;

    let mut created = Vec::new();
    for name in ["Ada", "Grace", "Edsger"] {
        created.push(
            engine
                .create_booking(name.into(), svc, member, "2024-06-05T10:00:00Z".into())
                .await
                .unwrap(),
        );
    }
    created.sort_by_key(|b| b.id);
    assert_eq!(engine.list_bookings(), created);
}

// ── Availability through the engine ──────────────────────

#[tokio::test]
async fn availability_respects_schedule_and_occupancy() {
    let (engine, doc) = seeded_engine("availability.wal").await;
    let evelyn = doc.staff[0].id;
    let marco = doc.staff[1].id;
    let swedish = doc.services[0].id; // 60 min

    // Wednesday (weekday 3): both scheduled. Saturday: only Marco.
    let wednesday = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
    let saturday = NaiveDate::from_ymd_opt(2024, 6, 8).unwrap();
    assert_eq!(engine.scheduled_staff_for_day(wednesday).await.len(), 2);
    let on_saturday = engine.scheduled_staff_for_day(saturday).await;
    assert_eq!(on_saturday.len(), 1);
    assert_eq!(on_saturday[0].id, marco);

    engine
        .create_booking("Ada".into(), swedish, evelyn, "2024-06-05T10:00:00Z".into())
        .await
        .unwrap();

    let mid = engine.available_staff(instant("2024-06-05T10:30:00Z")).await;
    assert_eq!(mid.len(), 1);
    assert_eq!(mid[0].id, marco);

    let after = engine.available_staff(instant("2024-06-05T11:00:00Z")).await;
    assert_eq!(after.len(), 2);
}

#[tokio::test]
async fn dangling_service_after_catalog_edit_is_nonblocking() {
    let (engine, mut doc) = seeded_engine("dangling_service.wal").await;
    let evelyn = doc.staff[0].id;
    let swedish = doc.services[0].clone();

    engine
        .add_session(evelyn, swedish.id, "2024-06-05T10:00:00Z".into())
        .await
        .unwrap();
    // Drop the service; the session now dangles but must not block or crash.
    doc.services.retain(|s| s.id != swedish.id);
    engine.update_clinic(doc).await.unwrap();

    assert_eq!(engine.sessions().await.len(), 1);
    let available = engine.available_staff(instant("2024-06-05T10:30:00Z")).await;
    assert!(available.iter().any(|m| m.id == evelyn));
}

// ── Durability ───────────────────────────────────────────

#[tokio::test]
async fn replay_reconstructs_state() {
    let path = test_wal_path("replay.wal");
    let doc = base_document();
    let booking;
    {
        let engine = Engine::new(path.clone()).unwrap();
        engine.update_clinic(doc.clone()).await.unwrap();
        engine
            .add_session(doc.staff[0].id, doc.services[1].id, "2024-06-05T09:00:00Z".into())
            .await
            .unwrap();
        booking = engine
            .create_booking(
                "Ada".into(),
                doc.services[0].id,
                doc.staff[0].id,
                "2024-06-05T10:00:00Z".into(),
            )
            .await
            .unwrap();
        let doomed = engine
            .create_booking(
                "Gone".into(),
                doc.services[0].id,
                doc.staff[1].id,
                "2024-06-05T12:00:00Z".into(),
            )
            .await
            .unwrap();
        engine.cancel_booking(doomed.id).await.unwrap();
    }

    let reopened = Engine::new(path).unwrap();
    let state = reopened.clinic().await;
    assert_eq!(state.info, doc.info);
    assert_eq!(state.staff, doc.staff);
    assert_eq!(state.services, doc.services);
    assert_eq!(state.sessions.len(), 2);
    assert_eq!(reopened.list_bookings(), vec![booking]);
}

#[tokio::test]
async fn compaction_preserves_state_and_order() {
    let path = test_wal_path("compact_engine.wal");
    let engine = Engine::new(path.clone()).unwrap();
    let doc = base_document();
    engine.update_clinic(doc.clone()).await.unwrap();

    engine
        .add_session(doc.staff[0].id, doc.services[0].id, "2024-06-05T08:00:00Z".into())
        .await
        .unwrap();
    engine
        .create_booking(
            "Ada".into(),
            doc.services[0].id,
            doc.staff[0].id,
            "2024-06-05T10:00:00Z".into(),
        )
        .await
        .unwrap();
    // Churn the log, then erase the churn.
    for _ in 0..20 {
        let id = engine
            .add_session(doc.staff[1].id, doc.services[1].id, "2024-06-05T12:00:00Z".into())
            .await
            .unwrap();
        engine.remove_session(id).await.unwrap();
    }

    let before_state = engine.clinic().await;
    let before_bookings = engine.list_bookings();
    assert!(engine.wal_appends_since_compact().await > 40);

    engine.compact_wal().await.unwrap();
    assert_eq!(engine.wal_appends_since_compact().await, 0);

    let reopened = Engine::new(path).unwrap();
    assert_eq!(reopened.clinic().await, before_state);
    assert_eq!(reopened.list_bookings(), before_bookings);
}

// ── Daily report ─────────────────────────────────────────

#[tokio::test]
async fn daily_report_joins_and_totals() {
    let (engine, doc) = seeded_engine("report.wal").await;
    let evelyn = doc.staff[0].id;
    let swedish = &doc.services[0]; // 90.0
    let express = &doc.services[1]; // 50.0

    engine
        .create_booking("Ada".into(), swedish.id, evelyn, "2024-06-05T10:00:00Z".into())
        .await
        .unwrap();
    engine
        .create_booking("Grace".into(), express.id, evelyn, "2024-06-05T14:00:00Z".into())
        .await
        .unwrap();
    // Different day — excluded.
    engine
        .create_booking("Edsger".into(), swedish.id, evelyn, "2024-06-06T10:00:00Z".into())
        .await
        .unwrap();

    let report = engine
        .daily_report(NaiveDate::from_ymd_opt(2024, 6, 5).unwrap())
        .await;
    assert_eq!(report.date, "2024-06-05");
    assert_eq!(report.items.len(), 2);
    assert_eq!(report.total, 140.0);
    assert_eq!(report.items[0].staff_name, "Dr. Evelyn Reed");
    assert_eq!(report.items[0].service_name, "Swedish Massage");
}

#[tokio::test]
async fn daily_report_tolerates_dangling_references() {
    let (engine, mut doc) = seeded_engine("report_dangling.wal").await;
    let marco = doc.staff[1].id;
    let swedish = doc.services[0].clone();
    engine
        .create_booking("Ada".into(), swedish.id, marco, "2024-06-08T10:00:00Z".into())
        .await
        .unwrap();

    // Remove the service after the fact; the booking row falls back to
    // "Unknown"/0 instead of disappearing.
    doc.services.retain(|s| s.id != swedish.id);
    engine.update_clinic(doc).await.unwrap();

    let report = engine
        .daily_report(NaiveDate::from_ymd_opt(2024, 6, 8).unwrap())
        .await;
    assert_eq!(report.items.len(), 1);
    assert_eq!(report.items[0].service_name, "Unknown");
    assert_eq!(report.items[0].price, 0.0);
    assert_eq!(report.total, 0.0);
}
