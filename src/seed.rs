//! Default clinic document installed on first boot (empty WAL), so the admin
//! panel and chat assistant have something to show before anyone edits.

use ulid::Ulid;

use crate::model::*;

pub fn default_clinic() -> ClinicDocument {
    let evelyn = Staff { id: Ulid::new(), name: "Dr. Evelyn Reed".into() };
    let marco = Staff { id: Ulid::new(), name: "Marco Jimenez (RMT)".into() };
    let aisha = Staff { id: Ulid::new(), name: "Aisha Chen (Acupuncturist)".into() };

    let mut weekly_schedule = WeeklySchedule::new();
    weekly_schedule.insert(evelyn.id, WeekdaySet::from([1, 2, 3, 4, 5]));
    weekly_schedule.insert(marco.id, WeekdaySet::from([1, 3, 5, 6]));
    weekly_schedule.insert(aisha.id, WeekdaySet::from([2, 4, 6]));

    ClinicDocument {
        info: ClinicInfo {
            name: "Tranquil Wellness Spa".into(),
            address: "123 Zen Garden, Serenity City, SC 12345".into(),
            hours: "Mon-Fri: 9am - 8pm, Sat: 10am - 6pm, Sun: Closed".into(),
            phone: "555-0101".into(),
        },
        staff: vec![evelyn, marco, aisha],
        services: vec![
            Service {
                id: Ulid::new(),
                name: "Swedish Massage".into(),
                duration_minutes: 60,
                price: 90.0,
            },
            Service {
                id: Ulid::new(),
                name: "Deep Tissue Massage".into(),
                duration_minutes: 60,
                price: 110.0,
            },
            Service {
                id: Ulid::new(),
                name: "Hot Stone Massage".into(),
                duration_minutes: 90,
                price: 140.0,
            },
            Service {
                id: Ulid::new(),
                name: "Express Neck & Shoulders".into(),
                duration_minutes: 30,
                price: 50.0,
            },
        ],
        faq: vec![
            Faq {
                id: Ulid::new(),
                question: "Do you offer couple massages?".into(),
                answer: "Yes, we have a dedicated suite for couple massages. Please book \
                         in advance to ensure availability."
                    .into(),
            },
            Faq {
                id: Ulid::new(),
                question: "What is your cancellation policy?".into(),
                answer: "We require a 24-hour notice for any cancellations or rescheduling. \
                         A fee may apply for late cancellations."
                    .into(),
            },
            Faq {
                id: Ulid::new(),
                question: "What is deep tissue massage?".into(),
                answer: "Deep tissue massage is mainly used to treat musculoskeletal issues, \
                         such as strains and sports injuries, applying sustained pressure with \
                         slow, deep strokes to the inner layers of muscle and connective tissue."
                    .into(),
            },
        ],
        weekly_schedule,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_document_is_valid_and_fully_scheduled() {
        let doc = default_clinic();
        assert!(!doc.info.name.is_empty());
        assert!(!doc.staff.is_empty());
        assert!(doc.services.iter().all(|s| s.duration_minutes > 0 && s.price >= 0.0));
        // Every staff member has a schedule entry with in-range weekdays.
        for member in &doc.staff {
            let days = doc.weekly_schedule.get(&member.id).unwrap();
            assert!(days.iter().all(|d| *d <= 6));
        }
    }
}
