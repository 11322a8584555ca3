use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Datelike, Duration, NaiveTime, TimeZone, Utc, Weekday};
use uuid::Uuid;

use doctor_cell::models::CreateDoctorRequest;
use doctor_cell::{AvailabilityService, DayAvailability, DayOfWeek, DoctorError, DoctorService, TimeSlot};
use shared_database::InMemoryStore;

const CLINIC_TZ: chrono_tz::Tz = chrono_tz::Africa::Johannesburg;

async fn wednesday_doctor(store: Arc<InMemoryStore>) -> Uuid {
    let doctor = DoctorService::new(store)
        .create_doctor(CreateDoctorRequest {
            id: None,
            full_name: Some("Dr. Naidoo".to_string()),
            specialty: "General Practice".to_string(),
            availability: vec![DayAvailability {
                day: DayOfWeek::Wednesday,
                time_slots: vec![TimeSlot::new("09:00", "10:30")],
            }],
        })
        .await
        .unwrap();
    doctor.id
}

#[tokio::test]
async fn wednesday_slot_matches_only_wednesday_mornings_in_clinic_time() {
    let store = Arc::new(InMemoryStore::new());
    let doctor_id = wednesday_doctor(store.clone()).await;
    let resolver = AvailabilityService::new(store, CLINIC_TZ);

    let open = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    let close = NaiveTime::from_hms_opt(10, 30, 0).unwrap();

    // Sweep one full week in 15 minute steps.
    let mut instant = Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap();
    let end = instant + Duration::days(7);
    let mut hits = 0;
    while instant < end {
        let local = instant.with_timezone(&CLINIC_TZ);
        let expected = local.weekday() == Weekday::Wed && local.time() >= open && local.time() < close;

        let actual = resolver.is_available(doctor_id, instant).await.unwrap();
        assert_eq!(actual, expected, "mismatch at {}", instant);
        if actual {
            hits += 1;
        }
        instant += Duration::minutes(15);
    }

    // 09:00, 09:15, ... 10:15
    assert_eq!(hits, 6);
}

#[tokio::test]
async fn utc_clock_is_not_used_for_the_time_of_day() {
    let store = Arc::new(InMemoryStore::new());
    let doctor_id = wednesday_doctor(store.clone()).await;
    let resolver = AvailabilityService::new(store, CLINIC_TZ);

    // 09:30 UTC is 11:30 in Johannesburg, outside the slot.
    let utc_nine_thirty = Utc.with_ymd_and_hms(2025, 3, 5, 9, 30, 0).unwrap();
    assert!(!resolver.is_available(doctor_id, utc_nine_thirty).await.unwrap());

    // 07:30 UTC is 09:30 local.
    let local_nine_thirty = Utc.with_ymd_and_hms(2025, 3, 5, 7, 30, 0).unwrap();
    assert!(resolver.is_available(doctor_id, local_nine_thirty).await.unwrap());
}

#[tokio::test]
async fn unknown_doctor_is_not_found() {
    let resolver = AvailabilityService::new(Arc::new(InMemoryStore::new()), CLINIC_TZ);

    assert_matches!(
        resolver.is_available(Uuid::new_v4(), Utc::now()).await,
        Err(DoctorError::NotFound)
    );
}

#[tokio::test]
async fn doctor_without_that_weekday_is_simply_unavailable() {
    let store = Arc::new(InMemoryStore::new());
    let doctor_id = wednesday_doctor(store.clone()).await;
    let resolver = AvailabilityService::new(store, CLINIC_TZ);

    // Thursday 09:30 local.
    let thursday = Utc.with_ymd_and_hms(2025, 3, 6, 7, 30, 0).unwrap();
    assert!(!resolver.is_available(doctor_id, thursday).await.unwrap());
}
