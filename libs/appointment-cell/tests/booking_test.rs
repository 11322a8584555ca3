mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Duration;
use serde_json::json;
use uuid::Uuid;

use admin_cell::models::CreateAdminRequest;
use admin_cell::AdminService;
use appointment_cell::{AppointmentError, AppointmentStatus, BookAppointmentRequest, BookingService};
use shared_config::ConflictPolicy;
use shared_database::{Collection, DocumentStore, InMemoryStore};
use shared_models::auth::{Credentials, Role};

use common::*;

fn booking(doctor_id: Uuid, patient_id: Uuid, at: chrono::DateTime<chrono::Utc>) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_id,
        patient_id,
        scheduled_time: at,
        notes: "Annual check-up".to_string(),
    }
}

async fn setup() -> (Arc<InMemoryStore>, BookingService, Uuid, Uuid, Credentials) {
    let store = Arc::new(InMemoryStore::new());
    let doctor_id = seed_doctor(&store).await;
    let patient_id = seed_account(&store, Collection::Patients).await;
    let service = BookingService::new(store.clone(), &config());
    let requester = Credentials::new(patient_id, Role::Patient);
    (store, service, doctor_id, patient_id, requester)
}

#[tokio::test]
async fn same_instant_cannot_be_booked_twice() {
    let (_, service, doctor_id, patient_id, requester) = setup().await;
    let t = wednesday_utc(8, 0);

    service.book(&requester, booking(doctor_id, patient_id, t)).await.unwrap();
    let second = service.book(&requester, booking(doctor_id, patient_id, t)).await;

    assert_matches!(second, Err(AppointmentError::SlotUnavailable(_)));
}

#[tokio::test]
async fn bookings_inside_the_window_clash_and_outside_succeed() {
    let (_, service, doctor_id, patient_id, requester) = setup().await;
    let t = wednesday_utc(8, 0);

    service.book(&requester, booking(doctor_id, patient_id, t)).await.unwrap();

    let inside = service
        .book(&requester, booking(doctor_id, patient_id, t + Duration::minutes(45)))
        .await;
    assert_matches!(inside, Err(AppointmentError::SlotUnavailable(_)));

    let outside = service
        .book(&requester, booking(doctor_id, patient_id, t + Duration::minutes(95)))
        .await
        .unwrap();
    assert_eq!(outside.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn earlier_overlapping_booking_is_also_a_clash() {
    let (_, service, doctor_id, patient_id, requester) = setup().await;
    let t = wednesday_utc(10, 0);

    service.book(&requester, booking(doctor_id, patient_id, t)).await.unwrap();
    let earlier = service
        .book(&requester, booking(doctor_id, patient_id, t - Duration::minutes(60)))
        .await;

    assert_matches!(earlier, Err(AppointmentError::SlotUnavailable(_)));
}

#[tokio::test]
async fn legacy_policy_ignores_appointments_already_under_way() {
    let store = Arc::new(InMemoryStore::new());
    let doctor_id = seed_doctor(&store).await;
    let patient_id = seed_account(&store, Collection::Patients).await;
    let requester = Credentials::new(patient_id, Role::Patient);
    let legacy = shared_config::AppConfig {
        conflict_policy: ConflictPolicy::Legacy,
        ..config()
    };
    let service = BookingService::new(store.clone(), &legacy);
    let t = wednesday_utc(10, 0);

    service.book(&requester, booking(doctor_id, patient_id, t)).await.unwrap();
    let during = service
        .book(&requester, booking(doctor_id, patient_id, t + Duration::minutes(45)))
        .await;

    assert!(during.is_ok());
}

#[tokio::test]
async fn cancelled_appointments_free_their_slot() {
    let (store, service, doctor_id, patient_id, requester) = setup().await;
    let t = wednesday_utc(8, 0);
    seed_appointment(&store, doctor_id, patient_id, t, AppointmentStatus::Cancelled).await;

    assert!(service.book(&requester, booking(doctor_id, patient_id, t)).await.is_ok());
}

#[tokio::test]
async fn slot_outside_availability_is_rejected() {
    let (_, service, doctor_id, patient_id, requester) = setup().await;

    // 16:00 UTC is 18:00 in Johannesburg, after the 17:00 close.
    let late = service
        .book(&requester, booking(doctor_id, patient_id, wednesday_utc(16, 0)))
        .await;
    assert_matches!(late, Err(AppointmentError::SlotUnavailable(_)));

    let thursday = service
        .book(&requester, booking(doctor_id, patient_id, wednesday_utc(8, 0) + Duration::days(1)))
        .await;
    assert_matches!(thursday, Err(AppointmentError::SlotUnavailable(_)));
}

#[tokio::test]
async fn missing_participants_are_not_found() {
    let (_, service, doctor_id, patient_id, requester) = setup().await;
    let t = wednesday_utc(8, 0);

    let no_doctor = service.book(&requester, booking(Uuid::new_v4(), patient_id, t)).await;
    assert_matches!(no_doctor, Err(AppointmentError::DoctorNotFound));

    let no_patient = service.book(&requester, booking(doctor_id, Uuid::new_v4(), t)).await;
    assert_matches!(no_patient, Err(AppointmentError::PatientNotFound));
}

#[tokio::test]
async fn blank_notes_are_rejected() {
    let (_, service, doctor_id, patient_id, requester) = setup().await;
    let mut request = booking(doctor_id, patient_id, wednesday_utc(8, 0));
    request.notes = "   ".to_string();

    assert_matches!(
        service.book(&requester, request).await,
        Err(AppointmentError::Validation(_))
    );
}

#[tokio::test]
async fn booking_is_indexed_and_both_parties_notified() {
    let (store, service, doctor_id, patient_id, requester) = setup().await;

    let appointment = service
        .book(&requester, booking(doctor_id, patient_id, wednesday_utc(8, 0)))
        .await
        .unwrap();

    assert!(appointment.admin_id.is_none());
    let id = json!(appointment.id.to_string());
    assert_eq!(references(&store, Collection::Doctors, doctor_id).await, vec![id.clone()]);
    assert_eq!(references(&store, Collection::Patients, patient_id).await, vec![id]);

    assert_eq!(notifications_for(&store, doctor_id).await.len(), 1);
    assert_eq!(notifications_for(&store, patient_id).await.len(), 1);
    assert_eq!(store.count(Collection::SchedulingLocks).await, 0);
}

#[tokio::test]
async fn admin_bookings_are_stamped_and_indexed_on_the_admin() {
    let (store, service, doctor_id, patient_id, _) = setup().await;
    let admin_id = seed_account(&store, Collection::Admins).await;
    let admin = Credentials::new(admin_id, Role::Admin);

    let appointment = service
        .book(&admin, booking(doctor_id, patient_id, wednesday_utc(8, 0)))
        .await
        .unwrap();

    assert_eq!(appointment.admin_id, Some(admin_id));
    assert_eq!(
        references(&store, Collection::Admins, admin_id).await,
        vec![json!(appointment.id.to_string())]
    );
}

#[tokio::test]
async fn admins_registered_through_their_cell_can_book() {
    let (store, service, doctor_id, patient_id, _) = setup().await;
    let admin_id = Uuid::new_v4();
    AdminService::new(store.clone())
        .create_admin(CreateAdminRequest {
            id: Some(admin_id),
            full_name: Some("Front desk".to_string()),
            managed_doctors: vec![doctor_id],
            managed_patients: vec![patient_id],
        })
        .await
        .unwrap();

    let appointment = service
        .book(
            &Credentials::new(admin_id, Role::Admin),
            booking(doctor_id, patient_id, wednesday_utc(8, 0)),
        )
        .await
        .unwrap();

    let admin = AdminService::new(store).get_admin(admin_id).await.unwrap();
    assert_eq!(admin.appointments, vec![appointment.id]);
}

#[tokio::test]
async fn failed_propagation_is_rolled_back() {
    let memory = Arc::new(InMemoryStore::new());
    let doctor_id = seed_doctor(&memory).await;
    let patient_id = seed_account(&memory, Collection::Patients).await;
    let admin_id = seed_account(&memory, Collection::Admins).await;
    let store = Arc::new(AdminIndexFailure { inner: memory.clone() });
    let service = BookingService::new(store, &config());

    let result = service
        .book(
            &Credentials::new(admin_id, Role::Admin),
            booking(doctor_id, patient_id, wednesday_utc(8, 0)),
        )
        .await;

    assert_matches!(result, Err(AppointmentError::PropagationFailed(_)));
    assert_eq!(memory.count(Collection::Appointments).await, 0);
    assert!(references(&memory, Collection::Doctors, doctor_id).await.is_empty());
    assert!(references(&memory, Collection::Patients, patient_id).await.is_empty());
    assert!(notifications_for(&memory, patient_id).await.is_empty());
    assert_eq!(memory.count(Collection::SchedulingLocks).await, 0);
}

#[tokio::test]
async fn notification_failures_do_not_undo_a_booking() {
    let (store, _, doctor_id, patient_id, requester) = setup().await;
    let service = BookingService::new(store.clone(), &config()).with_notifier(Arc::new(FailingSink));

    let appointment = service
        .book(&requester, booking(doctor_id, patient_id, wednesday_utc(8, 0)))
        .await
        .unwrap();

    let stored = store
        .get(Collection::Appointments, &appointment.id.to_string())
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn listings_are_ordered_by_time() {
    let (store, service, doctor_id, patient_id, _) = setup().await;
    let later = seed_appointment(&store, doctor_id, patient_id, wednesday_utc(12, 0), AppointmentStatus::Scheduled).await;
    let earlier = seed_appointment(&store, doctor_id, patient_id, wednesday_utc(8, 0), AppointmentStatus::Scheduled).await;

    let ids: Vec<Uuid> = service
        .list_for_doctor(doctor_id)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(ids, vec![earlier, later]);

    assert!(service.list_for_patient(Uuid::new_v4()).await.unwrap().is_empty());
}

// ==============================================================================
// DELETION
// ==============================================================================

#[tokio::test]
async fn deleting_a_missing_appointment_is_not_found_and_silent() {
    let (store, service, _, _, _) = setup().await;

    assert_matches!(
        service.delete_appointment(Uuid::new_v4()).await,
        Err(AppointmentError::NotFound)
    );
    assert_eq!(store.count(Collection::Notifications).await, 0);
}

#[tokio::test]
async fn deletion_retracts_references_and_tells_the_patient() {
    let (store, service, doctor_id, patient_id, _) = setup().await;
    let admin_id = seed_account(&store, Collection::Admins).await;
    let appointment = service
        .book(
            &Credentials::new(admin_id, Role::Admin),
            booking(doctor_id, patient_id, wednesday_utc(8, 0)),
        )
        .await
        .unwrap();

    service.delete_appointment(appointment.id).await.unwrap();

    assert_eq!(store.count(Collection::Appointments).await, 0);
    assert!(references(&store, Collection::Doctors, doctor_id).await.is_empty());
    assert!(references(&store, Collection::Patients, patient_id).await.is_empty());
    assert!(references(&store, Collection::Admins, admin_id).await.is_empty());

    let messages: Vec<String> = notifications_for(&store, patient_id)
        .await
        .into_iter()
        .map(|n| n.message)
        .collect();
    assert!(messages.contains(&notification_cell::models::messages::DELETED.to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_bookings_for_one_slot_admit_exactly_one() {
    let (store, service, doctor_id, patient_id, requester) = setup().await;
    let other_patient = seed_account(&store, Collection::Patients).await;
    let other = Credentials::new(other_patient, Role::Patient);
    let t = wednesday_utc(9, 0);

    let (first, second) = tokio::join!(
        service.book(&requester, booking(doctor_id, patient_id, t)),
        service.book(&other, booking(doctor_id, other_patient, t)),
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let refused = results.into_iter().find_map(Result::err);
    assert_matches!(
        refused,
        Some(AppointmentError::SlotUnavailable(_) | AppointmentError::SchedulingBusy)
    );
    assert_eq!(store.count(Collection::Appointments).await, 1);
    assert_eq!(store.count(Collection::SchedulingLocks).await, 0);
}
