use assert_matches::assert_matches;
use uuid::Uuid;

use security_cell::{clinic_capabilities, Action, AuthorizationError, ResourceOwners, ResourceType};
use shared_utils::test_utils::TestUser;

#[test]
fn doctors_manage_their_own_schedule_only() {
    let table = clinic_capabilities();
    let doctor = TestUser::doctor().to_credentials();
    let other_doctor = Uuid::new_v4();

    assert!(table.is_permitted(
        &doctor,
        ResourceType::Doctor,
        Action::Update,
        &ResourceOwners::doctor(doctor.user_id)
    ));
    assert!(!table.is_permitted(
        &doctor,
        ResourceType::Doctor,
        Action::Update,
        &ResourceOwners::doctor(other_doctor)
    ));
    assert!(table.is_permitted(
        &doctor,
        ResourceType::Appointment,
        Action::NotifyUnavailable,
        &ResourceOwners::doctor(doctor.user_id)
    ));
    assert!(!table.is_permitted(
        &doctor,
        ResourceType::Appointment,
        Action::NotifyUnavailable,
        &ResourceOwners::doctor(other_doctor)
    ));
}

#[test]
fn anyone_authenticated_can_browse_doctors() {
    let table = clinic_capabilities();
    let patient = TestUser::patient().to_credentials();

    assert!(table.is_permitted(&patient, ResourceType::Doctor, Action::List, &ResourceOwners::none()));
    assert!(!table.is_permitted(&patient, ResourceType::Doctor, Action::Create, &ResourceOwners::none()));
}

#[test]
fn account_creation_and_deletion_are_admin_only() {
    let table = clinic_capabilities();
    let patient = TestUser::patient().to_credentials();
    let admin = TestUser::admin().to_credentials();
    let own = ResourceOwners::patient(patient.user_id);

    assert!(!table.is_permitted(&patient, ResourceType::Patient, Action::Delete, &own));
    assert!(table.is_permitted(&admin, ResourceType::Patient, Action::Delete, &own));
    assert!(table.is_permitted(&admin, ResourceType::Admin, Action::Update, &ResourceOwners::none()));
}

#[test]
fn notifications_belong_to_their_recipient() {
    let table = clinic_capabilities();
    let doctor = TestUser::doctor().to_credentials();

    assert!(table.is_permitted(
        &doctor,
        ResourceType::Notification,
        Action::Delete,
        &ResourceOwners::user(doctor.user_id)
    ));
    assert_matches!(
        table.authorize(
            &doctor,
            ResourceType::Notification,
            Action::Read,
            &ResourceOwners::user(Uuid::new_v4())
        ),
        Err(AuthorizationError::Denied {
            resource: ResourceType::Notification,
            action: Action::Read
        })
    );
}
