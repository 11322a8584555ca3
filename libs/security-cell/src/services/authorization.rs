// =====================================================================================
// AUTHORIZATION SERVICE - CAPABILITY TABLE
// =====================================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::debug;

use shared_models::auth::{Credentials, Role};

use crate::models::{Action, AuthorizationError, ResourceOwners, ResourceType};

/// Decides whether a non-admin requester may act on a record.
pub type Predicate = fn(&Credentials, &ResourceOwners) -> bool;

/// Rules keyed by `(resource type, action)`. Admins are always permitted;
/// a pair without a rule denies everyone else.
#[derive(Clone, Default)]
pub struct CapabilityTable {
    rules: HashMap<(ResourceType, Action), Predicate>,
}

// =====================================================================================
// PREDICATES
// =====================================================================================

pub fn is_participant(requester: &Credentials, owners: &ResourceOwners) -> bool {
    is_doctor_on_record(requester, owners) || is_patient_on_record(requester, owners)
}

pub fn is_doctor_on_record(requester: &Credentials, owners: &ResourceOwners) -> bool {
    requester.role == Role::Doctor && owners.doctor_id == Some(requester.user_id)
}

pub fn is_patient_on_record(requester: &Credentials, owners: &ResourceOwners) -> bool {
    requester.role == Role::Patient && owners.patient_id == Some(requester.user_id)
}

pub fn is_doctor(requester: &Credentials, _: &ResourceOwners) -> bool {
    requester.role == Role::Doctor
}

pub fn is_owning_user(requester: &Credentials, owners: &ResourceOwners) -> bool {
    owners.user_id == Some(requester.user_id)
}

pub fn any_authenticated(_: &Credentials, _: &ResourceOwners) -> bool {
    true
}

impl CapabilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, resource: ResourceType, action: Action, predicate: Predicate) -> Self {
        self.rules.insert((resource, action), predicate);
        self
    }

    pub fn clinic_defaults() -> Self {
        use Action::*;
        use ResourceType::*;

        Self::new()
            .allow(Appointment, Create, is_participant)
            .allow(Appointment, Read, is_participant)
            .allow(Appointment, List, is_participant)
            .allow(Appointment, Update, is_doctor_on_record)
            .allow(Appointment, NotifyUnavailable, is_doctor_on_record)
            .allow(Doctor, Read, any_authenticated)
            .allow(Doctor, List, any_authenticated)
            .allow(Doctor, Update, is_doctor_on_record)
            .allow(Doctor, ListPatients, is_doctor_on_record)
            .allow(Patient, List, is_doctor)
            .allow(Patient, Read, is_patient_on_record)
            .allow(Patient, Update, is_patient_on_record)
            .allow(Notification, Read, is_owning_user)
            .allow(Notification, List, is_owning_user)
            .allow(Notification, Update, is_owning_user)
            .allow(Notification, Delete, is_owning_user)
    }

    pub fn is_permitted(
        &self,
        requester: &Credentials,
        resource: ResourceType,
        action: Action,
        owners: &ResourceOwners,
    ) -> bool {
        if requester.is_admin() {
            return true;
        }
        self.rules
            .get(&(resource, action))
            .map(|predicate| predicate(requester, owners))
            .unwrap_or(false)
    }

    pub fn authorize(
        &self,
        requester: &Credentials,
        resource: ResourceType,
        action: Action,
        owners: &ResourceOwners,
    ) -> Result<(), AuthorizationError> {
        if self.is_permitted(requester, resource, action, owners) {
            return Ok(());
        }
        debug!(
            "Denied {:?} on {:?} for {} {}",
            action, resource, requester.role, requester.user_id
        );
        Err(AuthorizationError::Denied { resource, action })
    }
}

/// Process-wide table with the clinic's default rules.
pub fn clinic_capabilities() -> &'static CapabilityTable {
    static TABLE: OnceLock<CapabilityTable> = OnceLock::new();
    TABLE.get_or_init(CapabilityTable::clinic_defaults)
}
