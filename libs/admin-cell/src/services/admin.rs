use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use security_cell::ValidationService;
use shared_database::{decode, encode, Collection, DocumentStore, Query, SortDirection};

use crate::models::{Admin, AdminError, CreateAdminRequest, UpdateAdminRequest};

pub struct AdminService {
    store: Arc<dyn DocumentStore>,
}

impl AdminService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create_admin(&self, request: CreateAdminRequest) -> Result<Admin, AdminError> {
        let full_name = request
            .full_name
            .as_deref()
            .map(|name| ValidationService::require_text(name, "fullName"))
            .transpose()?;
        self.ensure_accounts(Collection::Doctors, &request.managed_doctors).await?;
        self.ensure_accounts(Collection::Patients, &request.managed_patients).await?;

        let now = Utc::now();
        let admin = Admin {
            id: request.id.unwrap_or_else(Uuid::new_v4),
            full_name,
            managed_doctors: request.managed_doctors,
            managed_patients: request.managed_patients,
            appointments: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.insert(Collection::Admins, encode(&admin)?).await?;
        info!("Created admin {}", admin.id);
        Ok(decode(stored)?)
    }

    pub async fn list_admins(&self) -> Result<Vec<Admin>, AdminError> {
        let query = Query::new().order_by("created_at", SortDirection::Asc);
        let admins = self
            .store
            .find(Collection::Admins, &query)
            .await?
            .into_iter()
            .map(decode::<Admin>)
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Listed {} admins", admins.len());
        Ok(admins)
    }

    pub async fn get_admin(&self, admin_id: Uuid) -> Result<Admin, AdminError> {
        let row = self
            .store
            .get(Collection::Admins, &admin_id.to_string())
            .await?
            .ok_or(AdminError::NotFound)?;
        Ok(decode(row)?)
    }

    pub async fn update_admin(&self, admin_id: Uuid, mut request: UpdateAdminRequest) -> Result<Admin, AdminError> {
        if let Some(name) = request.full_name.as_deref() {
            request.full_name = Some(ValidationService::require_text(name, "fullName")?);
        }
        if let Some(doctors) = &request.managed_doctors {
            self.ensure_accounts(Collection::Doctors, doctors).await?;
        }
        if let Some(patients) = &request.managed_patients {
            self.ensure_accounts(Collection::Patients, patients).await?;
        }

        let mut patch = encode(&request)?;
        if let Value::Object(fields) = &mut patch {
            fields.insert("updated_at".to_string(), encode(&Utc::now())?);
        }

        let updated = self
            .store
            .update(Collection::Admins, &admin_id.to_string(), patch, &Query::new())
            .await?
            .ok_or(AdminError::NotFound)?;

        info!("Updated admin {}", admin_id);
        Ok(decode(updated)?)
    }

    pub async fn delete_admin(&self, admin_id: Uuid) -> Result<(), AdminError> {
        let deleted = self
            .store
            .delete(Collection::Admins, &admin_id.to_string(), &Query::new())
            .await?;
        if !deleted {
            return Err(AdminError::NotFound);
        }
        info!("Deleted admin {}", admin_id);
        Ok(())
    }

    async fn ensure_accounts(&self, collection: Collection, ids: &[Uuid]) -> Result<(), AdminError> {
        let kind = match collection {
            Collection::Doctors => "Doctor",
            _ => "Patient",
        };
        for id in ids {
            if self.store.get(collection, &id.to_string()).await?.is_none() {
                return Err(AdminError::UnknownAccount { kind, id: *id });
            }
        }
        Ok(())
    }
}
