use std::fmt;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use shared_models::error::AppError;

// ==============================================================================
// COLLECTIONS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Doctors,
    Patients,
    Admins,
    Appointments,
    Notifications,
    SchedulingLocks,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Doctors => "doctors",
            Collection::Patients => "patients",
            Collection::Admins => "admins",
            Collection::Appointments => "appointments",
            Collection::Notifications => "notifications",
            Collection::SchedulingLocks => "scheduling_locks",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==============================================================================
// QUERIES
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    IsNull,
}

impl FilterOp {
    /// PostgREST operator prefix.
    pub fn as_postgrest(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::IsNull => "is",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Conjunction of field filters with optional ordering and limit.
///
/// Used both for reads and as the guard of a conditional write: a guarded
/// update or delete only applies when the stored document matches every
/// filter of the guard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Vec<(String, SortDirection)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, field: &str, op: FilterOp, value: impl Serialize) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op,
            value: serde_json::to_value(value).unwrap_or(Value::Null),
        });
        self
    }

    pub fn eq(self, field: &str, value: impl Serialize) -> Self {
        self.push(field, FilterOp::Eq, value)
    }

    pub fn neq(self, field: &str, value: impl Serialize) -> Self {
        self.push(field, FilterOp::Neq, value)
    }

    pub fn gt(self, field: &str, value: impl Serialize) -> Self {
        self.push(field, FilterOp::Gt, value)
    }

    pub fn gte(self, field: &str, value: impl Serialize) -> Self {
        self.push(field, FilterOp::Gte, value)
    }

    pub fn lt(self, field: &str, value: impl Serialize) -> Self {
        self.push(field, FilterOp::Lt, value)
    }

    pub fn lte(self, field: &str, value: impl Serialize) -> Self {
        self.push(field, FilterOp::Lte, value)
    }

    pub fn is_null(self, field: &str) -> Self {
        self.push(field, FilterOp::IsNull, Value::Null)
    }

    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.order.push((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Invalid {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Document rejected: {0}")]
    Rejected(String),

    #[error("Could not decode document: {0}")]
    Decode(String),

    #[error("Store unreachable: {0}")]
    Unavailable(String),

    #[error("Store is not connected")]
    Disconnected,

    #[error("Store error: {0}")]
    Backend(String),
}

pub const CONNECTION_LOST_MESSAGE: &str = "Database connection lost. Please try again later.";

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(detail) => {
                tracing::warn!("Duplicate key rejected by store: {}", detail);
                AppError::Conflict("Duplicate value detected".to_string())
            }
            StoreError::InvalidValue { field, value } => {
                AppError::Validation(format!("Invalid {}: {}", field, value))
            }
            StoreError::Rejected(message) => AppError::Validation(message),
            StoreError::Disconnected => AppError::ServiceUnavailable(CONNECTION_LOST_MESSAGE.to_string()),
            other => {
                tracing::error!("Persistence failure: {}", other);
                AppError::Persistence("An error occurred".to_string())
            }
        }
    }
}

// ==============================================================================
// STORE CONTRACT
// ==============================================================================

/// Id-keyed document persistence with simple equality/range queries.
///
/// Documents are JSON objects carrying a string `id`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, collection: Collection, document: Value) -> Result<Value, StoreError>;

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError>;

    async fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Value>, StoreError>;

    /// Shallow-merges `patch` into the document. Returns `None` when the
    /// document is absent or does not satisfy `guard`.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Value,
        guard: &Query,
    ) -> Result<Option<Value>, StoreError>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, collection: Collection, id: &str, guard: &Query) -> Result<bool, StoreError>;

    /// Appends `value` to the array `field`. Returns `false` when the document is absent.
    async fn push_reference(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError>;

    /// Removes every occurrence of `value` from the array `field`.
    async fn pull_reference(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Decode(e.to_string()))
}

pub fn encode<T: Serialize>(document: &T) -> Result<Value, StoreError> {
    serde_json::to_value(document).map_err(|e| StoreError::Decode(e.to_string()))
}
