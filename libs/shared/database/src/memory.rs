use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::store::{Collection, DocumentStore, Filter, FilterOp, Query, SortDirection, StoreError};

/// Process-local document store with the same contract as the PostgREST
/// backend. Backs `STORE_BACKEND=memory` and the test suites.
#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Value>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}

fn document_id(document: &Value) -> Option<String> {
    match document.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Orders two JSON scalars. RFC 3339 strings compare as instants so that
/// differently formatted timestamps of the same moment are equal.
fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => {
            match (a.parse::<DateTime<Utc>>(), b.parse::<DateTime<Utc>>()) {
                (Ok(a), Ok(b)) => Some(a.cmp(&b)),
                _ => Some(a.cmp(b)),
            }
        }
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn filter_matches(document: &Value, filter: &Filter) -> bool {
    let field = document.get(&filter.field).unwrap_or(&Value::Null);

    if filter.op == FilterOp::IsNull {
        return field.is_null();
    }
    // SQL semantics: a null column never satisfies a comparison.
    if field.is_null() {
        return false;
    }

    let ordering = compare_values(field, &filter.value);
    match filter.op {
        FilterOp::Eq => ordering == Some(Ordering::Equal),
        FilterOp::Neq => ordering != Some(Ordering::Equal),
        FilterOp::Gt => ordering == Some(Ordering::Greater),
        FilterOp::Gte => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        FilterOp::Lt => ordering == Some(Ordering::Less),
        FilterOp::Lte => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        FilterOp::IsNull => false,
    }
}

fn query_matches(document: &Value, query: &Query) -> bool {
    query.filters.iter().all(|filter| filter_matches(document, filter))
}

fn sort_documents(documents: &mut [Value], order: &[(String, SortDirection)]) {
    documents.sort_by(|a, b| {
        for (field, direction) in order {
            let left = a.get(field).unwrap_or(&Value::Null);
            let right = b.get(field).unwrap_or(&Value::Null);
            let ordering = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => compare_values(left, right).unwrap_or(Ordering::Equal),
            };
            let ordering = match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert(&self, collection: Collection, document: Value) -> Result<Value, StoreError> {
        if !document.is_object() {
            return Err(StoreError::Rejected("Document must be an object".to_string()));
        }
        let id = document_id(&document)
            .ok_or_else(|| StoreError::Rejected("Document is missing an id".to_string()))?;

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if docs.contains_key(&id) {
            return Err(StoreError::Duplicate(format!("{}.id = {}", collection, id)));
        }
        docs.insert(id.clone(), document.clone());
        debug!("Inserted {} into {}", id, collection);
        Ok(document)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .and_then(|docs| docs.get(id).cloned()))
    }

    async fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        let mut matches: Vec<Value> = collections
            .get(&collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| query_matches(doc, query))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        sort_documents(&mut matches, &query.order);
        if let Some(limit) = query.limit {
            matches.truncate(limit);
        }
        Ok(matches)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Value,
        guard: &Query,
    ) -> Result<Option<Value>, StoreError> {
        let Value::Object(fields) = patch else {
            return Err(StoreError::Rejected("Patch must be an object".to_string()));
        };

        let mut collections = self.collections.write().await;
        let Some(document) = collections.get_mut(&collection).and_then(|docs| docs.get_mut(id)) else {
            return Ok(None);
        };
        if !query_matches(document, guard) {
            debug!("Guard rejected update of {} in {}", id, collection);
            return Ok(None);
        }

        if let Value::Object(existing) = document {
            for (key, value) in fields {
                if key != "id" {
                    existing.insert(key, value);
                }
            }
        }
        Ok(Some(document.clone()))
    }

    async fn delete(&self, collection: Collection, id: &str, guard: &Query) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(false);
        };
        match docs.get(id) {
            Some(document) if query_matches(document, guard) => {
                docs.remove(id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn push_reference(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(Value::Object(document)) = collections.get_mut(&collection).and_then(|docs| docs.get_mut(id)) else {
            return Ok(false);
        };

        let entry = document
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if entry.is_null() {
            *entry = Value::Array(Vec::new());
        }
        match entry {
            Value::Array(items) => {
                items.push(Value::String(value.to_string()));
                Ok(true)
            }
            _ => Err(StoreError::InvalidValue {
                field: field.to_string(),
                value: "not an array".to_string(),
            }),
        }
    }

    async fn pull_reference(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(Value::Object(document)) = collections.get_mut(&collection).and_then(|docs| docs.get_mut(id)) else {
            return Ok(false);
        };

        if let Some(Value::Array(items)) = document.get_mut(field) {
            items.retain(|item| item.as_str() != Some(value));
        }
        Ok(true)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
