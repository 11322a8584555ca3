use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde_json::{json, Value};
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::store::{Collection, DocumentStore, FilterOp, Query, SortDirection, StoreError};

/// `DocumentStore` over Supabase PostgREST. Array pushes and pulls go
/// through the `append_reference` / `remove_reference` SQL functions so
/// they apply atomically on the server.
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.store_url.trim_end_matches('/').to_string(),
            api_key: config.store_api_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|e| StoreError::Backend(format!("Invalid API key header: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| StoreError::Backend(format!("Invalid API key header: {}", e)))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        Ok(headers)
    }

    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, StoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url).headers(self.get_headers()?);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Store API error ({}): {}", status, error_text);
            return Err(translate_error(status.as_u16(), &error_text));
        }

        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn request_rows(&self, method: Method, path: &str, body: Option<Value>) -> Result<Vec<Value>, StoreError> {
        match self.request(method, path, body).await? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Ok(vec![other]),
        }
    }

    async fn call_reference_rpc(
        &self,
        function: &str,
        collection: Collection,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        let body = json!({
            "table_name": collection.as_str(),
            "row_id": id,
            "field_name": field,
            "ref_value": value,
        });
        let result = self
            .request(Method::POST, &format!("/rest/v1/rpc/{}", function), Some(body))
            .await?;
        Ok(result.as_bool().unwrap_or(false))
    }
}

fn encode_value(value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    urlencoding::encode(&raw).into_owned()
}

/// Renders the filters, ordering and limit of `query` as PostgREST query
/// parameters.
pub fn to_query_string(query: &Query) -> String {
    let mut params: Vec<String> = query
        .filters
        .iter()
        .map(|filter| match filter.op {
            FilterOp::IsNull => format!("{}=is.null", filter.field),
            op => format!("{}={}.{}", filter.field, op.as_postgrest(), encode_value(&filter.value)),
        })
        .collect();

    if !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|(field, direction)| match direction {
                SortDirection::Asc => format!("{}.asc", field),
                SortDirection::Desc => format!("{}.desc", field),
            })
            .collect::<Vec<_>>()
            .join(",");
        params.push(format!("order={}", order));
    }

    if let Some(limit) = query.limit {
        params.push(format!("limit={}", limit));
    }

    params.join("&")
}

fn row_path(collection: Collection, id: &str, guard: &Query) -> String {
    let mut path = format!("/rest/v1/{}?id=eq.{}", collection, urlencoding::encode(id));
    let extra = to_query_string(guard);
    if !extra.is_empty() {
        path.push('&');
        path.push_str(&extra);
    }
    path
}

/// Maps PostgREST failures onto the store taxonomy.
fn translate_error(status: u16, body: &str) -> StoreError {
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let code = parsed.get("code").and_then(Value::as_str).unwrap_or_default();
    let message = parsed
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or(body)
        .to_string();

    match (status, code) {
        (409, _) | (_, "23505") => StoreError::Duplicate(message),
        (_, "22P02") | (_, "22007") => {
            // invalid input syntax for type uuid: "abc"
            let field = message
                .split("type ")
                .nth(1)
                .and_then(|rest| rest.split(':').next())
                .unwrap_or("value")
                .trim()
                .to_string();
            let value = message
                .split('"')
                .nth(1)
                .unwrap_or_default()
                .to_string();
            StoreError::InvalidValue { field, value }
        }
        (400, _) | (422, _) => StoreError::Rejected(message),
        (502..=504, _) => StoreError::Unavailable(message),
        _ => StoreError::Backend(format!("{}: {}", status, message)),
    }
}

#[async_trait]
impl DocumentStore for SupabaseStore {
    async fn insert(&self, collection: Collection, document: Value) -> Result<Value, StoreError> {
        let path = format!("/rest/v1/{}", collection);
        let rows = self.request_rows(Method::POST, &path, Some(document)).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend(format!("Insert into {} returned no row", collection)))
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        let path = row_path(collection, id, &Query::new());
        let rows = self.request_rows(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Value>, StoreError> {
        let params = to_query_string(query);
        let path = if params.is_empty() {
            format!("/rest/v1/{}", collection)
        } else {
            format!("/rest/v1/{}?{}", collection, params)
        };
        self.request_rows(Method::GET, &path, None).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Value,
        guard: &Query,
    ) -> Result<Option<Value>, StoreError> {
        let path = row_path(collection, id, guard);
        let rows = self.request_rows(Method::PATCH, &path, Some(patch)).await?;
        Ok(rows.into_iter().next())
    }

    async fn delete(&self, collection: Collection, id: &str, guard: &Query) -> Result<bool, StoreError> {
        let path = row_path(collection, id, guard);
        let rows = self.request_rows(Method::DELETE, &path, None).await?;
        Ok(!rows.is_empty())
    }

    async fn push_reference(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        self.call_reference_rpc("append_reference", collection, id, field, value)
            .await
    }

    async fn pull_reference(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        self.call_reference_rpc("remove_reference", collection, id, field, value)
            .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.request(Method::GET, "/rest/v1/", None).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_uses_postgrest_operators() {
        let query = Query::new()
            .eq("doctor_id", "d1")
            .gte("scheduled_time", "2025-03-05T09:00:00+00:00")
            .is_null("reminder_sent_at")
            .order_by("scheduled_time", SortDirection::Asc)
            .limit(10);

        assert_eq!(
            to_query_string(&query),
            "doctor_id=eq.d1&scheduled_time=gte.2025-03-05T09%3A00%3A00%2B00%3A00&reminder_sent_at=is.null&order=scheduled_time.asc&limit=10"
        );
    }

    #[test]
    fn cast_errors_name_the_type_and_value() {
        let body = r#"{"code":"22P02","message":"invalid input syntax for type uuid: \"abc\""}"#;
        assert_eq!(
            translate_error(400, body),
            StoreError::InvalidValue {
                field: "uuid".to_string(),
                value: "abc".to_string()
            }
        );
    }

    #[test]
    fn unique_violations_are_duplicates() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#;
        assert_eq!(
            translate_error(409, body),
            StoreError::Duplicate("duplicate key value violates unique constraint".to_string())
        );
    }
}
