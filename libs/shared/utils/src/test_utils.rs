use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::{AppConfig, StoreBackend};
use shared_database::{InMemoryStore, StoreConnection};
use shared_models::auth::{Credentials, Role};

use crate::state::AppState;

pub struct TestConfig {
    pub jwt_secret: String,
    pub store_url: String,
    pub store_api_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            store_url: "http://localhost:54321".to_string(),
            store_api_key: "test-api-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            store_url: self.store_url.clone(),
            store_api_key: self.store_api_key.clone(),
            store_backend: StoreBackend::Memory,
            jwt_secret: self.jwt_secret.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }

    /// Router state backed by `store`, already connected.
    pub fn memory_state(&self, store: Arc<InMemoryStore>) -> AppState {
        AppState::new(self.to_arc(), StoreConnection::with_store(store))
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub role: String,
}

impl TestUser {
    pub fn new(role: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: role.to_string(),
        }
    }

    pub fn with_id(id: Uuid, role: &str) -> Self {
        Self {
            id,
            role: role.to_string(),
        }
    }

    pub fn doctor() -> Self {
        Self::new("Doctor")
    }

    pub fn patient() -> Self {
        Self::new("Patient")
    }

    pub fn admin() -> Self {
        Self::new("Admin")
    }

    pub fn to_credentials(&self) -> Credentials {
        let role = self.role.parse().unwrap_or(Role::Patient);
        Credentials::new(self.id, role)
    }

    pub fn bearer(&self, secret: &str) -> String {
        format!("Bearer {}", JwtTestUtils::create_test_token(self, secret, Some(24)))
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "id": user.id,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default().to_app_config();

        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert!(config.is_configured());
    }

    #[test]
    fn test_user_credentials() {
        let user = TestUser::doctor();
        let credentials = user.to_credentials();

        assert_eq!(credentials.user_id, user.id);
        assert_eq!(credentials.role, Role::Doctor);
    }

    #[test]
    fn test_jwt_token_creation() {
        let token = JwtTestUtils::create_test_token(&TestUser::admin(), "test-secret", Some(1));
        assert_eq!(token.split('.').count(), 3);
    }
}
