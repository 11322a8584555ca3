use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::{AuthFailure, Credentials, JwtClaims, JwtHeader, Role};

type HmacSha256 = Hmac<Sha256>;

/// Verifies HS256 access tokens and turns them into `Credentials`.
///
/// Token issuance lives elsewhere; this side only checks the signature,
/// expiry and the `sub`/`role` claims.
#[derive(Debug, Clone)]
pub struct AuthenticationService {
    secret: String,
}

impl AuthenticationService {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    pub fn authenticate(&self, token: Option<&str>) -> Result<Credentials, AuthFailure> {
        let token = token.map(str::trim).filter(|t| !t.is_empty()).ok_or(AuthFailure::MissingToken)?;
        self.verify(token)
    }

    fn verify(&self, token: &str) -> Result<Credentials, AuthFailure> {
        if self.secret.is_empty() {
            debug!("JWT secret is not set, rejecting token");
            return Err(AuthFailure::InvalidSignature);
        }

        let parts: Vec<&str> = token.split('.').collect();
        let [header_b64, claims_b64, signature_b64] = parts.as_slice() else {
            return Err(AuthFailure::Malformed("expected three segments".to_string()));
        };

        let header: JwtHeader = decode_segment(header_b64)?;
        if header.alg != "HS256" {
            return Err(AuthFailure::Malformed(format!("unsupported algorithm {}", header.alg)));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthFailure::Malformed("invalid signature encoding".to_string()))?;

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| AuthFailure::InvalidSignature)?;
        mac.update(format!("{}.{}", header_b64, claims_b64).as_bytes());
        if mac.verify_slice(&signature).is_err() {
            debug!("Token signature verification failed");
            return Err(AuthFailure::InvalidSignature);
        }

        let claims: JwtClaims = decode_segment(claims_b64)?;

        if let Some(exp) = claims.exp {
            let now = chrono::Utc::now().timestamp().max(0) as u64;
            if exp < now {
                debug!("Token expired at {} (now: {})", exp, now);
                return Err(AuthFailure::Expired);
            }
        }

        let subject = claims.sub.ok_or(AuthFailure::MissingClaims("sub"))?;
        let user_id = Uuid::parse_str(&subject)
            .map_err(|_| AuthFailure::Malformed(format!("subject '{}' is not a uuid", subject)))?;
        let role: Role = claims.role.ok_or(AuthFailure::MissingClaims("role"))?.parse()?;

        debug!("Token validated successfully for {} {}", role, user_id);
        Ok(Credentials::new(user_id, role))
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, AuthFailure> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthFailure::Malformed("invalid base64 segment".to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        debug!("Failed to parse token segment: {}", e);
        AuthFailure::Malformed("invalid segment json".to_string())
    })
}
