use std::env;
use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Africa::Johannesburg;

/// Which persistence backend `StoreConnection::connect` builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Supabase,
    Memory,
}

/// How the conflict detector treats an existing appointment near the
/// requested instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Any appointment whose occupied window intersects the requested one.
    Overlap,
    /// Only appointments strictly inside `(t, t + duration)`.
    Legacy,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_url: String,
    pub store_api_key: String,
    pub store_backend: StoreBackend,
    pub jwt_secret: String,
    pub reference_timezone: Tz,
    pub appointment_duration_minutes: i64,
    pub reminder_window_hours: i64,
    pub conflict_policy: ConflictPolicy,
    pub scheduling_lock_ttl_seconds: i64,
    pub scheduling_lock_max_attempts: u32,
    pub port: u16,
    pub frontend_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_url: String::new(),
            store_api_key: String::new(),
            store_backend: StoreBackend::Supabase,
            jwt_secret: String::new(),
            reference_timezone: DEFAULT_TIMEZONE,
            appointment_duration_minutes: 90,
            reminder_window_hours: 24,
            conflict_policy: ConflictPolicy::Overlap,
            scheduling_lock_ttl_seconds: 30,
            scheduling_lock_max_attempts: 3,
            port: 5000,
            frontend_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            store_url: env::var("STORE_URL").unwrap_or_else(|_| {
                warn!("STORE_URL not set, using empty value");
                String::new()
            }),
            store_api_key: env::var("STORE_API_KEY").unwrap_or_else(|_| {
                warn!("STORE_API_KEY not set, using empty value");
                String::new()
            }),
            store_backend: match env::var("STORE_BACKEND").as_deref() {
                Ok("memory") => StoreBackend::Memory,
                Ok("supabase") | Err(_) => StoreBackend::Supabase,
                Ok(other) => {
                    warn!("Unknown STORE_BACKEND '{}', using supabase", other);
                    StoreBackend::Supabase
                }
            },
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                warn!("JWT_SECRET not set, every token will be rejected");
                String::new()
            }),
            reference_timezone: match env::var("CLINIC_TIMEZONE") {
                Ok(name) => Tz::from_str(&name).unwrap_or_else(|e| {
                    warn!("Invalid CLINIC_TIMEZONE '{}' ({}), using {}", name, e, DEFAULT_TIMEZONE);
                    DEFAULT_TIMEZONE
                }),
                Err(_) => {
                    warn!("CLINIC_TIMEZONE not set, using {}", DEFAULT_TIMEZONE);
                    DEFAULT_TIMEZONE
                }
            },
            appointment_duration_minutes: parse_var(
                "APPOINTMENT_DURATION_MINUTES",
                defaults.appointment_duration_minutes,
            ),
            reminder_window_hours: parse_var("REMINDER_WINDOW_HOURS", defaults.reminder_window_hours),
            conflict_policy: match env::var("CONFLICT_POLICY").as_deref() {
                Ok("legacy") => ConflictPolicy::Legacy,
                Ok("overlap") | Err(_) => ConflictPolicy::Overlap,
                Ok(other) => {
                    warn!("Unknown CONFLICT_POLICY '{}', using overlap", other);
                    ConflictPolicy::Overlap
                }
            },
            scheduling_lock_ttl_seconds: parse_var(
                "SCHEDULING_LOCK_TTL_SECONDS",
                defaults.scheduling_lock_ttl_seconds,
            ),
            scheduling_lock_max_attempts: parse_var(
                "SCHEDULING_LOCK_MAX_ATTEMPTS",
                defaults.scheduling_lock_max_attempts,
            ),
            port: parse_var("PORT", defaults.port),
            frontend_url: env::var("FRONTEND_URL").ok().filter(|url| !url.is_empty()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        let store_ready = match self.store_backend {
            StoreBackend::Memory => true,
            StoreBackend::Supabase => !self.store_url.is_empty() && !self.store_api_key.is_empty(),
        };
        store_ready && !self.jwt_secret.is_empty()
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {} '{}', using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
