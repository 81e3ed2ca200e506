//! Process configuration.
//!
//! Everything the portal needs at runtime is read once at startup into a
//! [`Config`] and handed to the server; handlers only ever see it through
//! `AppState`. Storage credentials are optional: a missing value is reported
//! by the upload pre-flight on each request, not at boot.

use std::env;
use std::time::Duration;

use tracing::{info, warn};

use crate::identity::DEFAULT_SESSION_TTL;

pub const DEFAULT_HTTP_PORT: u16 = 5000;
pub const DEFAULT_DB_PATH: &str = "auth.db";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@college.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";

/// Azure Blob Storage settings. Each field stays `None` when the variable is
/// unset or blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageSettings {
    pub account: Option<String>,
    pub access_key: Option<String>,
    pub container: Option<String>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl StorageSettings {
    pub fn new(account: Option<&str>, access_key: Option<&str>, container: Option<&str>) -> Self {
        Self {
            account: non_blank(account),
            access_key: non_blank(access_key),
            container: non_blank(container),
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.account.is_some() && self.access_key.is_some() && self.container.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub http_port: u16,
    pub db_path: String,
    pub admin_email: String,
    pub admin_password: String,
    pub seed_demo_staff: bool,
    pub cookie_secure: bool,
    /// Idle session lifetime.
    pub session_ttl: Duration,
    pub max_upload_bytes: usize,
    pub storage: StorageSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            http_port: DEFAULT_HTTP_PORT,
            db_path: DEFAULT_DB_PATH.to_string(),
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            seed_demo_staff: false,
            cookie_secure: false,
            session_ttl: DEFAULT_SESSION_TTL,
            max_upload_bytes: 16 * 1024 * 1024,
            storage: StorageSettings::new(None, None, None),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Config::default();
        let mut storage = StorageSettings::new(
            env::var("AZURE_STORAGE_ACCOUNT").ok().as_deref(),
            env::var("AZURE_STORAGE_KEY").ok().as_deref(),
            env::var("AZURE_CONTAINER").ok().as_deref(),
        );
        storage.request_timeout = Duration::from_secs(parse_u64_env("PORTAL_BLOB_TIMEOUT_SECS").unwrap_or(60));
        storage.connect_timeout = Duration::from_secs(parse_u64_env("PORTAL_BLOB_CONNECT_TIMEOUT_SECS").unwrap_or(10));

        let ttl_secs = parse_u64_env("PORTAL_SESSION_TTL_SECS").filter(|s| *s > 0);
        let max_upload_mb = parse_u64_env("PORTAL_MAX_UPLOAD_MB").unwrap_or(16);

        let cfg = Self {
            bind_addr: env::var("PORTAL_BIND_ADDR").unwrap_or(d.bind_addr),
            http_port: parse_port_env("PORTAL_HTTP_PORT").unwrap_or(d.http_port),
            db_path: env::var("PORTAL_DB_PATH").unwrap_or(d.db_path),
            admin_email: env::var("PORTAL_ADMIN_EMAIL").unwrap_or(d.admin_email),
            admin_password: env::var("PORTAL_ADMIN_PASSWORD").unwrap_or(d.admin_password),
            seed_demo_staff: parse_bool_env("PORTAL_SEED_DEMO_STAFF").unwrap_or(false),
            cookie_secure: parse_bool_env("PORTAL_COOKIE_SECURE").unwrap_or(false),
            session_ttl: ttl_secs.map(Duration::from_secs).unwrap_or(DEFAULT_SESSION_TTL),
            max_upload_bytes: (max_upload_mb as usize).saturating_mul(1024 * 1024),
            storage,
        };
        if !cfg.storage.is_complete() {
            warn!("Blob storage is not fully configured; uploads will be rejected until AZURE_* variables are set");
        }
        cfg
    }

    /// One-line summary for the startup log. Never includes secrets.
    pub fn summary(&self) -> String {
        format!(
            "bind={}:{}, db_path='{}', admin='{}', storage_account={:?}, container={:?}, access_key_set={}, session_ttl={:?}",
            self.bind_addr,
            self.http_port,
            self.db_path,
            self.admin_email,
            self.storage.account,
            self.storage.container,
            self.storage.access_key.is_some(),
            self.session_ttl,
        )
    }
}

fn non_blank(v: Option<&str>) -> Option<String> {
    v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

pub fn parse_port_env(name: &str) -> Option<u16> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<u16>() {
        Ok(p) => Some(p),
        Err(e) => {
            warn!("Invalid {name} value '{raw}': {e}");
            None
        }
    }
}

pub fn parse_u64_env(name: &str) -> Option<u64> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Invalid {name} value '{raw}': {e}");
            None
        }
    }
}

pub fn parse_bool_env(name: &str) -> Option<bool> {
    let raw = env::var(name).ok()?;
    let parsed = parse_bool(&raw);
    if parsed.is_none() {
        info!("{name}='{raw}' is not a boolean, ignoring");
    }
    parsed
}

pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_storage_values_count_as_unset() {
        let s = StorageSettings::new(Some("  "), Some("key"), Some(""));
        assert_eq!(s.account, None);
        assert_eq!(s.access_key.as_deref(), Some("key"));
        assert_eq!(s.container, None);
        assert!(!s.is_complete());
    }

    #[test]
    fn complete_storage_settings() {
        let s = StorageSettings::new(Some("acct"), Some("key"), Some("certs"));
        assert!(s.is_complete());
    }

    #[test]
    fn bool_parsing() {
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn summary_hides_access_key() {
        let mut cfg = Config::default();
        cfg.storage = StorageSettings::new(Some("acct"), Some("super-secret"), Some("certs"));
        let s = cfg.summary();
        assert!(!s.contains("super-secret"));
        assert!(s.contains("access_key_set=true"));
    }
}
