//! Configuration management

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ConflictResolution;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL used in links sent to guests
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8000
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), base_url: default_base_url() }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_db_path() -> String {
    "slotwise.db".to_string()
}

const fn default_pool_size() -> u32 {
    8
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path(), pool_size: default_pool_size() }
    }
}

/// Token signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default, skip_serializing)]
    pub secret_key: String,
    #[serde(default = "default_token_minutes")]
    pub access_token_expire_minutes: i64,
}

const fn default_token_minutes() -> i64 {
    30
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { secret_key: String::new(), access_token_expire_minutes: default_token_minutes() }
    }
}

/// Google OAuth client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default, skip_serializing)]
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uri: String,
    /// Callback for the calendar-only consent flow; falls back to `redirect_uri`
    #[serde(default)]
    pub calendar_redirect_uri: String,
}

impl GoogleConfig {
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    pub fn calendar_callback(&self) -> &str {
        if self.calendar_redirect_uri.is_empty() {
            &self.redirect_uri
        } else {
            &self.calendar_redirect_uri
        }
    }
}

/// Hosted LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self { api_key: None, model: default_model() }
    }
}

/// Outgoing email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_from_name() -> String {
    "Slotwise".to_string()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self { enabled: false, from_name: default_from_name() }
    }
}

/// Per-provider sync switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSyncConfig {
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub sync_availability: bool,
    #[serde(default = "default_true")]
    pub sync_bookings: bool,
    #[serde(default)]
    pub webhook_enabled: bool,
}

const fn default_true() -> bool {
    true
}

/// Calendar synchronisation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    #[serde(default = "default_window_days")]
    pub window_days: i64,
    #[serde(default)]
    pub conflict_resolution: ConflictResolution,
    #[serde(default = "default_providers")]
    pub providers: BTreeMap<String, ProviderSyncConfig>,
}

const fn default_retry_attempts() -> u32 {
    3
}

const fn default_retry_delay() -> u64 {
    5
}

const fn default_batch_size() -> usize {
    50
}

const fn default_interval() -> u64 {
    60
}

const fn default_window_days() -> i64 {
    7
}

fn default_providers() -> BTreeMap<String, ProviderSyncConfig> {
    BTreeMap::from([
        (
            "google".to_string(),
            ProviderSyncConfig {
                enabled: true,
                sync_availability: true,
                sync_bookings: true,
                webhook_enabled: true,
            },
        ),
        (
            "microsoft".to_string(),
            ProviderSyncConfig {
                enabled: false,
                sync_availability: true,
                sync_bookings: true,
                webhook_enabled: false,
            },
        ),
    ])
}

impl SyncConfig {
    pub fn is_provider_enabled(&self, provider: &str) -> bool {
        self.providers.get(provider).is_some_and(|p| p.enabled)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retry_attempts: default_retry_attempts(),
            retry_delay_seconds: default_retry_delay(),
            batch_size: default_batch_size(),
            interval_seconds: default_interval(),
            window_days: default_window_days(),
            conflict_resolution: ConflictResolution::default(),
            providers: default_providers(),
        }
    }
}

/// Agent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Extra knowledge file loaded at startup (json, csv or custom Q&A text)
    #[serde(default)]
    pub knowledge_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_defaults_enable_google_only() {
        let sync = SyncConfig::default();
        assert_eq!(sync.retry_attempts, 3);
        assert_eq!(sync.batch_size, 50);
        assert!(sync.is_provider_enabled("google"));
        assert!(!sync.is_provider_enabled("microsoft"));
        assert!(!sync.is_provider_enabled("exchange"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: AppConfig =
            serde_json::from_str(r#"{"server":{"port":9000},"auth":{"secret_key":"k"}}"#).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.auth.access_token_expire_minutes, 30);
        assert_eq!(cfg.openai.model, "gpt-4o-mini");
        assert_eq!(cfg.sync.conflict_resolution, ConflictResolution::DatabaseWins);
    }
}
