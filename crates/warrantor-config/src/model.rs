// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of silently ignored.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Placeholder written over secrets when the configuration is printed.
pub const REDACTED: &str = "[REDACTED]";

/// Top-level Warrantor configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WarrantorConfig {
    /// HTTP listener and logging.
    #[serde(default)]
    pub server: ServerConfig,

    /// Which registry backend serves contacts and tickets.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// SQLite settings for the durable backend.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Credential issuance.
    #[serde(default)]
    pub auth: AuthConfig,

    /// One-time-code login settings.
    #[serde(default)]
    pub otp: OtpConfig,

    /// Dealers a public seller application may name by code.
    #[serde(default)]
    pub dealers: Vec<DealerConfig>,
}

impl WarrantorConfig {
    /// Returns a copy with every secret replaced by [`REDACTED`].
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        let hide = |v: &mut Option<String>| {
            if v.is_some() {
                *v = Some(REDACTED.to_string());
            }
        };
        hide(&mut copy.server.admin_token);
        hide(&mut copy.registry.api_token);
        hide(&mut copy.auth.token_secret);
        hide(&mut copy.otp.master_code);
        copy
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token for the administrative override routes.
    /// `None` closes those routes entirely.
    #[serde(default)]
    pub admin_token: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin_token: None,
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Registry backend selection, made once at process start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RegistryBackend {
    /// In-process stub, lost on restart.
    #[default]
    Memory,
    /// Local SQLite database.
    Sqlite,
    /// The external registry's REST API.
    Http,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    #[serde(default)]
    pub backend: RegistryBackend,

    /// Base URL of the external registry API. Required for `http`.
    #[serde(default)]
    pub base_url: Option<String>,

    /// API token for the external registry. Required for `http`.
    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retries on transient upstream failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            backend: RegistryBackend::default(),
            base_url: None,
            api_token: None,
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    1
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for concurrent reads.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("warrantor").join("warrantor.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "warrantor.db".to_string())
}

fn default_true() -> bool {
    true
}

/// Credential issuance settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// HMAC secret for signing credentials. When unset a random secret is
    /// generated per process and every credential dies with it.
    #[serde(default)]
    pub token_secret: Option<String>,

    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: u64,

    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            access_ttl_secs: default_access_ttl_secs(),
            refresh_ttl_secs: default_refresh_ttl_secs(),
        }
    }
}

fn default_access_ttl_secs() -> u64 {
    15 * 60
}

fn default_refresh_ttl_secs() -> u64 {
    30 * 24 * 60 * 60
}

/// One-time-code settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OtpConfig {
    #[serde(default = "default_otp_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Minimum gap between two `start` calls for one identifier.
    #[serde(default = "default_start_cooldown_secs")]
    pub start_cooldown_secs: u64,

    #[serde(default = "default_resend_cooldown_secs")]
    pub resend_cooldown_secs: u64,

    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Code accepted for every identifier. Development only.
    #[serde(default)]
    pub master_code: Option<String>,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_otp_ttl_secs(),
            max_attempts: default_max_attempts(),
            start_cooldown_secs: default_start_cooldown_secs(),
            resend_cooldown_secs: default_resend_cooldown_secs(),
            code_length: default_code_length(),
            master_code: None,
        }
    }
}

fn default_otp_ttl_secs() -> u64 {
    5 * 60
}

fn default_max_attempts() -> u32 {
    5
}

fn default_start_cooldown_secs() -> u64 {
    30
}

fn default_resend_cooldown_secs() -> u64 {
    20
}

fn default_code_length() -> usize {
    6
}

/// A dealer known to the application desk, given as `[[dealers]]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DealerConfig {
    pub id: String,
    /// Code a seller types on the public form. Matched case-insensitively.
    pub code: String,
    #[serde(default)]
    pub name: String,
}
