// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Every rule runs; the caller receives all failures at once.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::{RegistryBackend, WarrantorConfig};

/// Shortest accepted registry API token.
pub const MIN_API_TOKEN_LEN: usize = 10;

/// Shortest accepted credential signing secret, in bytes.
pub const MIN_TOKEN_SECRET_LEN: usize = 32;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &WarrantorConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    validate_server(config, &mut errors);
    validate_registry(config, &mut errors);
    validate_auth(config, &mut errors);
    validate_dealers(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_server(config: &WarrantorConfig, errors: &mut Vec<ConfigError>) {
    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("server.host must not be empty"));
    } else {
        let is_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
        if !is_ip && !is_hostname {
            errors.push(ConfigError::validation(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            )));
        }
    }

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "server.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.server.log_level
        )));
    }

    if let Some(token) = &config.server.admin_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "server.admin_token must not be blank; remove it to disable admin routes",
        ));
    }
}

fn validate_registry(config: &WarrantorConfig, errors: &mut Vec<ConfigError>) {
    let registry = &config.registry;

    if registry.timeout_ms == 0 {
        errors.push(ConfigError::validation("registry.timeout_ms must be positive"));
    }

    match registry.backend {
        RegistryBackend::Http => {
            match registry.base_url.as_deref().map(str::trim) {
                None | Some("") => errors.push(ConfigError::validation(
                    "registry.base_url is required when registry.backend = \"http\"",
                )),
                Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                    errors.push(ConfigError::validation(format!(
                        "registry.base_url `{url}` must start with http:// or https://"
                    )));
                }
                Some(_) => {}
            }

            match registry.api_token.as_deref().map(str::trim) {
                None | Some("") => errors.push(ConfigError::validation(
                    "registry.api_token is required when registry.backend = \"http\"",
                )),
                Some(token) if token.len() < MIN_API_TOKEN_LEN => {
                    errors.push(ConfigError::validation(format!(
                        "registry.api_token must be at least {MIN_API_TOKEN_LEN} characters"
                    )));
                }
                Some(_) => {}
            }
        }
        RegistryBackend::Sqlite => {
            if config.storage.database_path.trim().is_empty() {
                errors.push(ConfigError::validation(
                    "storage.database_path must not be empty when registry.backend = \"sqlite\"",
                ));
            }
        }
        RegistryBackend::Memory => {}
    }
}

fn validate_auth(config: &WarrantorConfig, errors: &mut Vec<ConfigError>) {
    if let Some(secret) = &config.auth.token_secret
        && secret.len() < MIN_TOKEN_SECRET_LEN
    {
        errors.push(ConfigError::validation(format!(
            "auth.token_secret must be at least {MIN_TOKEN_SECRET_LEN} bytes"
        )));
    }

    if config.auth.access_ttl_secs == 0 || config.auth.refresh_ttl_secs == 0 {
        errors.push(ConfigError::validation("auth token lifetimes must be positive"));
    }

    if config.auth.refresh_ttl_secs < config.auth.access_ttl_secs {
        errors.push(ConfigError::validation(
            "auth.refresh_ttl_secs must not be shorter than auth.access_ttl_secs",
        ));
    }

    let otp = &config.otp;
    if !(4..=10).contains(&otp.code_length) {
        errors.push(ConfigError::validation(format!(
            "otp.code_length must be between 4 and 10, got {}",
            otp.code_length
        )));
    }
    if otp.max_attempts < 1 {
        errors.push(ConfigError::validation("otp.max_attempts must be at least 1"));
    }
    if otp.ttl_secs == 0 {
        errors.push(ConfigError::validation("otp.ttl_secs must be positive"));
    }
    if let Some(code) = &otp.master_code
        && (code.len() != otp.code_length || !code.chars().all(|c| c.is_ascii_digit()))
    {
        errors.push(ConfigError::validation(format!(
            "otp.master_code must be {} digits",
            otp.code_length
        )));
    }
}

fn validate_dealers(config: &WarrantorConfig, errors: &mut Vec<ConfigError>) {
    let mut seen = HashSet::new();
    for (i, dealer) in config.dealers.iter().enumerate() {
        if dealer.id.trim().is_empty() {
            errors.push(ConfigError::validation(format!("dealers[{i}].id must not be blank")));
        }
        let code = dealer.code.trim().to_uppercase();
        if code.is_empty() {
            errors.push(ConfigError::validation(format!("dealers[{i}].code must not be blank")));
        } else if !seen.insert(code) {
            errors.push(ConfigError::validation(format!(
                "dealers[{i}].code `{}` is listed twice",
                dealer.code.trim()
            )));
        }
    }
}
