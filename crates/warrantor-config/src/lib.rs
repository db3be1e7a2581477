// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for Warrantor.
//!
//! TOML files and `WARRANTOR_*` environment variables are layered with
//! Figment, checked with `deny_unknown_fields`, then validated so that a
//! missing registry URL or token stops the process at startup rather than on
//! the first registry call.
//!
//! ```no_run
//! use warrantor_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    AuthConfig, DealerConfig, LogFormat, OtpConfig, RegistryBackend, RegistryConfig,
    ServerConfig, StorageConfig, WarrantorConfig,
};

/// Load configuration from the standard hierarchy and validate it.
pub fn load_and_validate() -> Result<WarrantorConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &read_sources())),
    }
}

/// Load configuration from an explicit file (plus env) and validate it.
pub fn load_and_validate_path(
    path: &std::path::Path,
) -> Result<WarrantorConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources: Vec<(String, String)> = std::fs::read_to_string(path)
                .map(|content| vec![(path.display().to_string(), content)])
                .unwrap_or_default();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<WarrantorConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Contents of every config file that exists, for error span resolution.
fn read_sources() -> Vec<(String, String)> {
    loader::config_paths()
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let resolved = std::fs::canonicalize(&path).unwrap_or(path);
            Some((resolved.display().to_string(), content))
        })
        .collect()
}
