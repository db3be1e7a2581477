// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./warrantor.toml` > `~/.config/warrantor/warrantor.toml` >
//! `/etc/warrantor/warrantor.toml`, with `WARRANTOR_` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::WarrantorConfig;

const ENV_PREFIX: &str = "WARRANTOR_";
const LOCAL_FILE: &str = "warrantor.toml";
const SYSTEM_FILE: &str = "/etc/warrantor/warrantor.toml";

/// Top-level sections that environment keys may address.
const SECTIONS: &[&str] = &["server", "registry", "storage", "auth", "otp"];

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/warrantor/warrantor.toml`
/// 3. `~/.config/warrantor/warrantor.toml`
/// 4. `./warrantor.toml`
/// 5. `WARRANTOR_*` environment variables
pub fn load_config() -> Result<WarrantorConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<WarrantorConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WarrantorConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WarrantorConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WarrantorConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(WarrantorConfig::default()));
    for path in config_paths() {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_provider())
}

/// Candidate config files, lowest precedence first.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(SYSTEM_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("warrantor").join(LOCAL_FILE));
    }
    paths.push(PathBuf::from(LOCAL_FILE));
    paths
}

/// Environment provider with explicit section mapping.
///
/// Keys are split on the first underscore only when the prefix names a known
/// section, so `WARRANTOR_REGISTRY_API_TOKEN` becomes `registry.api_token`
/// and not `registry.api.token`.
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
