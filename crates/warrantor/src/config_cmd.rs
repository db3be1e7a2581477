// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `warrantor config check` command implementation.

use warrantor_config::WarrantorConfig;

/// Renders the effective configuration as TOML with secrets redacted.
pub fn render(config: &WarrantorConfig) -> Result<String, toml::ser::Error> {
    let body = toml::to_string_pretty(&config.redacted())?;
    Ok(format!("# configuration is valid\n{body}"))
}
