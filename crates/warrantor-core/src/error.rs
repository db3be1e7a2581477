// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Warrantor backend.

use serde_json::Value;
use strum::{Display, EnumString};
use thiserror::Error;

/// Message shown to callers for failures whose details must stay internal.
pub const INTERNAL_MESSAGE: &str = "Unexpected server error";

/// Message shown to callers when the external registry fails.
pub const UPSTREAM_MESSAGE: &str = "upstream registry unavailable";

/// Coarse classification of a [`WarrantorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    Conflict,
    Unauthorized,
    Forbidden,
    Upstream,
    Storage,
    Config,
    Internal,
}

/// The primary error type used across every Warrantor component.
#[derive(Debug, Error)]
pub enum WarrantorError {
    /// Caller supplied invalid input or attempted a forbidden transition.
    #[error("{message}")]
    BadRequest {
        code: &'static str,
        message: String,
        details: Option<Value>,
    },

    /// A referenced contact or warranty does not exist in the registry.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The write would give a phone or email to a second contact.
    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Registry I/O failure. Propagated as-is, never retried by the lifecycle.
    #[error("upstream error: {message}")]
    Upstream {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors detected after startup validation.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WarrantorError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            source: None,
        }
    }

    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage {
            source: Box::new(source),
        }
    }

    /// Attaches structured details to a `BadRequest`. Other variants are returned unchanged.
    pub fn with_details(self, value: Value) -> Self {
        match self {
            Self::BadRequest { code, message, .. } => Self::BadRequest {
                code,
                message,
                details: Some(value),
            },
            other => other,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest { .. } => ErrorKind::BadRequest,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Upstream { .. } => ErrorKind::Upstream,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::Config(_) => ErrorKind::Config,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Machine-readable code rendered to API callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { code, .. } | Self::Conflict { code, .. } => code,
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::Storage { .. } | Self::Config(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::Upstream => 502,
            ErrorKind::Storage | ErrorKind::Config | ErrorKind::Internal => 500,
        }
    }

    /// Human message safe to show to callers.
    ///
    /// Storage, configuration, internal and upstream failures collapse to a
    /// fixed message so that no backend detail leaks out.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Storage | ErrorKind::Config | ErrorKind::Internal => {
                INTERNAL_MESSAGE.to_string()
            }
            ErrorKind::Upstream => UPSTREAM_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }

    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::BadRequest { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}
