// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token guard for the admin routes (status override, delete).
//!
//! When no admin token is configured, every admin request is rejected
//! (fail-closed).

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use warrantor_core::WarrantorError;

use crate::error::ApiError;

/// Admin authentication configuration.
#[derive(Clone, Default)]
pub struct AdminAuth {
    /// Expected bearer token. `None` disables the admin routes.
    pub admin_token: Option<String>,
}

impl AdminAuth {
    pub fn new(admin_token: Option<String>) -> Self {
        Self {
            admin_token: admin_token.filter(|t| !t.is_empty()),
        }
    }
}

impl std::fmt::Debug for AdminAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAuth")
            .field(
                "admin_token",
                &self.admin_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

pub async fn admin_middleware(
    State(auth): State<AdminAuth>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = auth.admin_token.as_deref() else {
        tracing::error!("admin route called but no admin token is configured");
        return Err(unauthorized());
    };

    let presented = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if bool::from(token.as_bytes().ct_eq(expected.as_bytes())) => {
            Ok(next.run(request).await)
        }
        _ => Err(unauthorized()),
    }
}

fn unauthorized() -> ApiError {
    ApiError(WarrantorError::Unauthorized("admin token required".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_token_disables_admin() {
        assert!(AdminAuth::new(Some(String::new())).admin_token.is_none());
        assert_eq!(
            AdminAuth::new(Some("s3cret".into())).admin_token.as_deref(),
            Some("s3cret")
        );
    }

    #[test]
    fn debug_redacts_token() {
        let debug_output = format!("{:?}", AdminAuth::new(Some("s3cret".into())));
        assert!(!debug_output.contains("s3cret"));
        assert!(debug_output.contains("[redacted]"));
    }
}
