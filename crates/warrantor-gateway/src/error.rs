// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps [`WarrantorError`] onto `{code, message, details?}` JSON responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use warrantor_core::{ErrorKind, WarrantorError};

/// Error body returned by every route.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Handler error wrapper so `?` works on [`WarrantorError`].
#[derive(Debug)]
pub struct ApiError(pub WarrantorError);

impl From<WarrantorError> for ApiError {
    fn from(err: WarrantorError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        match err.kind() {
            ErrorKind::Storage | ErrorKind::Config | ErrorKind::Internal => {
                tracing::error!(error = %err, "request failed");
            }
            ErrorKind::Upstream => tracing::warn!(error = %err, "registry call failed"),
            _ => tracing::debug!(error = %err, "request rejected"),
        }

        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            code: err.code(),
            message: err.public_message(),
            details: err.details().cloned(),
        };
        (status, Json(body)).into_response()
    }
}

/// Unwraps a JSON body, turning axum's rejection into `BadRequest INVALID_BODY`.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        ApiError(WarrantorError::bad_request(
            "INVALID_BODY",
            rejection.body_text(),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn render(err: WarrantorError) -> (StatusCode, Value) {
        let response = ApiError(err).into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn bad_request_carries_code_and_details() {
        let (status, body) = render(
            WarrantorError::bad_request("WARRANTY_NOT_FOUND", "warranty not found")
                .with_details(json!({ "warrantyId": "W1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "WARRANTY_NOT_FOUND");
        assert_eq!(body["message"], "warranty not found");
        assert_eq!(body["details"]["warrantyId"], "W1");
    }

    #[tokio::test]
    async fn not_found_maps_to_404_without_details() {
        let (status, body) = render(WarrantorError::not_found("warranty", "W2")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn conflict_maps_to_409() {
        let (status, body) = render(WarrantorError::conflict(
            "CONTACT_CONFLICT",
            "email already belongs to another contact",
        ))
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONTACT_CONFLICT");
        assert_eq!(body["message"], "email already belongs to another contact");
    }

    #[tokio::test]
    async fn internal_failures_do_not_leak() {
        let (status, body) = render(WarrantorError::Internal("db password is hunter2".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert!(!body["message"].as_str().unwrap().contains("hunter2"));
    }

    #[tokio::test]
    async fn upstream_maps_to_bad_gateway() {
        let (status, body) =
            render(WarrantorError::upstream("registry timed out at 10.0.0.7")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "UPSTREAM_ERROR");
        assert_eq!(body["message"], "upstream registry unavailable");
    }
}
