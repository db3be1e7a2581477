// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for warranty, role, webhook and health routes.

use std::str::FromStr;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use warrantor_core::{Contact, HealthStatus, Warranty, WarrantorError, WarrantyStatus};
use warrantor_lifecycle::{
    ActivateOutcome, BuyerActivation, BuyerCheck, CompleteInstallation, EnsureContact,
    InstallerCheck, InstallerCompletion, StatusOutcome,
};
use warrantor_webhooks::{IngestOutcome, SIGNATURE_HEADERS};

use crate::error::{ApiError, body};
use crate::server::GatewayState;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Request body for `POST /warranty/activate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRequest {
    #[serde(default)]
    pub qr: String,
    #[serde(default)]
    pub buyer_contact_id: Option<String>,
}

/// Request body for `PATCH /warranty/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub status: String,
}

/// Request body for the routes that only carry a ticket reference.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarrantyRef {
    #[serde(default)]
    pub warranty_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachSellerRequest {
    #[serde(default)]
    pub warranty_id: String,
    #[serde(default)]
    pub seller_contact_id: String,
}

/// Response body for every `ensure` route.
#[derive(Debug, Serialize)]
pub struct EnsureResponse {
    pub contact: Contact,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub ok: bool,
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub registry: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub realtime_connections: usize,
}

/// POST /api/v1/warranty/activate
pub async fn activate(
    State(state): State<GatewayState>,
    payload: Result<Json<ActivateRequest>, JsonRejection>,
) -> ApiResult<ActivateOutcome> {
    let req = body(payload)?;
    let outcome = state
        .lifecycle
        .activate_by_code(&req.qr, req.buyer_contact_id.as_deref())
        .await?;
    Ok(Json(outcome))
}

/// PATCH /api/v1/warranty/{id}/status (admin)
pub async fn update_status(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> ApiResult<Warranty> {
    let req = body(payload)?;
    let status = WarrantyStatus::from_str(req.status.trim()).map_err(|_| {
        WarrantorError::bad_request(
            "INVALID_STATUS",
            format!("unknown warranty status '{}'", req.status),
        )
    })?;
    let warranty = state.lifecycle.update_status(&id, status).await?;
    Ok(Json(warranty))
}

/// DELETE /api/v1/warranty/{id} (admin)
pub async fn delete_warranty(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<DeleteResponse> {
    let ok = state.lifecycle.delete(&id).await?;
    Ok(Json(DeleteResponse { ok }))
}

/// POST /api/v1/warranty/seller/ensure
pub async fn seller_ensure(
    State(state): State<GatewayState>,
    payload: Result<Json<EnsureContact>, JsonRejection>,
) -> ApiResult<EnsureResponse> {
    let req = body(payload)?;
    let contact = state.lifecycle.actors().ensure_seller(&req).await?;
    Ok(Json(EnsureResponse { contact }))
}

/// POST /api/v1/warranty/seller/attach
pub async fn seller_attach(
    State(state): State<GatewayState>,
    payload: Result<Json<AttachSellerRequest>, JsonRejection>,
) -> ApiResult<StatusOutcome> {
    let req = body(payload)?;
    let outcome = state
        .lifecycle
        .attach_seller(&req.warranty_id, &req.seller_contact_id)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/warranty/seller/return
pub async fn seller_return(
    State(state): State<GatewayState>,
    payload: Result<Json<WarrantyRef>, JsonRejection>,
) -> ApiResult<StatusOutcome> {
    let req = body(payload)?;
    let outcome = state.lifecycle.return_warranty(&req.warranty_id).await?;
    Ok(Json(outcome))
}

/// POST /api/v1/warranty/buyer/ensure
pub async fn buyer_ensure(
    State(state): State<GatewayState>,
    payload: Result<Json<EnsureContact>, JsonRejection>,
) -> ApiResult<EnsureResponse> {
    let req = body(payload)?;
    let contact = state.lifecycle.actors().ensure_buyer(&req).await?;
    Ok(Json(EnsureResponse { contact }))
}

/// POST /api/v1/warranty/buyer/check
pub async fn buyer_check(
    State(state): State<GatewayState>,
    payload: Result<Json<WarrantyRef>, JsonRejection>,
) -> ApiResult<BuyerCheck> {
    let req = body(payload)?;
    Ok(Json(state.lifecycle.check_for_buyer(&req.warranty_id).await?))
}

/// POST /api/v1/warranty/buyer/activate
pub async fn buyer_activate(
    State(state): State<GatewayState>,
    payload: Result<Json<EnsureContact>, JsonRejection>,
) -> ApiResult<BuyerActivation> {
    let req = body(payload)?;
    Ok(Json(state.lifecycle.activate_for_buyer(&req).await?))
}

/// POST /api/v1/warranty/installer/ensure
pub async fn installer_ensure(
    State(state): State<GatewayState>,
    payload: Result<Json<EnsureContact>, JsonRejection>,
) -> ApiResult<EnsureResponse> {
    let req = body(payload)?;
    let contact = state.lifecycle.actors().ensure_installer(&req).await?;
    Ok(Json(EnsureResponse { contact }))
}

/// POST /api/v1/warranty/installer/check
pub async fn installer_check(
    State(state): State<GatewayState>,
    payload: Result<Json<WarrantyRef>, JsonRejection>,
) -> ApiResult<InstallerCheck> {
    let req = body(payload)?;
    Ok(Json(
        state.lifecycle.check_for_installer(&req.warranty_id).await?,
    ))
}

/// POST /api/v1/warranty/installer/complete
pub async fn installer_complete(
    State(state): State<GatewayState>,
    payload: Result<Json<CompleteInstallation>, JsonRejection>,
) -> ApiResult<InstallerCompletion> {
    let req = body(payload)?;
    Ok(Json(state.lifecycle.complete_installation(&req).await?))
}

/// POST /api/v1/webhooks/planfix
///
/// Always acknowledges. The body is read raw so that a missing or wrong
/// content type, or malformed JSON, still degrades to an `unknown` event.
pub async fn planfix_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    raw: Bytes,
) -> Json<IngestOutcome> {
    let payload = serde_json::from_slice::<Value>(&raw).unwrap_or_else(|e| {
        tracing::warn!("webhook body is not JSON: {e}");
        Value::Null
    });
    let signature = SIGNATURE_HEADERS
        .iter()
        .find_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()));
    Json(state.webhooks.ingest(payload, signature).await)
}

/// GET /health
///
/// Reports the registry backend's health. Responds 503 when it is down.
pub async fn health(State(state): State<GatewayState>) -> impl IntoResponse {
    let (status, detail) = match state.registry.health_check().await {
        Ok(HealthStatus::Healthy) => ("ok", None),
        Ok(HealthStatus::Degraded(why)) => ("degraded", Some(why)),
        Ok(HealthStatus::Unhealthy(why)) => ("unhealthy", Some(why)),
        Err(e) => ("unhealthy", Some(e.public_message())),
    };
    let code = if status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    let response = HealthResponse {
        status,
        registry: state.registry.name().to_string(),
        detail,
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        realtime_connections: state.hub.connection_count(),
    };
    (code, Json(response))
}
