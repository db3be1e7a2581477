// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sign-up, one-time-code login and credential refresh under `/api/v1/auth`.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use warrantor_auth::{AuthSession, OtpTicket, RegisterInstaller, RegisterSeller};

use crate::error::{ApiError, body};
use crate::server::GatewayState;

#[derive(Debug, Deserialize)]
pub struct OtpStartRequest {
    #[serde(default)]
    pub identifier: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpResendRequest {
    #[serde(default)]
    pub otp_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpVerifyRequest {
    #[serde(default)]
    pub otp_id: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

/// POST /api/v1/auth/register/seller
pub async fn register_seller(
    State(state): State<GatewayState>,
    payload: Result<Json<RegisterSeller>, JsonRejection>,
) -> Result<Json<AuthSession>, ApiError> {
    let req = body(payload)?;
    Ok(Json(state.accounts.register_seller(&req).await?))
}

/// POST /api/v1/auth/register/installer
pub async fn register_installer(
    State(state): State<GatewayState>,
    payload: Result<Json<RegisterInstaller>, JsonRejection>,
) -> Result<Json<AuthSession>, ApiError> {
    let req = body(payload)?;
    Ok(Json(state.accounts.register_installer(&req).await?))
}

/// POST /api/v1/auth/otp/start
pub async fn otp_start(
    State(state): State<GatewayState>,
    payload: Result<Json<OtpStartRequest>, JsonRejection>,
) -> Result<Json<OtpTicket>, ApiError> {
    let req = body(payload)?;
    Ok(Json(state.otp.start(&req.identifier).await?))
}

/// POST /api/v1/auth/otp/resend
pub async fn otp_resend(
    State(state): State<GatewayState>,
    payload: Result<Json<OtpResendRequest>, JsonRejection>,
) -> Result<Json<Ack>, ApiError> {
    let req = body(payload)?;
    state.otp.resend(&req.otp_id).await?;
    Ok(Json(Ack { ok: true }))
}

/// POST /api/v1/auth/otp/verify
///
/// A matching code signs the contact in; the code is consumed either way
/// once it matches.
pub async fn otp_verify(
    State(state): State<GatewayState>,
    payload: Result<Json<OtpVerifyRequest>, JsonRejection>,
) -> Result<Json<AuthSession>, ApiError> {
    let req = body(payload)?;
    let identifier = state.otp.verify(&req.otp_id, &req.code).await?;
    Ok(Json(state.accounts.complete_otp_login(&identifier).await?))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<GatewayState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let req = body(payload)?;
    let access_token = state.accounts.tokens().refresh(&req.refresh_token)?;
    Ok(Json(RefreshResponse { access_token }))
}
