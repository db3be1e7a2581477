// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Public seller application form and its admin decision route.
//!
//! Responses use the `{ "success": true, "data": ... }` envelope the public
//! form expects.

use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use warrantor_auth::{ApplicationStatus, ApplicationTicket, SellerApplicationRequest};
use warrantor_core::WarrantorError;

use crate::error::{ApiError, body};
use crate::server::GatewayState;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Envelope<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusView {
    pub status: ApplicationStatus,
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    #[serde(default)]
    pub status: String,
}

/// POST /api/v1/public/seller/registration
///
/// Answers 200 with the existing ticket when the same email already has a
/// pending application with the same dealer.
pub async fn apply(
    State(state): State<GatewayState>,
    payload: Result<Json<SellerApplicationRequest>, JsonRejection>,
) -> Result<Json<Envelope<ApplicationTicket>>, ApiError> {
    let req = body(payload)?;
    Ok(Envelope::ok(state.applications.apply(&req).await?))
}

/// GET /api/v1/public/seller/registration/{ticket_id}/status
pub async fn status(
    State(state): State<GatewayState>,
    Path(ticket_id): Path<String>,
) -> Result<Json<Envelope<StatusView>>, ApiError> {
    let status = state.applications.status(&ticket_id).await?;
    Ok(Envelope::ok(StatusView { status }))
}

/// PATCH /api/v1/seller/registration/{ticket_id}/status (admin)
pub async fn decide(
    State(state): State<GatewayState>,
    Path(ticket_id): Path<String>,
    payload: Result<Json<DecisionRequest>, JsonRejection>,
) -> Result<Json<Envelope<ApplicationTicket>>, ApiError> {
    let req = body(payload)?;
    let status = ApplicationStatus::from_str(req.status.trim()).map_err(|_| {
        WarrantorError::bad_request(
            "INVALID_STATUS",
            format!("unknown application status '{}'", req.status),
        )
    })?;
    Ok(Envelope::ok(
        state.applications.decide(&ticket_id, status).await?,
    ))
}
