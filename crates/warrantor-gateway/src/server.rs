// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, patch, post},
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use warrantor_auth::{OtpService, RegistrationService, SellerApplications};
use warrantor_config::ServerConfig;
use warrantor_core::{RegistryGateway, WarrantorError};
use warrantor_lifecycle::WarrantyLifecycle;
use warrantor_webhooks::WebhookDispatcher;

use crate::auth::{AdminAuth, admin_middleware};
use crate::hub::RealtimeHub;
use crate::{applications, handlers, session, ws};

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Registry backend, used directly only by the health check.
    pub registry: Arc<dyn RegistryGateway>,
    pub lifecycle: WarrantyLifecycle,
    pub webhooks: WebhookDispatcher,
    pub otp: Arc<OtpService>,
    pub accounts: Arc<RegistrationService>,
    pub applications: Arc<SellerApplications>,
    /// Realtime rooms. The same hub is the lifecycle's notification sink.
    pub hub: Arc<RealtimeHub>,
    pub admin: AdminAuth,
    /// Process start time for uptime calculation.
    pub started_at: Instant,
}

/// Builds the full route tree.
///
/// - `GET /health`, `GET /ws` (unauthenticated)
/// - `/api/v1/warranty/...`, `/api/v1/auth/...`, `/api/v1/webhooks/planfix`
/// - `/api/v1/public/seller/registration...` (public application form)
/// - `PATCH /api/v1/warranty/{id}/status`, `DELETE /api/v1/warranty/{id}`,
///   `PATCH /api/v1/seller/registration/{ticket_id}/status` behind the admin
///   bearer token
pub fn router(state: GatewayState) -> Router {
    let admin_routes = Router::new()
        .route("/warranty/{id}/status", patch(handlers::update_status))
        .route("/warranty/{id}", delete(handlers::delete_warranty))
        .route(
            "/seller/registration/{ticket_id}/status",
            patch(applications::decide),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.admin.clone(),
            admin_middleware,
        ));

    let auth_routes = Router::new()
        .route("/register/seller", post(session::register_seller))
        .route("/register/installer", post(session::register_installer))
        .route("/otp/start", post(session::otp_start))
        .route("/otp/resend", post(session::otp_resend))
        .route("/otp/verify", post(session::otp_verify))
        .route("/refresh", post(session::refresh));

    let public_routes = Router::new()
        .route("/seller/registration", post(applications::apply))
        .route(
            "/seller/registration/{ticket_id}/status",
            get(applications::status),
        );

    let api_routes = Router::new()
        .route("/warranty/activate", post(handlers::activate))
        .route("/warranty/seller/ensure", post(handlers::seller_ensure))
        .route("/warranty/seller/attach", post(handlers::seller_attach))
        .route("/warranty/seller/return", post(handlers::seller_return))
        .route("/warranty/buyer/ensure", post(handlers::buyer_ensure))
        .route("/warranty/buyer/check", post(handlers::buyer_check))
        .route("/warranty/buyer/activate", post(handlers::buyer_activate))
        .route("/warranty/installer/ensure", post(handlers::installer_ensure))
        .route("/warranty/installer/check", post(handlers::installer_check))
        .route(
            "/warranty/installer/complete",
            post(handlers::installer_complete),
        )
        .route("/webhooks/planfix", post(handlers::planfix_webhook))
        .nest("/auth", auth_routes)
        .nest("/public", public_routes)
        .merge(admin_routes);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ws", get(ws::ws_handler))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `host:port` and serves until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), WarrantorError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| WarrantorError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| WarrantorError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
