// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the Warrantor backend.
//!
//! The gateway owns no domain logic. It deserializes requests, calls the
//! lifecycle engine, webhook dispatcher and auth services, and maps
//! [`warrantor_core::WarrantorError`] onto JSON error bodies. The
//! [`RealtimeHub`] it serves over `/ws` is also the notification sink those
//! services publish into.

pub mod applications;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod server;
pub mod session;
pub mod ws;

use std::sync::Arc;
use std::time::Instant;

use warrantor_auth::{
    InMemoryApplicationStore, InMemoryOtpStore, OtpService, RegistrationService,
    SellerApplications, TokenIssuer,
};
use warrantor_config::WarrantorConfig;
use warrantor_core::{Clock, CodeDelivery, NotificationSink, RegistryGateway};
use warrantor_lifecycle::WarrantyLifecycle;
use warrantor_webhooks::WebhookDispatcher;

pub use auth::AdminAuth;
pub use error::{ApiError, ErrorBody};
pub use hub::RealtimeHub;
pub use server::{GatewayState, router, start_server};

/// Wires every service around one registry and one realtime hub.
pub fn assemble(
    config: &WarrantorConfig,
    registry: Arc<dyn RegistryGateway>,
    delivery: Arc<dyn CodeDelivery>,
    clock: Arc<dyn Clock>,
) -> GatewayState {
    let hub = Arc::new(RealtimeHub::new());
    let sink: Arc<dyn NotificationSink> = hub.clone();

    let tokens = TokenIssuer::from_config(&config.auth, clock.clone());
    let otp = OtpService::new(
        Arc::new(InMemoryOtpStore::new()),
        delivery,
        clock.clone(),
        config.otp.clone(),
    );
    let applications = SellerApplications::new(
        Arc::new(InMemoryApplicationStore::new()),
        config.dealers.clone(),
        clock,
    );

    GatewayState {
        lifecycle: WarrantyLifecycle::new(registry.clone(), sink.clone()),
        webhooks: WebhookDispatcher::new(sink),
        otp: Arc::new(otp),
        accounts: Arc::new(RegistrationService::new(registry.clone(), tokens)),
        applications: Arc::new(applications),
        registry,
        hub,
        admin: AdminAuth::new(config.server.admin_token.clone()),
        started_at: Instant::now(),
    }
}
