// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `warrantor serve` command implementation.
//!
//! Builds the configured registry backend, wires the lifecycle engine,
//! webhook dispatcher and auth services around the realtime hub, and serves
//! them until SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use warrantor_auth::{LoggingDelivery, OtpService};
use warrantor_config::{LogFormat, WarrantorConfig};
use warrantor_core::{HealthStatus, PluginAdapter, SystemClock, WarrantorError};
use warrantor_registry::build_registry;

use crate::shutdown;

/// How often expired one-time-code challenges are swept.
const OTP_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Runs the server until a shutdown signal arrives.
pub async fn run_serve(config: WarrantorConfig) -> Result<(), WarrantorError> {
    init_tracing(&config.server.log_level, config.server.log_format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = %config.registry.backend,
        "starting warrantor"
    );

    let registry = build_registry(&config).await?;
    match registry.health_check().await? {
        HealthStatus::Healthy => {}
        HealthStatus::Degraded(reason) => {
            warn!(adapter = registry.name(), %reason, "registry degraded at startup");
        }
        HealthStatus::Unhealthy(reason) => {
            error!(adapter = registry.name(), %reason, "registry unhealthy at startup");
            return Err(WarrantorError::upstream(format!(
                "registry {} is unhealthy: {reason}",
                registry.name()
            )));
        }
    }

    let state = warrantor_gateway::assemble(
        &config,
        registry.clone(),
        Arc::new(LoggingDelivery),
        Arc::new(SystemClock),
    );

    let cancel = shutdown::install_signal_handler();
    let purge = tokio::spawn(purge_loop(state.otp.clone(), cancel.clone()));

    let served = warrantor_gateway::start_server(&config.server, state, cancel.clone()).await;

    cancel.cancel();
    let _ = purge.await;

    if let Err(e) = registry.shutdown().await {
        warn!(error = %e, "registry shutdown failed");
    }

    info!("warrantor stopped");
    served
}

/// Sweeps expired one-time-code challenges until cancelled.
async fn purge_loop(otp: Arc<OtpService>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(OTP_PURGE_INTERVAL);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => match otp.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => debug!(purged, "expired otp challenges removed"),
                Err(e) => warn!(error = %e, "otp purge failed"),
            },
        }
    }
}

/// Initialize the tracing subscriber with the configured level and format.
fn init_tracing(log_level: &str, format: LogFormat) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warrantor={log_level},warn")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false);

    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
