// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Backends extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` so they can live behind `Arc<dyn ...>`.

pub mod adapter;
pub mod clock;
pub mod delivery;
pub mod notify;
pub mod registry;

pub use adapter::PluginAdapter;
pub use clock::{Clock, SystemClock};
pub use delivery::CodeDelivery;
pub use notify::NotificationSink;
pub use registry::RegistryGateway;
