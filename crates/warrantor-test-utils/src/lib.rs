// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Warrantor integration tests.
//!
//! Provides recording adapters and a harness that wires the lifecycle
//! engine, webhook dispatcher and auth services around one registry, for
//! fast, deterministic tests without a live registry.
//!
//! # Components
//!
//! - [`RecordingSink`] - Notification sink that captures every push
//! - [`MockDelivery`] - Code delivery that captures issued codes
//! - [`ManualClock`] - Clock that only moves when told to
//! - [`TestHarness`] - The assembled service stack

pub mod clock;
pub mod harness;
pub mod mock_delivery;
pub mod recording_sink;

pub use clock::ManualClock;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_delivery::MockDelivery;
pub use recording_sink::{Notification, RecordingSink};
