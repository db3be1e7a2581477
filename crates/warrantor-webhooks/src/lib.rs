// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event ingestion for asynchronous registry webhooks.
//!
//! A body is classified by an ordered rule table ([`classify::RULES`]),
//! flattened by an ordered path table ([`normalize::FIELDS`]), and handed
//! to [`WebhookDispatcher`], which pushes status changes to realtime
//! observers and logs everything else.

pub mod classify;
pub mod dispatch;
pub mod event;
pub mod normalize;
pub mod path;

pub use classify::{Classification, classify};
pub use dispatch::{SIGNATURE_HEADERS, WebhookDispatcher};
pub use event::{IngestOutcome, WebhookEvent, WebhookEventType, WebhookSource};
pub use normalize::normalize;
