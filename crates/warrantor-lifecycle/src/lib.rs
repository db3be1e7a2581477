// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Actor registration and the warranty lifecycle engine.
//!
//! [`ActorRegistration`] finds or creates contacts for a role and links them
//! to tickets. [`WarrantyLifecycle`] owns the `draft ⇄ pending_activation`
//! boundary and refuses anything that would regress out of `active` or
//! progress past `expired`. Both talk to the registry only through
//! [`warrantor_core::RegistryGateway`] and publish changes through
//! [`warrantor_core::NotificationSink`].

pub mod engine;
pub mod locks;
pub mod model;
pub mod registration;

pub use engine::WarrantyLifecycle;
pub use locks::{TicketGuard, TicketLocks};
pub use model::{
    ActivateOutcome, ActivationKind, BuyerActivation, BuyerCheck, CompleteInstallation,
    EnsureContact, InstallerCheck, InstallerCompletion, StatusOutcome,
};
pub use registration::ActorRegistration;
