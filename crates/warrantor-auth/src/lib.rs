// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication collaborators: one-time codes, signed credentials,
//! seller/installer sign-up against the registry and the public seller
//! application desk.
//!
//! All mutable state lives behind injected interfaces ([`OtpStore`],
//! [`warrantor_core::Clock`], [`warrantor_core::CodeDelivery`]), never in
//! process globals.

pub mod applications;
pub mod delivery;
pub mod otp;
pub mod registration;
pub mod store;
pub mod token;

pub use applications::{
    ApplicationStatus, ApplicationStore, ApplicationTicket, InMemoryApplicationStore,
    SellerApplication, SellerApplicationRequest, SellerApplications,
};
pub use delivery::LoggingDelivery;
pub use otp::{OtpService, OtpTicket};
pub use warrantor_core::types::normalize_identifier;
pub use registration::{
    AuthSession, RegisterInstaller, RegisterSeller, RegistrationService, SessionMeta,
    seller_code_for,
};
pub use store::{InMemoryOtpStore, OtpRecord, OtpStore};
pub use token::{AccessClaims, Identity, RefreshClaims, TokenIssuer, TokenKind, TokenPair};
