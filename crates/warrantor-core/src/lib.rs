// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Warrantor registration backend.
//!
//! This crate provides the domain types, the error taxonomy, and the adapter
//! traits that the registry backends, the lifecycle engine and the HTTP
//! gateway are written against.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{ErrorKind, WarrantorError};
pub use types::{
    ActorRole, AdapterType, BonusEvent, BonusRole, Contact, ContactPatch, HealthStatus,
    NewBonusEvent, UpsertContact, Warranty, WarrantyStatus,
};

pub use traits::{
    Clock, CodeDelivery, NotificationSink, PluginAdapter, RegistryGateway, SystemClock,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips() {
        use std::str::FromStr;

        for variant in [AdapterType::Registry, AdapterType::CodeDelivery] {
            let s = variant.to_string();
            assert_eq!(AdapterType::from_str(&s).expect("should parse back"), variant);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        assert_ne!(HealthStatus::Degraded("slow".into()), healthy);
        assert_ne!(HealthStatus::Unhealthy("down".into()), healthy);
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_registry<T: RegistryGateway>() {}
        fn _assert_sink<T: NotificationSink>() {}
        fn _assert_delivery<T: CodeDelivery>() {}
        fn _assert_clock<T: Clock>() {}
        _assert_clock::<SystemClock>();
    }
}
