// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use warrantor_auth::{
    InMemoryOtpStore, OtpService, RegisterInstaller, RegisterSeller, RegistrationService,
    TokenIssuer,
};
use warrantor_config::{AuthConfig, OtpConfig};
use warrantor_core::{
    AdapterType, Clock, CodeDelivery, ErrorKind, HealthStatus, PluginAdapter, RegistryGateway,
    WarrantorError,
};
use warrantor_registry::MemoryRegistry;

struct TestClock(Mutex<DateTime<Utc>>);

impl TestClock {
    fn advance(&self, secs: i64) {
        *self.0.lock().unwrap() += Duration::seconds(secs);
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl Outbox {
    async fn wait_for(&self, n: usize) -> Vec<(String, String)> {
        for _ in 0..100 {
            let sent = self.sent.lock().unwrap().clone();
            if sent.len() >= n {
                return sent;
            }
            tokio::time::sleep(StdDuration::from_millis(5)).await;
        }
        panic!("expected {n} deliveries");
    }
}

#[async_trait]
impl PluginAdapter for Outbox {
    fn name(&self) -> &str {
        "outbox"
    }
    fn version(&self) -> semver::Version {
        semver::Version::new(0, 0, 0)
    }
    fn adapter_type(&self) -> AdapterType {
        AdapterType::CodeDelivery
    }
    async fn health_check(&self) -> Result<HealthStatus, WarrantorError> {
        Ok(HealthStatus::Healthy)
    }
    async fn shutdown(&self) -> Result<(), WarrantorError> {
        Ok(())
    }
}

#[async_trait]
impl CodeDelivery for Outbox {
    async fn deliver(&self, identifier: &str, code: &str) -> Result<(), WarrantorError> {
        self.sent
            .lock()
            .unwrap()
            .push((identifier.to_string(), code.to_string()));
        if self.fail {
            return Err(WarrantorError::upstream("sms gateway down"));
        }
        Ok(())
    }
}

struct Otp {
    clock: Arc<TestClock>,
    outbox: Arc<Outbox>,
    service: OtpService,
}

fn otp_with(config: OtpConfig, fail: bool) -> Otp {
    let clock = Arc::new(TestClock(Mutex::new(Utc::now())));
    let outbox = Arc::new(Outbox {
        fail,
        ..Default::default()
    });
    let service = OtpService::new(
        Arc::new(InMemoryOtpStore::new()),
        outbox.clone(),
        clock.clone(),
        config,
    );
    Otp {
        clock,
        outbox,
        service,
    }
}

fn otp() -> Otp {
    otp_with(OtpConfig::default(), false)
}

#[tokio::test]
async fn start_then_verify_returns_identifier_once() {
    let o = otp();
    let ticket = o.service.start(" +380 50 111 22 33 ").await.unwrap();
    let sent = o.outbox.wait_for(1).await;
    assert_eq!(sent[0].0, "+380501112233");

    let identifier = o.service.verify(&ticket.otp_id, &sent[0].1).await.unwrap();
    assert_eq!(identifier, "+380501112233");

    let err = o.service.verify(&ticket.otp_id, &sent[0].1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn start_cooldown_is_per_identifier() {
    let o = otp();
    o.service.start("a@example.com").await.unwrap();
    let err = o.service.start("a@example.com").await.unwrap_err();
    assert_eq!(err.code(), "OTP_COOLDOWN");
    o.service.start("b@example.com").await.unwrap();

    o.clock.advance(31);
    o.service.start("a@example.com").await.unwrap();
}

#[tokio::test]
async fn resend_waits_for_its_cooldown() {
    let o = otp();
    let ticket = o.service.start("+1555").await.unwrap();
    let err = o.service.resend(&ticket.otp_id).await.unwrap_err();
    assert_eq!(err.code(), "OTP_RESEND_TOO_SOON");

    o.clock.advance(21);
    o.service.resend(&ticket.otp_id).await.unwrap();
    let sent = o.outbox.wait_for(2).await;
    assert_eq!(sent[0], sent[1]);
}

#[tokio::test]
async fn expired_codes_are_rejected() {
    let o = otp();
    let ticket = o.service.start("+1555").await.unwrap();
    let sent = o.outbox.wait_for(1).await;
    o.clock.advance(301);
    let err = o.service.verify(&ticket.otp_id, &sent[0].1).await.unwrap_err();
    assert_eq!(err.to_string(), "unauthorized: code expired");
    assert!(o.service.resend(&ticket.otp_id).await.is_err());
}

#[tokio::test]
async fn attempts_are_capped() {
    let o = otp_with(
        OtpConfig {
            max_attempts: 2,
            ..Default::default()
        },
        false,
    );
    let ticket = o.service.start("+1555").await.unwrap();
    let sent = o.outbox.wait_for(1).await;

    assert!(o.service.verify(&ticket.otp_id, "0").await.is_err());
    assert!(o.service.verify(&ticket.otp_id, "0").await.is_err());
    let err = o.service.verify(&ticket.otp_id, &sent[0].1).await.unwrap_err();
    assert_eq!(err.to_string(), "unauthorized: too many attempts");
}

#[tokio::test]
async fn master_code_is_accepted() {
    let o = otp_with(
        OtpConfig {
            master_code: Some("000000".into()),
            ..Default::default()
        },
        false,
    );
    let ticket = o.service.start("+1555").await.unwrap();
    assert_eq!(
        o.service.verify(&ticket.otp_id, " 000000 ").await.unwrap(),
        "+1555"
    );
}

#[tokio::test]
async fn delivery_failure_is_not_surfaced() {
    let o = otp_with(OtpConfig::default(), true);
    assert!(o.service.start("+1555").await.is_ok());
    o.outbox.wait_for(1).await;
}

#[tokio::test]
async fn purge_drops_expired_codes() {
    let o = otp();
    o.service.start("+1").await.unwrap();
    o.clock.advance(301);
    assert_eq!(o.service.purge_expired().await.unwrap(), 1);
}

fn registration() -> (Arc<MemoryRegistry>, RegistrationService) {
    let registry = Arc::new(MemoryRegistry::new());
    let tokens = TokenIssuer::from_config(
        &AuthConfig {
            token_secret: Some("0123456789abcdef0123456789abcdef".into()),
            ..Default::default()
        },
        Arc::new(warrantor_core::SystemClock),
    );
    (registry.clone(), RegistrationService::new(registry, tokens))
}

#[tokio::test]
async fn seller_then_installer_then_otp_login() {
    let (registry, svc) = registration();

    let seller = svc
        .register_seller(&RegisterSeller {
            name: Some("Corner Shop".into()),
            email: Some("Shop@Example.com".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    let code = seller.meta.clone().unwrap().seller_code;
    assert!(code.starts_with("SON-"));
    assert_eq!(code.len(), 10);
    assert_eq!(seller.user.roles, vec!["seller"]);
    let claims = svc.tokens().verify_access(&seller.tokens.access_token).unwrap();
    assert_eq!(claims.sub, seller.user.id);

    let installer = svc
        .register_installer(&RegisterInstaller {
            seller_code: Some(format!(" {code} ")),
            phone: Some("+380501112233".into()),
            name: None,
        })
        .await
        .unwrap();
    assert_eq!(installer.user.roles, vec!["installer"]);
    assert_eq!(installer.user.display_name, "+380501112233");
    let stored = registry
        .find_contact_by_phone("+380501112233")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.seller_code.as_deref(), Some(code.as_str()));

    let login = svc.complete_otp_login("shop@example.com").await.unwrap();
    assert_eq!(login.user.roles, vec!["seller"]);
    assert_eq!(login.meta.unwrap().seller_code, code);

    let login = svc.complete_otp_login("+380501112233").await.unwrap();
    assert_eq!(login.user.roles, vec!["installer"]);
    assert!(login.meta.is_none());

    let err = svc.complete_otp_login("+1999").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn duplicate_sign_ups_are_rejected() {
    let (_, svc) = registration();
    let req = RegisterSeller {
        phone: Some("+1555".into()),
        ..Default::default()
    };
    svc.register_seller(&req).await.unwrap();
    let err = svc.register_seller(&req).await.unwrap_err();
    assert_eq!(err.code(), "USER_EXISTS");
}

#[tokio::test]
async fn installer_needs_a_real_seller_code_and_phone() {
    let (_, svc) = registration();
    let err = svc
        .register_installer(&RegisterInstaller::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "SELLER_CODE_REQUIRED");

    let err = svc
        .register_installer(&RegisterInstaller {
            seller_code: Some("SON-NOPE00".into()),
            phone: Some("+1".into()),
            name: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let seller = svc
        .register_seller(&RegisterSeller {
            phone: Some("+2".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    let err = svc
        .register_installer(&RegisterInstaller {
            seller_code: seller.meta.map(|m| m.seller_code),
            phone: None,
            name: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "PHONE_REQUIRED");
}

#[tokio::test]
async fn seller_signed_up_with_a_spaced_phone_can_log_in_with_it() {
    let (_, svc) = registration();
    let o = otp();

    let seller = svc
        .register_seller(&RegisterSeller {
            phone: Some("+380 50 111 22 33".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    let ticket = o.service.start("+380 50 111 22 33").await.unwrap();
    let sent = o.outbox.wait_for(1).await;
    let identifier = o.service.verify(&ticket.otp_id, &sent[0].1).await.unwrap();

    let login = svc.complete_otp_login(&identifier).await.unwrap();
    assert_eq!(login.user.id, seller.user.id);
    assert_eq!(login.user.roles, vec!["seller"]);
    assert_eq!(login.meta.unwrap().seller_code, seller.meta.unwrap().seller_code);
}

#[tokio::test]
async fn email_login_ignores_case_and_padding() {
    let (_, svc) = registration();
    let o = otp();
    svc.register_seller(&RegisterSeller {
        email: Some("Shop@Example.com".into()),
        ..Default::default()
    })
    .await
    .unwrap();

    let ticket = o.service.start("  SHOP@example.COM ").await.unwrap();
    let sent = o.outbox.wait_for(1).await;
    assert_eq!(sent[0].0, "shop@example.com");
    let identifier = o.service.verify(&ticket.otp_id, &sent[0].1).await.unwrap();
    assert!(svc.complete_otp_login(&identifier).await.is_ok());
}
