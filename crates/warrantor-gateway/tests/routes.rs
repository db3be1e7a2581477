// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Route-level tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tower::ServiceExt;
use warrantor_config::{DealerConfig, RegistryBackend, RegistryConfig, WarrantorConfig};
use warrantor_core::RegistryGateway;
use warrantor_gateway::{GatewayState, assemble, router};
use warrantor_registry::{HttpRegistry, MemoryRegistry};
use warrantor_test_utils::{ManualClock, MockDelivery};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ADMIN: &str = "admin-token";

struct App {
    router: Router,
    state: GatewayState,
    delivery: Arc<MockDelivery>,
}

fn app_with(admin_token: Option<&str>) -> App {
    app_on(Arc::new(MemoryRegistry::new()), admin_token)
}

fn app_on(registry: Arc<dyn RegistryGateway>, admin_token: Option<&str>) -> App {
    let mut config = WarrantorConfig::default();
    config.server.admin_token = admin_token.map(String::from);
    config.auth.token_secret = Some("route-secret".into());
    config.otp.start_cooldown_secs = 0;
    config.dealers = vec![DealerConfig {
        id: "D-1".into(),
        code: "NORTH".into(),
        name: "North Tools".into(),
    }];

    let delivery = Arc::new(MockDelivery::new());
    let state = assemble(
        &config,
        registry,
        delivery.clone(),
        Arc::new(ManualClock::default()),
    );
    App {
        router: router(state.clone()),
        state,
        delivery,
    }
}

fn app() -> App {
    app_with(Some(ADMIN))
}

async fn send(
    app: &App,
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = builder
        .body(match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn post(app: &App, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(body), None).await
}

async fn create_ticket(app: &App, qr: &str) -> String {
    let (status, body) = post(app, "/api/v1/warranty/activate", json!({ "qr": qr })).await;
    assert_eq!(status, StatusCode::OK);
    body["warranty"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_registry() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["registry"], "memory");
}

#[tokio::test]
async fn activate_creates_then_finds() {
    let app = app();
    let (status, first) = post(&app, "/api/v1/warranty/activate", json!({ "qr": "QR-001" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "created");
    assert_eq!(first["warranty"]["qr"], "QR-001");
    assert_eq!(first["warranty"]["status"], "draft");

    let (_, second) = post(&app, "/api/v1/warranty/activate", json!({ "qr": "QR-001" })).await;
    assert_eq!(second["status"], "found");
    assert_eq!(second["warranty"]["id"], first["warranty"]["id"]);
}

#[tokio::test]
async fn activate_without_qr_is_rejected() {
    let app = app();
    let (status, body) = post(&app, "/api/v1/warranty/activate", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "QR_REQUIRED");
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let app = app();
    let (status, body) = post(&app, "/api/v1/warranty/seller/attach", json!([1, 2])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_BODY");
}

#[tokio::test]
async fn seller_attach_buyer_activate_and_return() {
    let app = app();
    let id = create_ticket(&app, "QR-001").await;

    let (status, attached) = post(
        &app,
        "/api/v1/warranty/seller/attach",
        json!({ "warrantyId": id, "sellerContactId": "C1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(attached, json!({ "warrantyId": id, "status": "pending_activation" }));

    let (status, activated) = post(
        &app,
        "/api/v1/warranty/buyer/activate",
        json!({ "warrantyId": id, "phone": "+380501112233", "name": "Ivan" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(activated["status"], "pending_activation");
    assert_eq!(activated["contact"]["phone"], "+380501112233");

    let (status, returned) =
        post(&app, "/api/v1/warranty/seller/return", json!({ "warrantyId": id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(returned["status"], "draft");
}

#[tokio::test]
async fn check_routes_report_ticket_state() {
    let app = app();
    let id = create_ticket(&app, "QR-CHK").await;

    let (status, buyer) = post(&app, "/api/v1/warranty/buyer/check", json!({ "warrantyId": "QR-CHK" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(buyer["warrantyId"], id);
    assert_eq!(buyer["isActivated"], false);
    assert_eq!(buyer["isExpired"], false);

    let (status, installer) =
        post(&app, "/api/v1/warranty/installer/check", json!({ "warrantyId": id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(installer["canComplete"], true);

    let (status, missing) =
        post(&app, "/api/v1/warranty/buyer/check", json!({ "warrantyId": "nope" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(missing["code"], "WARRANTY_NOT_FOUND");
    assert_eq!(missing["details"]["warrantyId"], "nope");
}

#[tokio::test]
async fn ensure_routes_wrap_the_contact() {
    let app = app();
    let (status, seller) = post(
        &app,
        "/api/v1/warranty/seller/ensure",
        json!({ "phone": " +380501112233 ", "name": "Shop" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seller["contact"]["phone"], "+380501112233");

    let (status, again) = post(
        &app,
        "/api/v1/warranty/installer/ensure",
        json!({ "phone": "+380501112233" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["contact"]["id"], seller["contact"]["id"]);

    let (status, body) = post(&app, "/api/v1/warranty/buyer/ensure", json!({ "name": "Anon" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BUYER_IDENTITY_REQUIRED");
}

#[tokio::test]
async fn installer_complete_keeps_status() {
    let app = app();
    let id = create_ticket(&app, "QR-INST").await;
    let (status, body) = post(
        &app,
        "/api/v1/warranty/installer/complete",
        json!({
            "warrantyId": id,
            "installerContactId": "I1",
            "installationDate": "2026-03-01",
            "comment": "commissioned"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["installerContactId"], "I1");
    assert_eq!(body["status"], "draft");
    assert_eq!(body["installationDate"], "2026-03-01");
}

#[tokio::test]
async fn admin_routes_require_the_bearer_token() {
    let app = app();
    let id = create_ticket(&app, "QR-ADM").await;
    let uri = format!("/api/v1/warranty/{id}/status");

    let (status, body) = send(&app, "PATCH", &uri, Some(json!({ "status": "active" })), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    for wrong in ["wrong", "admin-toke", "admin-token-2", ""] {
        let (status, _) =
            send(&app, "PATCH", &uri, Some(json!({ "status": "active" })), Some(wrong)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "token {wrong:?}");
    }

    let (status, body) = send(&app, "PATCH", &uri, Some(json!({ "status": "active" })), Some(ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");
}

#[tokio::test]
async fn admin_routes_fail_closed_without_configured_token() {
    let app = app_with(None);
    let id = create_ticket(&app, "QR-CLOSED").await;
    let (status, _) = send(&app, "DELETE", &format!("/api/v1/warranty/{id}"), None, Some("")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn active_ticket_cannot_be_returned_or_reactivated() {
    let app = app();
    let id = create_ticket(&app, "QR-ACT").await;
    send(
        &app,
        "PATCH",
        &format!("/api/v1/warranty/{id}/status"),
        Some(json!({ "status": "active" })),
        Some(ADMIN),
    )
    .await;

    let (status, body) =
        post(&app, "/api/v1/warranty/seller/return", json!({ "warrantyId": id })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "RETURN_NOT_ALLOWED");

    let (status, body) = post(
        &app,
        "/api/v1/warranty/buyer/activate",
        json!({ "warrantyId": id, "email": "b@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "WARRANTY_ALREADY_ACTIVE");
}

#[tokio::test]
async fn status_update_validates_input_and_target() {
    let app = app();
    let id = create_ticket(&app, "QR-VAL").await;

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/v1/warranty/{id}/status"),
        Some(json!({ "status": "activated_by_buyer" })),
        Some(ADMIN),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_STATUS");

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/v1/warranty/missing/status",
        Some(json!({ "status": "draft" })),
        Some(ADMIN),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn expired_ticket_accepts_delete() {
    let app = app();
    let id = create_ticket(&app, "QR-EXP").await;
    send(
        &app,
        "PATCH",
        &format!("/api/v1/warranty/{id}/status"),
        Some(json!({ "status": "expired" })),
        Some(ADMIN),
    )
    .await;

    let (status, body) = post(
        &app,
        "/api/v1/warranty/seller/attach",
        json!({ "warrantyId": id, "sellerContactId": "C1" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "WARRANTY_EXPIRED");

    let (status, body) = send(&app, "DELETE", &format!("/api/v1/warranty/{id}"), None, Some(ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let (status, _) = post(&app, "/api/v1/warranty/buyer/check", json!({ "warrantyId": id })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn webhook_status_change_reaches_room_subscribers() {
    let app = app();
    let (tx, mut rx) = mpsc::channel(8);
    let connection = app.state.hub.register(tx);
    app.state.hub.join(&connection, "T1");

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/webhooks/planfix",
        Some(json!({ "eventType": "warranty_status_update", "taskId": "T1", "status": "active" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "eventType": "warranty_status_changed" }));

    let frame: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
    assert_eq!(frame["event"], "warrantyStatusChanged");
    assert_eq!(frame["data"], json!({ "warrantyId": "T1", "status": "active" }));
}

#[tokio::test]
async fn webhook_never_fails_on_odd_bodies() {
    let app = app();
    let (tx, mut rx) = mpsc::channel(8);
    let connection = app.state.hub.register(tx);
    app.state.hub.join(&connection, "T1");

    let (_, body) = post(&app, "/api/v1/webhooks/planfix", json!({})).await;
    assert_eq!(body, json!({ "success": true, "eventType": "unknown" }));

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/webhooks/planfix")
        .header("content-type", "text/plain")
        .body(Body::from("not json at all"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn lifecycle_transitions_are_pushed_to_the_ticket_room() {
    let app = app();
    let id = create_ticket(&app, "QR-RT").await;
    let (tx, mut rx) = mpsc::channel(8);
    let connection = app.state.hub.register(tx);
    app.state.hub.join(&connection, &id);

    post(
        &app,
        "/api/v1/warranty/seller/attach",
        json!({ "warrantyId": id, "sellerContactId": "C1" }),
    )
    .await;

    let mut events = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        let frame: Value = serde_json::from_str(&frame).unwrap();
        events.push(frame["event"].as_str().unwrap().to_string());
    }
    assert_eq!(events, vec!["warrantyUpdated", "warrantyStatusChanged"]);
}

#[tokio::test]
async fn seller_registration_and_otp_login() {
    let app = app();
    let (status, registered) = post(
        &app,
        "/api/v1/auth/register/seller",
        json!({ "name": "Shop", "phone": "+380500001122" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(registered["accessToken"].is_string());
    assert_eq!(registered["user"]["roles"], json!(["seller"]));
    let seller_code = registered["meta"]["sellerCode"].as_str().unwrap().to_string();
    assert!(seller_code.starts_with("SON-"));

    let (status, dup) = post(
        &app,
        "/api/v1/auth/register/seller",
        json!({ "phone": "+380500001122" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(dup["code"], "USER_EXISTS");

    let (status, started) =
        post(&app, "/api/v1/auth/otp/start", json!({ "identifier": "+380500001122" })).await;
    assert_eq!(status, StatusCode::OK);
    let otp_id = started["otpId"].as_str().unwrap().to_string();
    let code = app
        .delivery
        .wait_for_code("+380500001122", 1)
        .await
        .expect("code delivered");

    let (status, bad) = post(
        &app,
        "/api/v1/auth/otp/verify",
        json!({ "otpId": otp_id, "code": "not-it" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(bad["code"], "UNAUTHORIZED");

    let (status, session) = post(
        &app,
        "/api/v1/auth/otp/verify",
        json!({ "otpId": otp_id, "code": code }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["user"]["roles"], json!(["seller"]));
    assert_eq!(session["meta"]["sellerCode"], seller_code);

    let (status, refreshed) = post(
        &app,
        "/api/v1/auth/refresh",
        json!({ "refreshToken": session["refreshToken"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(refreshed["accessToken"].is_string());

    let (status, _) = post(
        &app,
        "/api/v1/auth/refresh",
        json!({ "refreshToken": session["accessToken"] }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn installer_registration_needs_known_seller_code() {
    let app = app();
    let (status, body) = post(
        &app,
        "/api/v1/auth/register/installer",
        json!({ "sellerCode": "SON-NOPE00", "phone": "+380671234567" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (_, seller) = post(&app, "/api/v1/auth/register/seller", json!({ "email": "shop@example.com" })).await;
    let (status, installer) = post(
        &app,
        "/api/v1/auth/register/installer",
        json!({ "sellerCode": seller["meta"]["sellerCode"], "phone": "+380671234567" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(installer["user"]["roles"], json!(["installer"]));
}

#[tokio::test]
async fn otp_resend_unknown_id_is_unauthorized() {
    let app = app();
    let (status, _) = post(&app, "/api/v1/auth/otp/resend", json!({ "otpId": "missing" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registry_failure_detail_stays_out_of_the_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/warranties"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string("pg at 10.1.2.3 rejected password hunter2"),
        )
        .mount(&server)
        .await;
    let registry = HttpRegistry::new(&RegistryConfig {
        backend: RegistryBackend::Http,
        base_url: Some(server.uri()),
        api_token: Some("registry-token".into()),
        timeout_ms: 2_000,
        max_retries: 0,
    })
    .unwrap();
    let app = app_on(Arc::new(registry), Some(ADMIN));

    let (status, body) = post(&app, "/api/v1/warranty/activate", json!({ "qr": "QR-UP" })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "UPSTREAM_ERROR");
    assert_eq!(body["message"], "upstream registry unavailable");
    let rendered = body.to_string();
    assert!(!rendered.contains("hunter2"));
    assert!(!rendered.contains("10.1.2.3"));
}

fn application(email: &str, dealer_code: &str) -> Value {
    json!({
        "name": "Olena",
        "email": email,
        "phone": "+380 67 000 11 22",
        "dealerCode": dealer_code,
        "consent": true,
    })
}

#[tokio::test]
async fn public_seller_application_is_deduplicated_and_tracked() {
    let app = app();
    let uri = "/api/v1/public/seller/registration";

    let (status, first) = post(&app, uri, application("olena@shop.ua", "north")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);
    assert_eq!(first["data"]["status"], "pending");
    let ticket = first["data"]["ticketId"].as_str().unwrap().to_string();

    let (status, again) = post(&app, uri, application("Olena@Shop.ua", "NORTH")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["data"]["ticketId"], ticket.as_str());

    let status_uri = format!("{uri}/{ticket}/status");
    let (status, body) = send(&app, "GET", &status_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "data": { "status": "pending" } }));

    let decide_uri = format!("/api/v1/seller/registration/{ticket}/status");
    let (status, _) =
        send(&app, "PATCH", &decide_uri, Some(json!({ "status": "approved" })), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, decided) =
        send(&app, "PATCH", &decide_uri, Some(json!({ "status": "approved" })), Some(ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decided["data"]["status"], "approved");

    let (_, body) = send(&app, "GET", &status_uri, None, None).await;
    assert_eq!(body["data"]["status"], "approved");

    let (status, body) =
        send(&app, "PATCH", &decide_uri, Some(json!({ "status": "rejected" })), Some(ADMIN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "APPLICATION_ALREADY_DECIDED");

    let (status, body) =
        send(&app, "PATCH", &decide_uri, Some(json!({ "status": "maybe" })), Some(ADMIN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_STATUS");
}

#[tokio::test]
async fn public_seller_application_requires_consent_and_a_known_dealer() {
    let app = app();
    let uri = "/api/v1/public/seller/registration";

    let mut no_consent = application("a@b.c", "NORTH");
    no_consent["consent"] = json!(false);
    let (status, body) = post(&app, uri, no_consent).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "CONSENT_REQUIRED");

    let (status, body) = post(&app, uri, application("a@b.c", "WEST")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "DEALER_CODE_INVALID");

    let (status, body) = post(&app, uri, json!({ "email": "a@b.c", "consent": true })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NAME_REQUIRED");
}

#[tokio::test]
async fn unknown_application_ticket_reads_as_pending() {
    let app = app();
    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/public/seller/registration/never-issued/status",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");

    let (status, _) = send(
        &app,
        "PATCH",
        "/api/v1/seller/registration/never-issued/status",
        Some(json!({ "status": "approved" })),
        Some(ADMIN),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
