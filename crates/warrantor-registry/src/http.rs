// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST client for the external registry.
//!
//! Transient failures (429, 500, 502, 503 and connection errors) are retried
//! up to `max_retries` times. A 404 becomes `None` for lookups and
//! `NotFound` for writes; any other failure is an `Upstream` error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use warrantor_config::RegistryConfig;
use warrantor_core::types::{normalize_email, normalize_phone, normalize_seller_code};
use warrantor_core::{
    ActorRole, AdapterType, BonusEvent, Contact, ContactPatch, HealthStatus, NewBonusEvent,
    PluginAdapter, RegistryGateway, UpsertContact, WarrantorError, Warranty, WarrantyStatus,
};

const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    deleted: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateWarrantyRequest<'a> {
    qr: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<Value>,
}

/// Registry gateway talking to the external registry's REST API.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    client: reqwest::Client,
    base_url: Url,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpRegistry {
    /// Build a client from validated configuration.
    pub fn new(config: &RegistryConfig) -> Result<Self, WarrantorError> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| WarrantorError::Config("registry.base_url is not set".into()))?;
        let token = config
            .api_token
            .as_deref()
            .ok_or_else(|| WarrantorError::Config("registry.api_token is not set".into()))?;

        let base_url = Url::parse(base_url)
            .map_err(|e| WarrantorError::Config(format!("invalid registry.base_url: {e}")))?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| WarrantorError::Config(format!("invalid registry.api_token: {e}")))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| WarrantorError::Upstream {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url,
            max_retries: config.max_retries,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    /// Overrides the pause between retries.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn url(&self, segments: &[&str]) -> Result<Url, WarrantorError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| WarrantorError::Config("registry.base_url cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request with retry. `Ok(None)` means the registry answered 404.
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<Option<T>, WarrantorError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, %url, "retrying registry request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let mut request = self.client.request(method.clone(), url.clone());
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt < self.max_retries => {
                    warn!(error = %e, "registry unreachable, will retry");
                    last_error = Some(e.to_string());
                    continue;
                }
                Err(e) => {
                    return Err(WarrantorError::Upstream {
                        message: format!("registry request failed: {e}"),
                        source: Some(Box::new(e)),
                    });
                }
            };

            let status = response.status();
            debug!(%status, attempt, method = %method, %url, "registry response");

            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }

            if status == StatusCode::CONFLICT {
                return Err(WarrantorError::conflict(
                    "CONTACT_CONFLICT",
                    "phone or email already belongs to another contact",
                ));
            }

            if status.is_success() {
                let value = response.json::<T>().await.map_err(|e| WarrantorError::Upstream {
                    message: format!("failed to decode registry response: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return Ok(Some(value));
            }

            let text = response.text().await.unwrap_or_default();
            if is_transient(status) && attempt < self.max_retries {
                warn!(%status, body = %text, "transient registry error, will retry");
                last_error = Some(format!("registry returned {status}"));
                continue;
            }

            return Err(WarrantorError::upstream(format!(
                "registry returned {status}: {text}"
            )));
        }

        Err(WarrantorError::upstream(last_error.unwrap_or_else(|| {
            "registry request failed after retries".to_string()
        })))
    }

    async fn find_contact(
        &self,
        key: &str,
        value: Option<String>,
    ) -> Result<Option<Contact>, WarrantorError> {
        let Some(value) = value else {
            return Ok(None);
        };
        let mut url = self.url(&["contacts"])?;
        url.query_pairs_mut().append_pair(key, &value);
        self.send(Method::GET, url, None).await
    }

    async fn link_role(
        &self,
        role: ActorRole,
        warranty_id: &str,
        contact_id: &str,
    ) -> Result<Warranty, WarrantorError> {
        let url = self.url(&["warranties", warranty_id, role.as_ref()])?;
        let body = json!({ "contactId": contact_id });
        self.send(Method::PUT, url, Some(&body))
            .await?
            .ok_or_else(|| WarrantorError::not_found("warranty", warranty_id))
    }
}

fn is_transient(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
    )
}

fn to_body<T: Serialize>(value: &T) -> Result<Value, WarrantorError> {
    serde_json::to_value(value).map_err(|e| WarrantorError::Internal(e.to_string()))
}

#[async_trait]
impl PluginAdapter for HttpRegistry {
    fn name(&self) -> &str {
        "http"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Registry
    }

    async fn health_check(&self) -> Result<HealthStatus, WarrantorError> {
        let url = self.url(&["health"])?;
        match self.client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(resp) => Ok(HealthStatus::Degraded(format!(
                "registry health returned {}",
                resp.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("registry unreachable: {e}"))),
        }
    }

    async fn shutdown(&self) -> Result<(), WarrantorError> {
        Ok(())
    }
}

#[async_trait]
impl RegistryGateway for HttpRegistry {
    async fn find_contact_by_phone(&self, phone: &str) -> Result<Option<Contact>, WarrantorError> {
        self.find_contact("phone", normalize_phone(phone)).await
    }

    async fn find_contact_by_email(&self, email: &str) -> Result<Option<Contact>, WarrantorError> {
        self.find_contact("email", normalize_email(email)).await
    }

    async fn find_contact_by_seller_code(
        &self,
        code: &str,
    ) -> Result<Option<Contact>, WarrantorError> {
        self.find_contact("sellerCode", normalize_seller_code(code))
            .await
    }

    async fn upsert_contact(&self, input: &UpsertContact) -> Result<Contact, WarrantorError> {
        let url = self.url(&["contacts", "upsert"])?;
        let body = to_body(&input.normalized())?;
        self.send(Method::POST, url, Some(&body))
            .await?
            .ok_or_else(|| WarrantorError::upstream("registry rejected contact upsert with 404"))
    }

    async fn update_contact(
        &self,
        id: &str,
        patch: &ContactPatch,
    ) -> Result<Contact, WarrantorError> {
        let url = self.url(&["contacts", id])?;
        let body = to_body(&patch.normalized())?;
        self.send(Method::PATCH, url, Some(&body))
            .await?
            .ok_or_else(|| WarrantorError::not_found("contact", id))
    }

    async fn find_warranty_by_qr(&self, qr: &str) -> Result<Option<Warranty>, WarrantorError> {
        let mut url = self.url(&["warranties"])?;
        url.query_pairs_mut().append_pair("qr", qr.trim());
        self.send(Method::GET, url, None).await
    }

    async fn find_warranty_by_id(&self, id: &str) -> Result<Option<Warranty>, WarrantorError> {
        let url = self.url(&["warranties", id])?;
        self.send(Method::GET, url, None).await
    }

    async fn create_warranty(
        &self,
        qr: &str,
        meta: Option<Value>,
    ) -> Result<Warranty, WarrantorError> {
        let qr = qr.trim();
        if qr.is_empty() {
            return Err(WarrantorError::bad_request("QR_REQUIRED", "qr is required"));
        }
        let url = self.url(&["warranties"])?;
        let body = to_body(&CreateWarrantyRequest { qr, meta })?;
        self.send(Method::POST, url, Some(&body))
            .await?
            .ok_or_else(|| WarrantorError::upstream("registry rejected warranty creation with 404"))
    }

    async fn link_buyer(
        &self,
        warranty_id: &str,
        contact_id: &str,
    ) -> Result<Warranty, WarrantorError> {
        self.link_role(ActorRole::Buyer, warranty_id, contact_id).await
    }

    async fn link_seller(
        &self,
        warranty_id: &str,
        contact_id: &str,
    ) -> Result<Warranty, WarrantorError> {
        self.link_role(ActorRole::Seller, warranty_id, contact_id).await
    }

    async fn link_installer(
        &self,
        warranty_id: &str,
        contact_id: &str,
    ) -> Result<Warranty, WarrantorError> {
        self.link_role(ActorRole::Installer, warranty_id, contact_id).await
    }

    async fn update_warranty_status(
        &self,
        id: &str,
        status: WarrantyStatus,
    ) -> Result<Warranty, WarrantorError> {
        let url = self.url(&["warranties", id, "status"])?;
        let body = json!({ "status": status });
        self.send(Method::PUT, url, Some(&body))
            .await?
            .ok_or_else(|| WarrantorError::not_found("warranty", id))
    }

    async fn delete_warranty(&self, id: &str) -> Result<bool, WarrantorError> {
        let url = self.url(&["warranties", id])?;
        let response: Option<DeleteResponse> = self.send(Method::DELETE, url, None).await?;
        Ok(response.is_some_and(|r| r.deleted))
    }

    async fn has_bonus(&self, event_id: &str) -> Result<bool, WarrantorError> {
        let url = self.url(&["bonuses", event_id])?;
        let found: Option<Value> = self.send(Method::GET, url, None).await?;
        Ok(found.is_some())
    }

    async fn add_bonus(&self, event: &NewBonusEvent) -> Result<BonusEvent, WarrantorError> {
        let url = self.url(&["bonuses"])?;
        let body = to_body(event)?;
        self.send(Method::POST, url, Some(&body))
            .await?
            .ok_or_else(|| WarrantorError::upstream("registry rejected bonus write with 404"))
    }
}
