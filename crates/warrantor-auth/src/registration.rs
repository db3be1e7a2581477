// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seller and installer sign-up, and login completion after a verified code.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use warrantor_core::types::{
    normalize_email, normalize_identifier, normalize_phone, normalize_seller_code,
};
use warrantor_core::{Contact, ContactPatch, RegistryGateway, UpsertContact, WarrantorError};

use crate::token::{Identity, TokenIssuer, TokenPair};

pub const ROLE_SELLER: &str = "seller";
pub const ROLE_INSTALLER: &str = "installer";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSeller {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInstaller {
    #[serde(default)]
    pub seller_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMeta {
    pub seller_code: String,
}

/// Credentials plus the identity they were issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: Identity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<SessionMeta>,
}

#[derive(Clone)]
pub struct RegistrationService {
    registry: Arc<dyn RegistryGateway>,
    tokens: TokenIssuer,
}

impl RegistrationService {
    pub fn new(registry: Arc<dyn RegistryGateway>, tokens: TokenIssuer) -> Self {
        Self { registry, tokens }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Creates a seller contact, assigns its seller code and signs it in.
    pub async fn register_seller(
        &self,
        req: &RegisterSeller,
    ) -> Result<AuthSession, WarrantorError> {
        let phone = req.phone.as_deref().and_then(normalize_phone);
        let email = req.email.as_deref().and_then(normalize_email);

        if let Some(phone) = &phone
            && self.registry.find_contact_by_phone(phone).await?.is_some()
        {
            return Err(user_exists("user already exists (phone)"));
        }
        if let Some(email) = &email
            && self.registry.find_contact_by_email(email).await?.is_some()
        {
            return Err(user_exists("user already exists (email)"));
        }

        let fallback = email.clone().or_else(|| phone.clone());
        let name = non_blank(req.name.as_deref())
            .or_else(|| fallback.clone())
            .unwrap_or_else(|| "Seller".to_string());
        let contact = self
            .registry
            .upsert_contact(&UpsertContact {
                phone,
                email,
                name: Some(name),
            })
            .await?;

        let code = seller_code_for(&contact.id);
        let contact = self
            .registry
            .update_contact(
                &contact.id,
                &ContactPatch {
                    seller_code: Some(code.clone()),
                    ..Default::default()
                },
            )
            .await?;
        info!(contact_id = %contact.id, seller_code = %code, "seller registered");

        let user = identity(&contact, ROLE_SELLER, fallback.as_deref().unwrap_or("Seller"));
        Ok(AuthSession {
            tokens: self.tokens.issue(&user)?,
            user,
            meta: Some(SessionMeta { seller_code: code }),
        })
    }

    /// Creates an installer under an existing seller's code and signs it in.
    pub async fn register_installer(
        &self,
        req: &RegisterInstaller,
    ) -> Result<AuthSession, WarrantorError> {
        let seller_code = req
            .seller_code
            .as_deref()
            .and_then(normalize_seller_code)
            .ok_or_else(|| {
                WarrantorError::bad_request("SELLER_CODE_REQUIRED", "sellerCode is required")
            })?;
        if self
            .registry
            .find_contact_by_seller_code(&seller_code)
            .await?
            .is_none()
        {
            return Err(WarrantorError::not_found("seller", seller_code));
        }

        let phone = req
            .phone
            .as_deref()
            .and_then(normalize_phone)
            .ok_or_else(|| WarrantorError::bad_request("PHONE_REQUIRED", "phone is required"))?;
        if self.registry.find_contact_by_phone(&phone).await?.is_some() {
            return Err(user_exists("installer already exists"));
        }

        let name = non_blank(req.name.as_deref()).unwrap_or_else(|| phone.clone());
        let contact = self
            .registry
            .upsert_contact(&UpsertContact {
                phone: Some(phone.clone()),
                email: None,
                name: Some(name),
            })
            .await?;
        let contact = self
            .registry
            .update_contact(
                &contact.id,
                &ContactPatch {
                    seller_code: Some(seller_code),
                    ..Default::default()
                },
            )
            .await?;
        info!(contact_id = %contact.id, "installer registered");

        let user = identity(&contact, ROLE_INSTALLER, &phone);
        Ok(AuthSession {
            tokens: self.tokens.issue(&user)?,
            user,
            meta: None,
        })
    }

    /// Signs in the contact a verified one-time code was issued for.
    ///
    /// A contact owning the seller code generated from its own id is a
    /// seller; any other known contact is an installer.
    pub async fn complete_otp_login(
        &self,
        identifier: &str,
    ) -> Result<AuthSession, WarrantorError> {
        let identifier = normalize_identifier(identifier)
            .ok_or_else(|| WarrantorError::Unauthorized("user not found".into()))?;
        let found = if identifier.contains('@') {
            self.registry.find_contact_by_email(&identifier).await?
        } else {
            self.registry.find_contact_by_phone(&identifier).await?
        };
        let contact = found.ok_or_else(|| WarrantorError::Unauthorized("user not found".into()))?;

        let expected = seller_code_for(&contact.id);
        let owns_code = contact.seller_code.as_deref() == Some(expected.as_str());
        let (role, meta) = if owns_code {
            let meta = contact
                .seller_code
                .clone()
                .map(|seller_code| SessionMeta { seller_code });
            (ROLE_SELLER, meta)
        } else {
            (ROLE_INSTALLER, None)
        };
        info!(contact_id = %contact.id, role, "one-time code login completed");

        let user = identity(&contact, role, &identifier);
        Ok(AuthSession {
            tokens: self.tokens.issue(&user)?,
            user,
            meta,
        })
    }
}

/// `SON-` followed by the first six characters of the id, dashes removed, upper-cased.
pub fn seller_code_for(contact_id: &str) -> String {
    let base: String = contact_id
        .chars()
        .filter(|c| *c != '-')
        .take(6)
        .collect::<String>()
        .to_uppercase();
    format!("SON-{base}")
}

fn identity(contact: &Contact, role: &str, fallback_name: &str) -> Identity {
    Identity {
        id: contact.id.clone(),
        roles: vec![role.to_string()],
        display_name: contact
            .name
            .clone()
            .unwrap_or_else(|| fallback_name.to_string()),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn user_exists(message: &str) -> WarrantorError {
    WarrantorError::bad_request("USER_EXISTS", message)
}
