// SPDX-FileCopyrightText: 2026 Warrantor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HMAC-signed bearer credentials.
//!
//! A token is `base64url(claims_json) "." base64url(hmac_sha256(claims_b64))`,
//! both parts without padding.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::warn;
use warrantor_config::AuthConfig;
use warrantor_core::{Clock, WarrantorError};

type HmacSha256 = Hmac<Sha256>;

/// Who a credential is issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub roles: Vec<String>,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub exp: i64,
    pub kind: TokenKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub jti: String,
    pub ver: u32,
    pub exp: i64,
    pub kind: TokenKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_in: u64,
    pub refresh_expires_in: u64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    secret: Arc<[u8]>,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    /// Uses the configured secret, or a random per-process one when unset.
    pub fn from_config(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let secret: Vec<u8> = match config.token_secret.as_deref() {
            Some(s) if !s.is_empty() => s.as_bytes().to_vec(),
            _ => {
                warn!("auth.token_secret not set, issued credentials will not survive a restart");
                let mut bytes = vec![0u8; 32];
                OsRng.fill_bytes(&mut bytes);
                bytes
            }
        };
        Self {
            secret: secret.into(),
            access_ttl_secs: config.access_ttl_secs,
            refresh_ttl_secs: config.refresh_ttl_secs,
            clock,
        }
    }

    pub fn issue(&self, identity: &Identity) -> Result<TokenPair, WarrantorError> {
        let refresh = RefreshClaims {
            sub: identity.id.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
            ver: 1,
            exp: self.expiry(self.refresh_ttl_secs),
            kind: TokenKind::Refresh,
        };
        Ok(TokenPair {
            access_token: self.access_for(
                &identity.id,
                identity.roles.clone(),
                Some(identity.display_name.clone()),
            )?,
            refresh_token: self.sign(&refresh)?,
            access_expires_in: self.access_ttl_secs,
            refresh_expires_in: self.refresh_ttl_secs,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, WarrantorError> {
        let claims: AccessClaims = self.open(token)?;
        if claims.kind != TokenKind::Access {
            return Err(invalid());
        }
        self.check_expiry(claims.exp)?;
        Ok(claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, WarrantorError> {
        let claims: RefreshClaims = self.open(token)?;
        if claims.kind != TokenKind::Refresh {
            return Err(invalid());
        }
        self.check_expiry(claims.exp)?;
        Ok(claims)
    }

    /// A fresh access token for the subject of a valid refresh token.
    ///
    /// Refresh tokens carry no roles, so the new access token carries none either.
    pub fn refresh(&self, refresh_token: &str) -> Result<String, WarrantorError> {
        let claims = self.verify_refresh(refresh_token)?;
        self.access_for(&claims.sub, Vec::new(), None)
    }

    fn access_for(
        &self,
        sub: &str,
        roles: Vec<String>,
        name: Option<String>,
    ) -> Result<String, WarrantorError> {
        self.sign(&AccessClaims {
            sub: sub.to_string(),
            roles,
            name,
            exp: self.expiry(self.access_ttl_secs),
            kind: TokenKind::Access,
        })
    }

    fn expiry(&self, ttl_secs: u64) -> i64 {
        self.clock
            .now()
            .timestamp()
            .saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX))
    }

    fn check_expiry(&self, exp: i64) -> Result<(), WarrantorError> {
        if self.clock.now().timestamp() >= exp {
            return Err(WarrantorError::Unauthorized("token expired".into()));
        }
        Ok(())
    }

    fn mac(&self) -> Result<HmacSha256, WarrantorError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| WarrantorError::Internal(format!("hmac key: {e}")))
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, WarrantorError> {
        let json = serde_json::to_vec(claims)
            .map_err(|e| WarrantorError::Internal(format!("encode claims: {e}")))?;
        let body = URL_SAFE_NO_PAD.encode(json);
        let mut mac = self.mac()?;
        mac.update(body.as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{body}.{sig}"))
    }

    fn open<T: DeserializeOwned>(&self, token: &str) -> Result<T, WarrantorError> {
        let (body, sig) = token.trim().split_once('.').ok_or_else(invalid)?;
        let sig = URL_SAFE_NO_PAD.decode(sig).map_err(|_| invalid())?;
        let mut mac = self.mac()?;
        mac.update(body.as_bytes());
        mac.verify_slice(&sig).map_err(|_| invalid())?;

        let json = URL_SAFE_NO_PAD.decode(body).map_err(|_| invalid())?;
        serde_json::from_slice(&json).map_err(|_| invalid())
    }
}

fn invalid() -> WarrantorError {
    WarrantorError::Unauthorized("invalid token".into())
}
