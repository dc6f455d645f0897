// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session and identity types for the auth provider integration.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Leeway applied before treating an access token as expired, so a refresh
/// happens ahead of the hard cutoff.
const EXPIRY_SKEW_SECS: i64 = 30;

/// Authenticated identity as reported by the external auth provider.
///
/// Not owned by this system: created on sign-in/sign-up, destroyed on
/// sign-out, only ever referenced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque provider user ID
    pub id: String,
    pub email: Option<String>,
    /// Display name from the federated provider's metadata
    pub display_name: Option<String>,
    /// Avatar URL from the federated provider's metadata
    pub avatar_url: Option<String>,
}

/// An authenticated session held by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub identity: Identity,
}

impl Session {
    /// Whether the access token is expired (with a small skew so refresh
    /// happens ahead of the cutoff).
    pub fn is_expired(&self) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_SKEW_SECS) <= Utc::now()
    }
}

/// Claims carried in the provider's access token.
///
/// Decoded without signature verification: the client never holds the
/// signing key, and these claims are only a local hint. The backend
/// re-checks the token on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (provider user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
    /// Federated metadata blob (display name, avatar, ...)
    #[serde(default)]
    pub user_metadata: Option<serde_json::Value>,
}

/// Decode the claims from an access token without verifying the signature.
pub fn decode_access_claims(token: &str) -> Result<AccessClaims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false; // expiry is tracked on the Session
    validation.validate_aud = false;

    let data = decode::<AccessClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| AppError::Auth(format!("unreadable access token: {e}")))?;

    Ok(data.claims)
}

impl Identity {
    /// Build an identity from decoded access-token claims.
    pub fn from_claims(claims: &AccessClaims) -> Self {
        let metadata = claims.user_metadata.as_ref();
        let meta_str = |key: &str| {
            metadata
                .and_then(|m| m.get(key))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };

        Self {
            id: claims.sub.clone(),
            email: claims.email.clone(),
            display_name: meta_str("full_name").or_else(|| meta_str("name")),
            avatar_url: meta_str("avatar_url"),
        }
    }
}
