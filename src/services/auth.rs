// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth provider client (GoTrue-style REST API).
//!
//! Handles:
//! - Building the federated login URL (PKCE)
//! - Code exchange after the OAuth redirect
//! - Token refresh when the session expires
//! - Best-effort sign-out

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::config::Config;
use crate::error::AppError;
use crate::models::session::{decode_access_claims, Identity, Session};

/// Auth provider interface, as consumed by the session store.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Build the federated authorize URL for a PKCE sign-in.
    fn authorize_url(&self, redirect_to: &str, code_challenge: &str) -> String;

    /// Exchange the callback code for a session.
    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<Session, AppError>;

    /// Mint a fresh session from a refresh token.
    async fn refresh(&self, refresh_token: &str) -> Result<Session, AppError>;

    /// Fetch the identity behind an access token.
    async fn fetch_user(&self, access_token: &str) -> Result<Identity, AppError>;

    /// Revoke the session with the provider.
    async fn sign_out(&self, access_token: &str) -> Result<(), AppError>;
}

/// Auth provider REST client.
pub struct RestAuthClient {
    http: Option<reqwest::Client>,
    base_url: String,
    anon_key: String,
    provider: String,
}

/// Token grant response from the provider.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: Option<UserPayload>,
}

/// User object as returned by the provider.
#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<serde_json::Value>,
}

impl UserPayload {
    fn into_identity(self) -> Identity {
        let meta_str = |key: &str| {
            self.user_metadata
                .as_ref()
                .and_then(|m| m.get(key))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };
        let display_name = meta_str("full_name").or_else(|| meta_str("name"));
        let avatar_url = meta_str("avatar_url");

        Identity {
            id: self.id,
            email: self.email,
            display_name,
            avatar_url,
        }
    }
}

impl RestAuthClient {
    /// Create a new client from the app configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            http: Some(reqwest::Client::new()),
            base_url: config.backend_url.clone(),
            anon_key: config.anon_key.clone(),
            provider: config.oauth_provider.clone(),
        }
    }

    /// Create a mock client for testing (offline mode).
    pub fn new_mock() -> Self {
        Self {
            http: None,
            base_url: String::new(),
            anon_key: String::new(),
            provider: "discord".to_string(),
        }
    }

    fn get_client(&self) -> Result<&reqwest::Client, AppError> {
        self.http
            .as_ref()
            .ok_or_else(|| AppError::Auth("Auth backend not connected (offline mode)".to_string()))
    }

    /// Turn a token grant response into a session.
    ///
    /// Prefers the provider's `user` object for the identity; falls back
    /// to the access-token claims when it is absent.
    fn session_from(&self, token: TokenResponse) -> Result<Session, AppError> {
        let identity = match token.user {
            Some(user) => user.into_identity(),
            None => Identity::from_claims(&decode_access_claims(&token.access_token)?),
        };

        Ok(Session {
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            identity,
        })
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<Session, AppError> {
        let url = format!("{}/auth/v1/token?grant_type={}", self.base_url, grant_type);
        let response = self
            .get_client()?
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!("HTTP {}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("invalid token response: {e}")))?;

        self.session_from(token)
    }
}

#[async_trait]
impl AuthApi for RestAuthClient {
    fn authorize_url(&self, redirect_to: &str, code_challenge: &str) -> String {
        format!(
            "{}/auth/v1/authorize?provider={}&redirect_to={}&code_challenge={}&code_challenge_method=s256",
            self.base_url,
            self.provider,
            urlencoding::encode(redirect_to),
            code_challenge,
        )
    }

    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<Session, AppError> {
        self.token_grant(
            "pkce",
            serde_json::json!({
                "auth_code": code,
                "code_verifier": verifier,
            }),
        )
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AppError> {
        self.token_grant(
            "refresh_token",
            serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await
    }

    async fn fetch_user(&self, access_token: &str) -> Result<Identity, AppError> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .get_client()?
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("user request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!("HTTP {}: {}", status, body)));
        }

        let user: UserPayload = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("invalid user response: {e}")))?;

        Ok(user.into_identity())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let url = format!("{}/auth/v1/logout", self.base_url);
        let response = self
            .get_client()?
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("logout request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Auth(format!("logout returned HTTP {}", status)));
        }

        tracing::info!("Provider sign-out successful");
        Ok(())
    }
}
