// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! REST client for the hosted table storage.
//!
//! Speaks the backend's PostgREST-style dialect: keyed selects via
//! `?id=eq.<id>` filters, PATCH for partial updates, `apikey` plus a
//! bearer token on every request.

use async_trait::async_trait;

use crate::config::Config;
use crate::db::{tables, ProfileStore};
use crate::error::AppError;
use crate::models::{Coordinates, Profile};

/// Table storage client.
pub struct RestProfileStore {
    http: Option<reqwest::Client>,
    base_url: String,
    anon_key: String,
}

impl RestProfileStore {
    /// Create a new client from the app configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            http: Some(reqwest::Client::new()),
            base_url: config.backend_url.clone(),
            anon_key: config.anon_key.clone(),
        }
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            http: None,
            base_url: String::new(),
            anon_key: String::new(),
        }
    }

    fn get_client(&self) -> Result<&reqwest::Client, AppError> {
        self.http
            .as_ref()
            .ok_or_else(|| AppError::Storage("Storage not connected (offline mode)".to_string()))
    }

    fn row_url(&self, id: &str) -> String {
        format!(
            "{}/rest/v1/{}?id=eq.{}",
            self.base_url,
            tables::PROFILES,
            urlencoding::encode(id)
        )
    }

    /// Check response status and return an error if not successful.
    async fn check_response(&self, response: reqwest::Response) -> Result<(), AppError> {
        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Storage(format!("HTTP {}: {}", status, body)))
    }
}

#[async_trait]
impl ProfileStore for RestProfileStore {
    async fn get_profile(&self, id: &str) -> Result<Option<Profile>, AppError> {
        let url = format!("{}&select=*&limit=1", self.row_url(id));
        let response = self
            .get_client()?
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .send()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!("HTTP {}: {}", status, body)));
        }

        let mut rows: Vec<Profile> = response
            .json()
            .await
            .map_err(|e| AppError::Storage(format!("invalid profile row: {e}")))?;

        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        let url = format!("{}/rest/v1/{}", self.base_url, tables::PROFILES);
        let response = self
            .get_client()?
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .bearer_auth(&self.anon_key)
            .json(profile)
            .send()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        self.check_response(response).await
    }

    async fn set_location(&self, id: &str, coords: Coordinates) -> Result<(), AppError> {
        let body = serde_json::json!({
            "latitude": coords.latitude,
            "longitude": coords.longitude,
        });
        self.patch_row(id, body).await
    }

    async fn clear_location(&self, id: &str) -> Result<(), AppError> {
        // Explicit nulls: a denial overwrites stale coordinates.
        let body = serde_json::json!({
            "latitude": null,
            "longitude": null,
        });
        self.patch_row(id, body).await
    }
}

impl RestProfileStore {
    async fn patch_row(&self, id: &str, body: serde_json::Value) -> Result<(), AppError> {
        let response = self
            .get_client()?
            .patch(self.row_url(id))
            .header("apikey", &self.anon_key)
            .header("Prefer", "return=minimal")
            .bearer_auth(&self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        self.check_response(response).await
    }
}
