// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Atlantic RP portal: client-side session and access control.
//!
//! This crate is the control layer behind the community portal's UI
//! shell: it resolves the current session against the hosted backend,
//! loads and classifies the community profile, runs the location-consent
//! flow, and decides per route whether to render or redirect.

pub mod config;
pub mod db;
pub mod error;
pub mod gate;
pub mod logging;
pub mod models;
pub mod profile;
pub mod routes;
pub mod services;
pub mod session;
pub mod storage;

use std::sync::Arc;

use config::Config;
use db::{ProfileStore, RestProfileStore};
use error::{AppError, Result};
use gate::{AccessGate, GateState};
use services::{AuthApi, GeoProvider, PkcePair, RestAuthClient};
use session::{SessionEvent, SessionStore};
use storage::{ConsentStore, KvStore, PKCE_VERIFIER_KEY};

/// Shared session context.
///
/// The one explicitly-constructed container behind the whole UI tree:
/// built once at app start, handed by reference to consumers, torn down
/// on unmount (drop). Replaces ambient global state.
pub struct SessionContext {
    pub config: Config,
    pub auth: Arc<dyn AuthApi>,
    pub store: Arc<dyn ProfileStore>,
    pub kv: Arc<dyn KvStore>,
    pub consent: ConsentStore,
    pub sessions: Arc<SessionStore>,
    pub gate: AccessGate,
}

impl SessionContext {
    /// Build a context against the configured hosted backend.
    ///
    /// The key/value store and geolocation provider are host concerns
    /// (browser storage, browser geolocation) and are injected.
    pub fn new(config: Config, geo: Arc<dyn GeoProvider>, kv: Arc<dyn KvStore>) -> Self {
        let auth: Arc<dyn AuthApi> = Arc::new(RestAuthClient::new(&config));
        let store: Arc<dyn ProfileStore> = Arc::new(RestProfileStore::new(&config));
        Self::with_backends(config, auth, store, geo, kv)
    }

    /// Build a context with every collaborator injected.
    pub fn with_backends(
        config: Config,
        auth: Arc<dyn AuthApi>,
        store: Arc<dyn ProfileStore>,
        geo: Arc<dyn GeoProvider>,
        kv: Arc<dyn KvStore>,
    ) -> Self {
        let consent = ConsentStore::new(kv.clone());
        let sessions = Arc::new(SessionStore::new(auth.clone(), kv.clone(), consent.clone()));
        let gate = AccessGate::new(&config, sessions.clone(), store.clone(), consent.clone(), geo);

        Self {
            config,
            auth,
            store,
            kv,
            consent,
            sessions,
            gate,
        }
    }

    /// Start a federated sign-in: returns the authorize URL to navigate
    /// to, with the PKCE verifier stashed for the callback.
    pub fn begin_sign_in(&self) -> Result<String> {
        let pkce = PkcePair::generate()?;
        self.kv.set(PKCE_VERIFIER_KEY, &pkce.verifier);

        let redirect_to = format!("{}/auth/callback", self.config.site_url);
        Ok(self.auth.authorize_url(&redirect_to, &pkce.challenge))
    }

    /// Finish the OAuth callback: exchange the code, record the session,
    /// and re-run the gate pipeline.
    pub async fn complete_sign_in(&self, code: &str) -> Result<GateState> {
        let verifier = self
            .kv
            .get(PKCE_VERIFIER_KEY)
            .ok_or_else(|| AppError::Auth("no PKCE verifier for callback".to_string()))?;
        self.kv.remove(PKCE_VERIFIER_KEY);

        let session = self.auth.exchange_code(code, &verifier).await?;
        let identity = session.identity.clone();
        self.sessions.complete_sign_in(session).await;

        Ok(self.gate.handle_event(SessionEvent::SignedIn(identity)).await)
    }
}
