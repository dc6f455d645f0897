// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access gate: combines the session store and profile loader into one of
//! a fixed set of UI states.
//!
//! ```text
//! Loading -> ConfigError | Unauthenticated | LocationPrompt | Banned | Authorized
//! LocationPrompt -> Authorized          (grant or deny, always)
//! Banned -> Unauthenticated             (explicit kick only)
//! Authorized -> Unauthenticated         (sign-out / session end)
//! ```
//!
//! Once classified, a state holds until a session-change event restarts
//! the pipeline from `Loading`. A generation counter keys each pipeline
//! run so a late profile fetch for a stale identity is discarded.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::ProfileStore;
use crate::error::{AppError, Result};
use crate::models::{Coordinates, Identity, Profile};
use crate::profile::{Classification, ProfileLoader, ProfileLookup};
use crate::services::{GeoError, GeoProvider};
use crate::session::{SessionEvent, SessionStore};
use crate::storage::ConsentStore;

/// Upper bound on one geolocation read. The prompt must resolve either
/// way; a hung read counts as a denial.
const GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(20);

/// The gate's user-facing state. Ephemeral, computed per pipeline run,
/// never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum GateState {
    Loading,
    /// Backend connection values missing or placeholders. Terminal until
    /// the host page is reloaded.
    ConfigError,
    Unauthenticated,
    LocationPrompt {
        identity: Identity,
        profile: Profile,
    },
    Banned {
        identity: Identity,
        profile: Profile,
    },
    /// Signed in. `profile` is absent for a not-yet-provisioned account;
    /// downstream consumers must handle that combination explicitly.
    Authorized {
        identity: Identity,
        profile: Option<Profile>,
    },
}

impl GateState {
    pub fn name(&self) -> &'static str {
        match self {
            GateState::Loading => "Loading",
            GateState::ConfigError => "ConfigError",
            GateState::Unauthenticated => "Unauthenticated",
            GateState::LocationPrompt { .. } => "LocationPrompt",
            GateState::Banned { .. } => "Banned",
            GateState::Authorized { .. } => "Authorized",
        }
    }
}

/// Access gate state machine.
pub struct AccessGate {
    config_valid: bool,
    sessions: Arc<SessionStore>,
    profiles: ProfileLoader,
    store: Arc<dyn ProfileStore>,
    consent: ConsentStore,
    geo: Arc<dyn GeoProvider>,
    state: RwLock<GateState>,
    generation: AtomicU64,
    force_location_prompt: AtomicBool,
}

impl AccessGate {
    pub fn new(
        config: &Config,
        sessions: Arc<SessionStore>,
        store: Arc<dyn ProfileStore>,
        consent: ConsentStore,
        geo: Arc<dyn GeoProvider>,
    ) -> Self {
        let config_valid = match config.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Backend configuration unusable");
                false
            }
        };

        Self {
            config_valid,
            profiles: ProfileLoader::new(store.clone()),
            sessions,
            store,
            consent,
            geo,
            state: RwLock::new(GateState::Loading),
            generation: AtomicU64::new(0),
            force_location_prompt: AtomicBool::new(false),
        }
    }

    /// Current state snapshot.
    pub async fn state(&self) -> GateState {
        self.state.read().await.clone()
    }

    /// Debug override: show the location prompt even when a refusal
    /// marker exists. Driven by a query parameter in the shell.
    pub fn set_force_location_prompt(&self, on: bool) {
        self.force_location_prompt.store(on, Ordering::Release);
    }

    /// Drive `Loading` to a settled state.
    ///
    /// A no-op when the gate is already settled: there is no automatic
    /// re-entry, only a session-change event restarts the pipeline.
    pub async fn resolve(&self) -> GateState {
        {
            let state = self.state.read().await;
            if !matches!(*state, GateState::Loading) {
                return state.clone();
            }
        }

        // Checked before any network call.
        if !self.config_valid {
            return self.commit(self.generation.load(Ordering::Acquire), GateState::ConfigError)
                .await;
        }

        let gen = self.generation.load(Ordering::Acquire);

        let session = match self.sessions.current_session().await {
            Some(session) => session,
            None => return self.commit(gen, GateState::Unauthenticated).await,
        };

        let identity = session.identity.clone();
        let lookup = self.profiles.load(&identity.id).await;

        // A session change during the fetch makes this result stale.
        if self.generation.load(Ordering::Acquire) != gen {
            tracing::debug!(user_id = %identity.id, "Discarding profile result for stale identity");
            return self.state().await;
        }

        let force = self.force_location_prompt.load(Ordering::Acquire);
        let next = match lookup {
            ProfileLookup::NotFound => GateState::Authorized {
                identity,
                profile: None,
            },
            ProfileLookup::Found(profile) => {
                match ProfileLoader::classify(&profile, &self.consent, force) {
                    Classification::Banned => GateState::Banned { identity, profile },
                    Classification::NeedsLocation => {
                        GateState::LocationPrompt { identity, profile }
                    }
                    Classification::Normal => GateState::Authorized {
                        identity,
                        profile: Some(profile),
                    },
                }
            }
        };

        self.commit(gen, next).await
    }

    /// React to a session-store event.
    ///
    /// A sign-in restarts the pipeline from `Loading`; a session end
    /// drops any settled state to `Unauthenticated`.
    pub async fn handle_event(&self, event: SessionEvent) -> GateState {
        match event {
            SessionEvent::SignedIn(_) => {
                self.generation.fetch_add(1, Ordering::AcqRel);
                *self.state.write().await = GateState::Loading;
                self.resolve().await
            }
            SessionEvent::SignedOut => {
                self.generation.fetch_add(1, Ordering::AcqRel);
                let mut state = self.state.write().await;
                if !matches!(*state, GateState::ConfigError) {
                    *state = GateState::Unauthenticated;
                }
                state.clone()
            }
            SessionEvent::TokenRefreshed(_) => self.state().await,
        }
    }

    /// The user granted the location prompt.
    ///
    /// Attempts one bounded geolocation read. Valid coordinates are
    /// persisted; a denial, timeout, or out-of-range reading is recorded
    /// as an explicit denial (nulls + refusal marker). Both paths
    /// converge to `Authorized` - consent is advisory, never
    /// access-blocking.
    pub async fn grant_location(&self) -> Result<GateState> {
        let (identity, mut profile) = self.take_location_prompt().await?;
        let gen = self.generation.load(Ordering::Acquire);

        let reading = match tokio::time::timeout(
            GEOLOCATION_TIMEOUT,
            self.geo.current_position(true),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(GeoError::Timeout),
        };

        let validated = reading
            .map_err(AppError::from)
            .and_then(|c| validate_coordinates(c.latitude, c.longitude));

        match validated {
            Ok(coords) => {
                // Write failure is transient: logged, the transition still
                // completes and the next pipeline run will re-prompt.
                if let Err(e) = self.store.set_location(&identity.id, coords).await {
                    tracing::warn!(user_id = %identity.id, error = %e, "Failed to persist coordinates");
                } else {
                    tracing::info!(user_id = %identity.id, "Location consent granted");
                }
                profile.latitude = Some(coords.latitude);
                profile.longitude = Some(coords.longitude);
            }
            Err(e) => {
                // Denied, unavailable, timed out, or out of range: all
                // recorded as an explicit denial, never persisted.
                tracing::info!(user_id = %identity.id, error = %e, "Geolocation not usable, treating as denial");
                self.record_denial(&identity, &mut profile).await;
            }
        }

        Ok(self
            .commit(
                gen,
                GateState::Authorized {
                    identity,
                    profile: Some(profile),
                },
            )
            .await)
    }

    /// The user dismissed the location prompt.
    pub async fn deny_location(&self) -> Result<GateState> {
        let (identity, mut profile) = self.take_location_prompt().await?;
        let gen = self.generation.load(Ordering::Acquire);
        self.record_denial(&identity, &mut profile).await;

        Ok(self
            .commit(
                gen,
                GateState::Authorized {
                    identity,
                    profile: Some(profile),
                },
            )
            .await)
    }

    /// The banned user acknowledged the kick: terminate the session and
    /// drop to `Unauthenticated`. Sign-out proceeds even if the provider
    /// call fails.
    pub async fn acknowledge_ban(&self) -> Result<GateState> {
        {
            let state = self.state.read().await;
            if !matches!(*state, GateState::Banned { .. }) {
                return Err(AppError::InvalidGateState(state.name()));
            }
        }

        if let Err(e) = self.sessions.sign_out().await {
            tracing::warn!(error = %e, "Ban kick: provider sign-out failed");
        }

        self.generation.fetch_add(1, Ordering::AcqRel);
        let mut state = self.state.write().await;
        *state = GateState::Unauthenticated;
        Ok(state.clone())
    }

    /// Explicit sign-out from any signed-in state.
    pub async fn sign_out(&self) -> Result<GateState> {
        let result = self.sessions.sign_out().await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Sign-out completed locally despite provider error");
        }

        self.generation.fetch_add(1, Ordering::AcqRel);
        let mut state = self.state.write().await;
        if !matches!(*state, GateState::ConfigError) {
            *state = GateState::Unauthenticated;
        }
        Ok(state.clone())
    }

    /// Persist an explicit null location and the refusal marker.
    async fn record_denial(&self, identity: &Identity, profile: &mut Profile) {
        if let Err(e) = self.store.clear_location(&identity.id).await {
            tracing::warn!(user_id = %identity.id, error = %e, "Failed to persist location denial");
        }
        self.consent.set_refused(&identity.id);
        profile.latitude = None;
        profile.longitude = None;
    }

    async fn take_location_prompt(&self) -> Result<(Identity, Profile)> {
        let state = self.state.read().await;
        match &*state {
            GateState::LocationPrompt { identity, profile } => {
                Ok((identity.clone(), profile.clone()))
            }
            other => Err(AppError::InvalidGateState(other.name())),
        }
    }

    /// Commit a pipeline result unless a newer run has started.
    async fn commit(&self, gen: u64, next: GateState) -> GateState {
        let mut state = self.state.write().await;
        if self.generation.load(Ordering::Acquire) != gen {
            tracing::debug!(discarded = next.name(), "Pipeline result superseded");
            return state.clone();
        }
        tracing::debug!(state = next.name(), "Gate settled");
        *state = next.clone();
        next
    }
}

/// Validate a raw coordinate pair from the geolocation provider.
///
/// Kept as a free function so the consent flow and any future manual
/// location entry share one rule.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<Coordinates> {
    let coords = Coordinates::new(latitude, longitude);
    if !coords.in_range() {
        return Err(AppError::InvalidCoordinates {
            latitude,
            longitude,
        });
    }
    Ok(coords)
}
