// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile loader: resolves an identity into a community profile and
//! classifies it for the access gate.

use std::sync::Arc;

use crate::db::ProfileStore;
use crate::models::Profile;
use crate::storage::ConsentStore;

/// Result of a profile fetch.
#[derive(Debug, Clone)]
pub enum ProfileLookup {
    Found(Profile),
    /// No row yet - e.g. first login before provisioning. Also the
    /// fail-open result for storage errors.
    NotFound,
}

/// Classification of a found profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Banned,
    NeedsLocation,
    Normal,
}

/// Profile loader.
#[derive(Clone)]
pub struct ProfileLoader {
    store: Arc<dyn ProfileStore>,
}

impl ProfileLoader {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Fetch the profile row for an identity.
    ///
    /// Storage errors degrade to `NotFound` so the gate still reaches a
    /// terminal state; the failure is logged for operability.
    pub async fn load(&self, identity_id: &str) -> ProfileLookup {
        match self.store.get_profile(identity_id).await {
            Ok(Some(profile)) => ProfileLookup::Found(profile),
            Ok(None) => {
                tracing::debug!(user_id = identity_id, "No profile row yet");
                ProfileLookup::NotFound
            }
            Err(e) => {
                tracing::warn!(user_id = identity_id, error = %e, "Profile fetch failed, treating as absent");
                ProfileLookup::NotFound
            }
        }
    }

    /// Classify a found profile. Ban wins over everything; the location
    /// prompt fires only when both coordinates are missing and the user
    /// has not refused this browser session (unless forced).
    pub fn classify(
        profile: &Profile,
        consent: &ConsentStore,
        force_reprompt: bool,
    ) -> Classification {
        if profile.banned {
            return Classification::Banned;
        }
        if !profile.has_location() && (force_reprompt || !consent.is_refused(&profile.id)) {
            return Classification::NeedsLocation;
        }
        Classification::Normal
    }
}
