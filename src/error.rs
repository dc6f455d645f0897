// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.
//!
//! The gate recovers most failures locally (a failed session fetch becomes
//! "no session", a failed profile fetch becomes "profile absent"), so the
//! variants here mostly exist for logging and for the few surfaces that
//! report transient write failures to the user.

use crate::services::geo::GeoError;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Auth backend error: {0}")]
    Auth(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Geolocation error: {0}")]
    Geolocation(#[from] GeoError),

    #[error("Coordinates out of range: lat {latitude}, lon {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("Session store already has an active subscription")]
    SubscriptionBusy,

    #[error("Operation not valid in gate state {0}")]
    InvalidGateState(&'static str),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Failures that degrade to the signed-out experience instead of being
    /// surfaced as an error message.
    pub fn recovers_to_signed_out(&self) -> bool {
        matches!(self, AppError::Auth(_) | AppError::Storage(_))
    }

    /// Write failures reported to the user as transient while the state
    /// machine still completes its transition.
    pub fn is_transient_write(&self) -> bool {
        matches!(self, AppError::Storage(_) | AppError::Auth(_))
    }
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, AppError>;
