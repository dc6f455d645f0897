// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Geolocation provider seam.
//!
//! The browser exposes geolocation as a one-shot callback API; here it is
//! a single-shot async operation so the consent flow can bound it with a
//! timeout and always reach a terminal state.

use async_trait::async_trait;

use crate::models::Coordinates;

/// Geolocation failure categories, mirroring the browser API's codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeoError {
    #[error("geolocation permission denied")]
    Denied,
    #[error("position unavailable")]
    Unavailable,
    #[error("geolocation read timed out")]
    Timeout,
}

/// One-shot position read.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    async fn current_position(&self, high_accuracy: bool) -> Result<Coordinates, GeoError>;
}
