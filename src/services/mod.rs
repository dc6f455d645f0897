// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - external collaborator clients.

pub mod auth;
pub mod geo;
pub mod pkce;

pub use auth::{AuthApi, RestAuthClient};
pub use geo::{GeoError, GeoProvider};
pub use pkce::PkcePair;
