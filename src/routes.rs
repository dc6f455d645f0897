// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route authorization: maps a requested route plus the current gate
//! state to render or redirect.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::gate::GateState;
use crate::models::Role;

/// The single requirement a route declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum RouteRequirement {
    Public,
    RequiresSession,
    RequiresSessionAndProfile,
    RequiresRole(Role),
}

/// A route as declared by the shell's route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSpec {
    pub requirement: RouteRequirement,
    /// Sign-in/sign-up routes are inverse-gated: an authorized user is
    /// sent away from them.
    pub redirect_authenticated: bool,
}

impl RouteSpec {
    pub const fn public() -> Self {
        Self {
            requirement: RouteRequirement::Public,
            redirect_authenticated: false,
        }
    }

    pub const fn auth_entry() -> Self {
        Self {
            requirement: RouteRequirement::Public,
            redirect_authenticated: true,
        }
    }

    pub const fn requires(requirement: RouteRequirement) -> Self {
        Self {
            requirement,
            redirect_authenticated: false,
        }
    }
}

/// Where a denied route sends the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum RedirectTarget {
    SignIn,
    Home,
}

/// Authorization outcome for one route request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum RouteDecision {
    Render,
    Redirect(RedirectTarget),
    /// The gate has not settled yet; keep the splash screen up rather
    /// than redirect-flicker.
    Pending,
}

/// Decide whether the route renders for the given gate state.
pub fn authorize(route: &RouteSpec, state: &GateState) -> RouteDecision {
    if matches!(state, GateState::Loading) {
        return RouteDecision::Pending;
    }

    // Inverse gating: already signed in, go home instead of sign-in.
    if route.redirect_authenticated && matches!(state, GateState::Authorized { .. }) {
        return RouteDecision::Redirect(RedirectTarget::Home);
    }

    match route.requirement {
        RouteRequirement::Public => RouteDecision::Render,

        RouteRequirement::RequiresSession => match state {
            GateState::Authorized { .. } => RouteDecision::Render,
            _ => RouteDecision::Redirect(RedirectTarget::SignIn),
        },

        RouteRequirement::RequiresSessionAndProfile => match state {
            GateState::Authorized {
                profile: Some(_), ..
            } => RouteDecision::Render,
            _ => RouteDecision::Redirect(RedirectTarget::SignIn),
        },

        RouteRequirement::RequiresRole(required) => match state {
            GateState::Authorized {
                profile: Some(profile),
                ..
            } if profile.role.satisfies(required) => RouteDecision::Render,
            _ => RouteDecision::Redirect(RedirectTarget::Home),
        },
    }
}
