// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location-consent flow tests: prompt gating, grant/deny persistence,
//! refusal markers, forced reprompt, and the bounded geolocation read.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use atlantic_portal::gate::GateState;
use atlantic_portal::models::Coordinates;
use atlantic_portal::services::GeoError;
use atlantic_portal::session::SessionEvent;

use common::*;

fn geo_ok(latitude: f64, longitude: f64) -> Arc<StaticGeo> {
    Arc::new(StaticGeo(Ok(Coordinates::new(latitude, longitude))))
}

fn geo_err(e: GeoError) -> Arc<StaticGeo> {
    Arc::new(StaticGeo(Err(e)))
}

/// Resolve to the prompt with a location-less profile for `u-1`.
async fn resolve_to_prompt(f: &Fixture) -> GateState {
    seed_session(&f.kv, "u-1");
    f.store.rows.insert("u-1".to_string(), profile("u-1"));
    f.ctx.gate.resolve().await
}

/// Re-run the pipeline without touching the refusal marker (the marker is
/// only cleared by a fresh sign-in, not by a re-resolve).
async fn rerun(f: &Fixture) -> GateState {
    f.ctx
        .gate
        .handle_event(SessionEvent::SignedIn(identity("u-1")))
        .await
}

#[tokio::test]
async fn missing_location_without_marker_prompts_before_authorizing() {
    let f = test_context(geo_ok(48.8566, 2.3522));
    let state = resolve_to_prompt(&f).await;
    assert!(matches!(state, GateState::LocationPrompt { .. }));
}

#[tokio::test]
async fn grant_persists_exact_coordinates_and_stops_prompting() {
    let f = test_context(geo_ok(48.8566, 2.3522));
    resolve_to_prompt(&f).await;

    let state = f.ctx.gate.grant_location().await.unwrap();
    match &state {
        GateState::Authorized {
            profile: Some(p), ..
        } => {
            assert_eq!(p.latitude, Some(48.8566));
            assert_eq!(p.longitude, Some(2.3522));
        }
        other => panic!("expected Authorized with profile, got {other:?}"),
    }

    // Persisted exactly.
    let row = f.store.rows.get("u-1").unwrap();
    assert_eq!(row.latitude, Some(48.8566));
    assert_eq!(row.longitude, Some(2.3522));
    drop(row);

    // Subsequent loads classify as normal without re-prompting.
    let state = rerun(&f).await;
    assert!(matches!(state, GateState::Authorized { .. }));
    assert!(!f.ctx.consent.is_refused("u-1"));
}

#[tokio::test]
async fn deny_persists_nulls_sets_marker_and_still_authorizes() {
    let f = test_context(geo_ok(48.8566, 2.3522));
    resolve_to_prompt(&f).await;

    let state = f.ctx.gate.deny_location().await.unwrap();
    assert!(matches!(state, GateState::Authorized { .. }));

    assert_eq!(f.store.clear_location_calls.load(Ordering::SeqCst), 1);
    assert_eq!(f.store.set_location_calls.load(Ordering::SeqCst), 0);
    assert!(f.ctx.consent.is_refused("u-1"));

    // No re-prompt this browser session.
    let state = rerun(&f).await;
    assert!(matches!(state, GateState::Authorized { .. }));
}

#[tokio::test]
async fn geolocation_denial_is_treated_as_explicit_deny() {
    let f = test_context(geo_err(GeoError::Denied));
    resolve_to_prompt(&f).await;

    let state = f.ctx.gate.grant_location().await.unwrap();
    assert!(matches!(state, GateState::Authorized { .. }));
    assert_eq!(f.store.clear_location_calls.load(Ordering::SeqCst), 1);
    assert!(f.ctx.consent.is_refused("u-1"));
}

#[tokio::test(start_paused = true)]
async fn geolocation_timeout_resolves_as_deny() {
    let f = test_context(Arc::new(PendingGeo));
    resolve_to_prompt(&f).await;

    // The provider never answers; the bounded read must still resolve.
    let state = f.ctx.gate.grant_location().await.unwrap();
    assert!(matches!(state, GateState::Authorized { .. }));
    assert!(f.ctx.consent.is_refused("u-1"));
}

#[tokio::test]
async fn boundary_coordinates_are_accepted() {
    let f = test_context(geo_ok(-90.0, 180.0));
    resolve_to_prompt(&f).await;

    f.ctx.gate.grant_location().await.unwrap();

    let row = f.store.rows.get("u-1").unwrap();
    assert_eq!(row.latitude, Some(-90.0));
    assert_eq!(row.longitude, Some(180.0));
}

#[tokio::test]
async fn out_of_range_coordinates_are_rejected_and_never_persisted() {
    let f = test_context(geo_ok(90.0001, 0.0));
    resolve_to_prompt(&f).await;

    let state = f.ctx.gate.grant_location().await.unwrap();
    assert!(matches!(state, GateState::Authorized { .. }));

    assert_eq!(f.store.set_location_calls.load(Ordering::SeqCst), 0);
    assert!(f.ctx.consent.is_refused("u-1"));
    let row = f.store.rows.get("u-1").unwrap();
    assert_eq!(row.latitude, None);
    assert_eq!(row.longitude, None);
}

#[tokio::test]
async fn forced_reprompt_overrides_marker_until_cleared() {
    let f = test_context(geo_ok(48.8566, 2.3522));
    resolve_to_prompt(&f).await;
    f.ctx.gate.deny_location().await.unwrap();
    assert!(f.ctx.consent.is_refused("u-1"));

    // Forced: the prompt shows despite the marker, idempotently.
    f.ctx.gate.set_force_location_prompt(true);
    let state = rerun(&f).await;
    assert!(matches!(state, GateState::LocationPrompt { .. }));
    f.ctx.gate.deny_location().await.unwrap();
    let state = rerun(&f).await;
    assert!(matches!(state, GateState::LocationPrompt { .. }));

    // Clearing the flag restores marker behavior.
    f.ctx.gate.set_force_location_prompt(false);
    f.ctx.gate.deny_location().await.unwrap();
    let state = rerun(&f).await;
    assert!(matches!(state, GateState::Authorized { .. }));
}

#[tokio::test]
async fn fresh_sign_in_clears_marker_and_prompts_again() {
    let f = test_context(geo_ok(48.8566, 2.3522));
    resolve_to_prompt(&f).await;
    f.ctx.gate.deny_location().await.unwrap();
    assert!(f.ctx.consent.is_refused("u-1"));

    // Sign out, then a fresh login for the same user.
    f.ctx.gate.sign_out().await.unwrap();
    f.ctx.sessions.complete_sign_in(session("u-1")).await;
    assert!(!f.ctx.consent.is_refused("u-1"));

    let state = f
        .ctx
        .gate
        .handle_event(SessionEvent::SignedIn(identity("u-1")))
        .await;
    assert!(matches!(state, GateState::LocationPrompt { .. }));
}

#[tokio::test]
async fn persist_failure_still_completes_the_transition() {
    let f = test_context(geo_ok(48.8566, 2.3522));
    resolve_to_prompt(&f).await;
    f.store.fail_writes.store(true, Ordering::SeqCst);

    let state = f.ctx.gate.grant_location().await.unwrap();
    // The write failed but the user is not stranded in the prompt.
    assert!(matches!(state, GateState::Authorized { .. }));
}

#[tokio::test]
async fn grant_outside_prompt_state_is_rejected() {
    let f = test_context(geo_ok(48.8566, 2.3522));
    assert_eq!(f.ctx.gate.resolve().await, GateState::Unauthenticated);
    assert!(f.ctx.gate.grant_location().await.is_err());
    assert!(f.ctx.gate.deny_location().await.is_err());
}
