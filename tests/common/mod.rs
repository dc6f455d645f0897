// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use atlantic_portal::config::Config;
use atlantic_portal::db::ProfileStore;
use atlantic_portal::error::AppError;
use atlantic_portal::models::{
    Coordinates, Identity, NotificationFlags, Profile, Role, Session,
};
use atlantic_portal::services::{AuthApi, GeoError, GeoProvider};
use atlantic_portal::storage::{KvStore, MemoryKvStore, SESSION_KEY};
use atlantic_portal::SessionContext;

/// Auth provider fake: canned sessions, call counters.
#[derive(Default)]
#[allow(dead_code)]
pub struct FakeAuthApi {
    pub exchange_session: Mutex<Option<Session>>,
    pub refresh_session: Mutex<Option<Session>>,
    pub sign_out_calls: AtomicUsize,
    pub fail_sign_out: AtomicBool,
    pub network_calls: AtomicUsize,
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    fn authorize_url(&self, redirect_to: &str, code_challenge: &str) -> String {
        format!("fake://authorize?redirect_to={redirect_to}&challenge={code_challenge}")
    }

    async fn exchange_code(&self, _code: &str, _verifier: &str) -> Result<Session, AppError> {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        self.exchange_session
            .lock()
            .await
            .clone()
            .ok_or_else(|| AppError::Auth("no exchange session configured".to_string()))
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<Session, AppError> {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_session
            .lock()
            .await
            .clone()
            .ok_or_else(|| AppError::Auth("refresh rejected".to_string()))
    }

    async fn fetch_user(&self, _access_token: &str) -> Result<Identity, AppError> {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        Err(AppError::Auth("fetch_user not configured".to_string()))
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AppError> {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AppError::Auth("logout returned HTTP 503".to_string()));
        }
        Ok(())
    }
}

/// Table storage fake backed by a concurrent map.
#[derive(Default)]
#[allow(dead_code)]
pub struct FakeProfileStore {
    pub rows: DashMap<String, Profile>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub set_location_calls: AtomicUsize,
    pub clear_location_calls: AtomicUsize,
    pub network_calls: AtomicUsize,
}

#[async_trait]
impl ProfileStore for FakeProfileStore {
    async fn get_profile(&self, id: &str) -> Result<Option<Profile>, AppError> {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Storage("storage unavailable".to_string()));
        }
        Ok(self.rows.get(id).map(|r| r.value().clone()))
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        self.rows.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn set_location(&self, id: &str, coords: Coordinates) -> Result<(), AppError> {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        self.set_location_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Storage("write failed".to_string()));
        }
        if let Some(mut row) = self.rows.get_mut(id) {
            row.latitude = Some(coords.latitude);
            row.longitude = Some(coords.longitude);
        }
        Ok(())
    }

    async fn clear_location(&self, id: &str) -> Result<(), AppError> {
        self.network_calls.fetch_add(1, Ordering::SeqCst);
        self.clear_location_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Storage("write failed".to_string()));
        }
        if let Some(mut row) = self.rows.get_mut(id) {
            row.latitude = None;
            row.longitude = None;
        }
        Ok(())
    }
}

/// Geolocation fake returning a canned reading.
pub struct StaticGeo(pub Result<Coordinates, GeoError>);

#[async_trait]
impl GeoProvider for StaticGeo {
    async fn current_position(&self, _high_accuracy: bool) -> Result<Coordinates, GeoError> {
        self.0
    }
}

/// Geolocation fake that never resolves; pairs with paused tokio time to
/// exercise the read timeout.
pub struct PendingGeo;

#[async_trait]
impl GeoProvider for PendingGeo {
    async fn current_position(&self, _high_accuracy: bool) -> Result<Coordinates, GeoError> {
        std::future::pending().await
    }
}

/// Assembled test fixture.
#[allow(dead_code)]
pub struct Fixture {
    pub ctx: SessionContext,
    pub auth: Arc<FakeAuthApi>,
    pub store: Arc<FakeProfileStore>,
    pub kv: Arc<MemoryKvStore>,
}

/// Build a test context with fake collaborators and the given geo
/// provider.
#[allow(dead_code)]
pub fn test_context(geo: Arc<dyn GeoProvider>) -> Fixture {
    test_context_with_config(Config::test_default(), geo)
}

#[allow(dead_code)]
pub fn test_context_with_config(config: Config, geo: Arc<dyn GeoProvider>) -> Fixture {
    let auth = Arc::new(FakeAuthApi::default());
    let store = Arc::new(FakeProfileStore::default());
    let kv = Arc::new(MemoryKvStore::new());

    let ctx = SessionContext::with_backends(
        config,
        auth.clone(),
        store.clone(),
        geo,
        kv.clone(),
    );

    Fixture {
        ctx,
        auth,
        store,
        kv,
    }
}

#[allow(dead_code)]
pub fn identity(id: &str) -> Identity {
    Identity {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
        display_name: Some("Captain Mira".to_string()),
        avatar_url: None,
    }
}

#[allow(dead_code)]
pub fn session(id: &str) -> Session {
    Session {
        access_token: "access-token".to_string(),
        refresh_token: "refresh-token".to_string(),
        expires_at: Utc::now() + Duration::hours(1),
        identity: identity(id),
    }
}

#[allow(dead_code)]
pub fn profile(id: &str) -> Profile {
    Profile {
        id: id.to_string(),
        username: "capt_mira".to_string(),
        display_name: "Captain Mira".to_string(),
        avatar_url: None,
        role: Role::User,
        banned: false,
        latitude: None,
        longitude: None,
        notifications: NotificationFlags::default(),
        can_edit_profile: true,
        created_at: "2026-01-01T00:00:00Z".to_string(),
    }
}

/// Seed a persisted session snapshot, as a returning browser tab has.
#[allow(dead_code)]
pub fn seed_session(kv: &MemoryKvStore, id: &str) {
    let raw = serde_json::to_string(&session(id)).unwrap();
    kv.set(SESSION_KEY, &raw);
}
