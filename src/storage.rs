// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persistent key/value storage.
//!
//! Stands in for the browser's persistent store: the hosting shell injects
//! its own implementation, tests and native hosts use [`MemoryKvStore`].
//! Two things live here: the persisted session snapshot and the per-user
//! "location refused" markers.

use std::sync::Arc;

use dashmap::DashMap;

/// Key under which the session snapshot is persisted.
pub const SESSION_KEY: &str = "portal.session";

/// Key holding the PKCE verifier between redirect and callback.
pub const PKCE_VERIFIER_KEY: &str = "portal.pkce_verifier";

const REFUSED_PREFIX: &str = "refused:";

/// Minimal persistent key/value store interface.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory store backed by a concurrent map.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: DashMap<String, String>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}

/// Per-user "location refused" markers, keyed `refused:<userId>`.
///
/// A marker has no expiry of its own; it is cleared only when the same
/// user signs in fresh, so the prompt can reconsider consent.
#[derive(Clone)]
pub struct ConsentStore {
    kv: Arc<dyn KvStore>,
}

impl ConsentStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    fn key(user_id: &str) -> String {
        format!("{REFUSED_PREFIX}{user_id}")
    }

    pub fn is_refused(&self, user_id: &str) -> bool {
        self.kv.get(&Self::key(user_id)).is_some()
    }

    pub fn set_refused(&self, user_id: &str) {
        self.kv.set(&Self::key(user_id), "1");
    }

    pub fn clear(&self, user_id: &str) {
        self.kv.remove(&Self::key(user_id));
    }
}
