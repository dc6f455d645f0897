// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session store: single source of truth for "is someone logged in, and
//! as whom".
//!
//! Wraps the external auth provider. The store restores a persisted
//! session at startup, refreshes it when expired, and broadcasts every
//! change to the one active subscriber. Provider failures never escape
//! `current_session`: they degrade to "no session" so the UI always
//! reaches a terminal state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, RwLock};

use crate::error::{AppError, Result};
use crate::models::{Identity, Session};
use crate::services::AuthApi;
use crate::storage::{ConsentStore, KvStore, SESSION_KEY};

/// A change reported by the auth provider.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignedIn(Identity),
    TokenRefreshed(Identity),
    SignedOut,
}

/// Subscription handle for session changes.
///
/// At most one exists per store; dropping it releases the slot.
pub struct SessionSubscription {
    rx: watch::Receiver<SessionEvent>,
    slot: Arc<AtomicBool>,
}

impl SessionSubscription {
    /// Wait for the next session change. Returns `None` if the store has
    /// been torn down.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.slot.store(false, Ordering::Release);
    }
}

/// Session store.
pub struct SessionStore {
    auth: Arc<dyn AuthApi>,
    kv: Arc<dyn KvStore>,
    consent: ConsentStore,
    current: RwLock<Option<Session>>,
    events: watch::Sender<SessionEvent>,
    subscribed: Arc<AtomicBool>,
}

impl SessionStore {
    pub fn new(auth: Arc<dyn AuthApi>, kv: Arc<dyn KvStore>, consent: ConsentStore) -> Self {
        let (events, _) = watch::channel(SessionEvent::SignedOut);
        Self {
            auth,
            kv,
            consent,
            current: RwLock::new(None),
            events,
            subscribed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Resolve the current session: the one-shot startup call.
    ///
    /// Restores the persisted snapshot, refreshing through the provider
    /// when expired. Any failure resolves to `None` rather than an error.
    pub async fn current_session(&self) -> Option<Session> {
        if let Some(session) = self.current.read().await.clone() {
            if !session.is_expired() {
                return Some(session);
            }
        }

        let persisted = match self.restore_persisted().await {
            Some(session) => session,
            None => return None,
        };

        if !persisted.is_expired() {
            *self.current.write().await = Some(persisted.clone());
            return Some(persisted);
        }

        match self.auth.refresh(&persisted.refresh_token).await {
            Ok(fresh) => {
                self.persist(&fresh);
                *self.current.write().await = Some(fresh.clone());
                self.events
                    .send_replace(SessionEvent::TokenRefreshed(fresh.identity.clone()));
                Some(fresh)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session refresh failed, resolving to signed out");
                self.kv.remove(SESSION_KEY);
                *self.current.write().await = None;
                None
            }
        }
    }

    /// Register the single change subscription.
    pub fn subscribe(&self) -> Result<SessionSubscription> {
        if self.subscribed.swap(true, Ordering::AcqRel) {
            return Err(AppError::SubscriptionBusy);
        }
        Ok(SessionSubscription {
            rx: self.events.subscribe(),
            slot: self.subscribed.clone(),
        })
    }

    /// Complete a sign-in (OAuth callback code exchange already done).
    ///
    /// On the transition from "no session" to "has session" the stored
    /// location-refused marker for this user is cleared, so the consent
    /// prompt reconsiders on a fresh login.
    pub async fn complete_sign_in(&self, session: Session) {
        let mut current = self.current.write().await;
        let was_signed_out = current.is_none();
        let identity = session.identity.clone();

        self.persist(&session);
        *current = Some(session);
        drop(current);

        if was_signed_out {
            self.consent.clear(&identity.id);
        }

        tracing::info!(user_id = %identity.id, "Signed in");
        self.events.send_replace(SessionEvent::SignedIn(identity));
    }

    /// Sign out. The provider call is best-effort: local state is cleared
    /// and the change broadcast even if it fails, so the user is never
    /// stranded signed-in. The error, if any, is returned for a transient
    /// user message.
    pub async fn sign_out(&self) -> Result<()> {
        let session = self.current.write().await.take();
        self.kv.remove(SESSION_KEY);

        let result = match &session {
            Some(session) => match self.auth.sign_out(&session.access_token).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    tracing::warn!(error = %e, "Provider sign-out failed, clearing locally");
                    Err(e)
                }
            },
            None => Ok(()),
        };

        self.events.send_replace(SessionEvent::SignedOut);
        result
    }

    async fn restore_persisted(&self) -> Option<Session> {
        let raw = self.kv.get(SESSION_KEY)?;
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable persisted session");
                self.kv.remove(SESSION_KEY);
                None
            }
        }
    }

    fn persist(&self, session: &Session) {
        match serde_json::to_string(session) {
            Ok(raw) => self.kv.set(SESSION_KEY, &raw),
            Err(e) => tracing::error!(error = %e, "Failed to serialize session snapshot"),
        }
    }
}
