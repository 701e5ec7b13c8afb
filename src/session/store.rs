//! Session state holder with persist-on-mutation semantics.
//!
//! `SessionStore` owns the current authentication token for the whole process.
//! It rehydrates the last persisted state when opened, writes every mutation
//! back through its storage backend, and hands out cheap clones so the login
//! flow (the only writer) and the request authenticator (a reader) share one
//! instance.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::storage::SessionStorage;

/// Persisted session record.
///
/// The token is opaque: whatever credential the login flow obtained is stored
/// and later forwarded verbatim. An absent or empty token means
/// unauthenticated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub token: Option<String>,
    /// When the state last changed. Informational; nothing expires.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// The current credential, normalized: empty counts as unauthenticated.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

struct Inner {
    state: SessionState,
    storage: Box<dyn SessionStorage>,
}

/// Shared holder for the current session.
///
/// Clone is cheap - clones share one underlying instance, so a token change
/// is visible to every holder on the very next read. Mutation and persistence
/// happen under one lock, keeping the persisted order equal to the mutation
/// order.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<Inner>>,
}

impl SessionStore {
    /// Open the session over the given storage backend.
    ///
    /// The last persisted state is rehydrated here; no separate load call
    /// exists. A backend with nothing saved yields the unauthenticated
    /// default, while an unreadable or corrupt state is reported as an error.
    pub fn open<S>(storage: S) -> Result<Self>
    where
        S: SessionStorage + 'static,
    {
        let state = storage
            .load()
            .context("Failed to load persisted session state")?
            .unwrap_or_default();
        debug!(authenticated = state.token().is_some(), "Session opened");

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                state,
                storage: Box::new(storage),
            })),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Mutations under the lock are plain field writes that cannot leave
        // the state partial, so a poisoned lock is safe to recover.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current credential, or `None` when unauthenticated. Pure read.
    pub fn token(&self) -> Option<String> {
        self.lock().state.token().map(str::to_string)
    }

    /// Whether a credential is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.lock().state.token().is_some()
    }

    /// Replace the credential and persist the new state.
    ///
    /// The token contents are not validated; full replacement, no
    /// accumulation. A persistence failure propagates to the caller while the
    /// in-memory value keeps the new token, so the session is not silently
    /// lost.
    pub fn set_token(&self, token: impl Into<String>) -> Result<()> {
        let mut inner = self.lock();
        inner.state.token = Some(token.into());
        inner.state.updated_at = Some(Utc::now());
        Self::persist(&inner)
    }

    /// Drop the credential and persist the unauthenticated state.
    ///
    /// Same persistence contract as [`SessionStore::set_token`].
    pub fn clear_token(&self) -> Result<()> {
        let mut inner = self.lock();
        inner.state.token = None;
        inner.state.updated_at = Some(Utc::now());
        Self::persist(&inner)
    }

    fn persist(inner: &Inner) -> Result<()> {
        inner
            .storage
            .save(&inner.state)
            .context("Failed to persist session state")
    }
}
