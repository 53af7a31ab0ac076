use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use crate::models::User;

/// Credential and identity of a logged-in user.
///
/// The token and the user are only ever stored together, so one cannot be
/// present without the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authenticated {
    pub token: String,
    pub user: User,
    pub created_at: DateTime<Utc>,
}

impl Authenticated {
    pub fn new(token: String, user: User) -> Self {
        Self {
            token,
            user,
            created_at: Utc::now(),
        }
    }
}

/// Shared handle to the current session.
///
/// Clone is cheap; all clones observe and mutate the same state. Every
/// mutation goes through the single `watch::Sender`, so writes are
/// serialized and each one is published to subscribers (route guards).
#[derive(Clone)]
pub struct SessionState {
    tx: Arc<watch::Sender<Option<Authenticated>>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the token
        f.debug_struct("SessionState")
            .field("user", &self.user())
            .finish()
    }
}

impl SessionState {
    /// Create an empty (logged-out) session
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_user_logged(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Current identity, or `None` when logged out
    pub fn user(&self) -> Option<User> {
        self.tx.borrow().as_ref().map(|a| a.user.clone())
    }

    /// Token to attach to the next call
    pub fn credential(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|a| a.token.clone())
    }

    pub fn snapshot(&self) -> Option<Authenticated> {
        self.tx.borrow().clone()
    }

    /// Receive a notification on every login and logout.
    pub fn subscribe(&self) -> watch::Receiver<Option<Authenticated>> {
        self.tx.subscribe()
    }

    /// Install a previously persisted session.
    pub fn restore(&self, auth: Authenticated) {
        info!(user = %auth.user.username, "Session restored");
        self.tx.send_replace(Some(auth));
    }

    pub(crate) fn establish(&self, auth: Authenticated) {
        self.tx.send_replace(Some(auth));
    }

    /// Clear credential and user. Calling it while logged out is a no-op.
    pub fn logout(&self) {
        let cleared = self.tx.send_if_modified(|state| state.take().is_some());
        if cleared {
            info!("Logged out");
        }
    }

    /// Clear the session only if it still holds `token`.
    ///
    /// A 401 for a credential that has since been replaced by a new login
    /// must not end the new session. Returns whether the session was cleared.
    pub(crate) fn invalidate(&self, token: &str) -> bool {
        self.tx.send_if_modified(|state| match state {
            Some(auth) if auth.token == token => {
                *state = None;
                true
            }
            _ => false,
        })
    }
}
