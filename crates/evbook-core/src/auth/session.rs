use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{AuthApi, AuthError, AuthRequest};
use crate::storage::{Storage, SESSION_KEY, TOKEN_KEY};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// The authenticated identity of this client.
///
/// Token and user are always present together; `is_authenticated` is
/// derived from the token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(token: String, user: User) -> Self {
        Self {
            token: Some(token),
            user: Some(user),
        }
    }

    /// Get the bearer token if authenticated
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// On-disk form of [`Session`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord {
    token: Option<String>,
    user: Option<User>,
    #[serde(default)]
    is_authenticated: bool,
}

impl From<&Session> for SessionRecord {
    fn from(session: &Session) -> Self {
        Self {
            token: session.token.clone(),
            user: session.user.clone(),
            is_authenticated: session.is_authenticated(),
        }
    }
}

impl From<SessionRecord> for Session {
    fn from(record: SessionRecord) -> Self {
        // The stored flag is not trusted; a session needs both halves
        match (record.token, record.user) {
            (Some(token), Some(user)) if !token.is_empty() => Session::authenticated(token, user),
            _ => Session::anonymous(),
        }
    }
}

/// Owner of the current [`Session`].
///
/// Every mutation is mirrored into persisted storage and then published to
/// subscribers. Other components read the persisted token through
/// [`SessionStore::persisted_token`] and never write storage themselves.
pub struct SessionStore {
    state: watch::Sender<Session>,
    storage: Arc<dyn Storage>,
}

impl SessionStore {
    /// Create an empty store without reading storage
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let (state, _) = watch::channel(Session::anonymous());
        Self { state, storage }
    }

    /// Create a store from the persisted session record, if any
    pub fn restore(storage: Arc<dyn Storage>) -> Self {
        let session = match Self::load_record(storage.as_ref()) {
            Ok(Some(record)) => Session::from(record),
            Ok(None) => Session::anonymous(),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable session record");
                Session::anonymous()
            }
        };
        debug!(authenticated = session.is_authenticated(), "Session restored");

        let (state, _) = watch::channel(session);
        Self { state, storage }
    }

    fn load_record(storage: &dyn Storage) -> Result<Option<SessionRecord>, crate::storage::StorageError> {
        match storage.get(SESSION_KEY)? {
            Some(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            None => Ok(None),
        }
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// In-memory token, independent of persisted storage
    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Receive every subsequent session change
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub async fn login(
        &self,
        api: &dyn AuthApi,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        self.authenticate(
            api,
            AuthRequest::Login {
                email: email.to_string(),
                password: password.to_string(),
            },
        )
        .await
    }

    pub async fn signup(
        &self,
        api: &dyn AuthApi,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Session, AuthError> {
        self.authenticate(
            api,
            AuthRequest::Signup {
                email: email.to_string(),
                password: password.to_string(),
                name: name.to_string(),
            },
        )
        .await
    }

    async fn authenticate(&self, api: &dyn AuthApi, request: AuthRequest) -> Result<Session, AuthError> {
        let operation = request.operation();
        let payload = api.authenticate(&request).await?;
        let (token, user) = payload.normalize()?;

        info!(user_id = %user.id, operation = %operation, "Authenticated");
        let session = Session::authenticated(token, user);
        self.persist(&session);
        self.state.send_replace(session.clone());
        Ok(session)
    }

    /// Clear the session. Safe to call when already logged out.
    pub fn logout(&self) {
        // State goes first so a concurrent request can no longer mirror the
        // old token back after storage is cleared.
        let previous = self.state.send_replace(Session::anonymous());

        for key in [TOKEN_KEY, SESSION_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(error = %e, key, "Failed to remove persisted session entry");
            }
        }

        if previous.is_authenticated() {
            info!("Logged out");
        }
    }

    /// Token as currently persisted. Storage failures read as absent.
    pub fn persisted_token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token");
                None
            }
        }
    }

    fn holds_token(&self, token: &str) -> bool {
        self.state.borrow().token.as_deref() == Some(token)
    }

    /// Write the session token back into persisted storage when it went
    /// missing. A token that is no longer the session's is never written, and
    /// one that was replaced while writing is removed again.
    pub(crate) fn mirror_token(&self, token: &str) {
        if !self.holds_token(token) {
            return;
        }
        if let Err(e) = self.storage.set(TOKEN_KEY, token) {
            warn!(error = %e, "Failed to persist token");
            return;
        }
        if !self.holds_token(token) {
            debug!("Session changed while mirroring token, discarding it");
            if let Err(e) = self.storage.remove(TOKEN_KEY) {
                warn!(error = %e, "Failed to remove stale token");
            }
        }
    }

    fn persist(&self, session: &Session) {
        if let Some(token) = session.token() {
            if let Err(e) = self.storage.set(TOKEN_KEY, token) {
                warn!(error = %e, "Failed to persist token");
            }
        }
        let record = SessionRecord::from(session);
        match serde_json::to_string(&record) {
            Ok(contents) => {
                if let Err(e) = self.storage.set(SESSION_KEY, &contents) {
                    warn!(error = %e, "Failed to persist session record");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize session record"),
        }
    }
}
