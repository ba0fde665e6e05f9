use crate::session::provider::{AuthError, IdentityProvider, IssuedCredentials};
use crate::session::store::{SessionStore, StorageError, TOKEN_KEY, USER_KEY};
use crate::session::types::{Session, SignupProfile, User};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Errors surfaced by session operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Configuration for the session manager
#[derive(Debug, Clone)]
pub struct SessionManagerConfig {
    /// Upper bound applied to every store call so persistence can never
    /// hang the caller
    pub storage_timeout: Duration,
    /// Session validity in hours; `None` means no expiry marker
    pub session_ttl_hours: Option<u32>,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            storage_timeout: Duration::from_secs(3),
            session_ttl_hours: None,
        }
    }
}

/// Owns the single authenticated identity and its persisted backing.
///
/// Callers hold a reference to one manager instance and pass it where
/// needed; there is no ambient global. The manager persists the user record
/// under [`USER_KEY`] and the token under [`TOKEN_KEY`].
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn SessionStore>,
    session: Arc<RwLock<Option<Session>>>,
    config: SessionManagerConfig,
}

impl SessionManager {
    /// Create a manager with default configuration
    pub fn new(provider: Arc<dyn IdentityProvider>, store: Arc<dyn SessionStore>) -> Self {
        Self::with_config(provider, store, SessionManagerConfig::default())
    }

    /// Create a manager with explicit configuration
    pub fn with_config(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn SessionStore>,
        config: SessionManagerConfig,
    ) -> Self {
        Self {
            provider,
            store,
            session: Arc::new(RwLock::new(None)),
            config,
        }
    }

    /// Attempt to restore a previously persisted session at startup.
    ///
    /// Missing, partial, or corrupt data yields `None`; restore never
    /// surfaces an error to the caller. On success the restored session
    /// becomes the active in-memory session.
    pub async fn restore(&self) -> Option<Session> {
        let user_bytes = match self.bounded(self.store.get(USER_KEY)).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                debug!("Session restore skipped: {}", e);
                return None;
            }
        };
        let token_bytes = match self.bounded(self.store.get(TOKEN_KEY)).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                debug!("Session restore skipped: {}", e);
                return None;
            }
        };

        let user: User = serde_json::from_slice(&user_bytes).ok()?;
        let token = String::from_utf8(token_bytes).ok()?;

        // Expiry is not persisted; a restored session carries no marker and
        // stays valid until the next login refreshes it
        let session = Session {
            user,
            token,
            expires_at: None,
        };

        let mut guard = self.session.write().await;
        *guard = Some(session.clone());

        info!("Restored session for {}", session.user.email);
        Some(session)
    }

    /// Authenticate against the identity provider and establish a session.
    ///
    /// Replaces any existing in-memory session. A persistence failure is
    /// surfaced as [`SessionError::Storage`] but does not roll back the
    /// in-memory session: it stays usable for the current process lifetime
    /// even if it cannot be restored later.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        let credentials = self.provider.authenticate(email, password).await?;
        info!("Login succeeded for {}", email);
        self.establish(credentials).await
    }

    /// Register a new account and establish a session.
    ///
    /// Fails with [`AuthError::DuplicateEmail`] for a known email, in which
    /// case no session is created and nothing is written to the store.
    pub async fn signup(&self, profile: SignupProfile) -> Result<Session, SessionError> {
        let credentials = self.provider.register(&profile).await?;
        info!("Signup succeeded for {}", profile.email);
        self.establish(credentials).await
    }

    /// Clear the persisted session and in-memory state.
    ///
    /// Idempotent: logging out with no active session is a successful no-op.
    pub async fn logout(&self) -> Result<(), StorageError> {
        let mut guard = self.session.write().await;
        *guard = None;
        self.bounded(self.store.remove(&[USER_KEY, TOKEN_KEY]))
            .await?;

        debug!("Session cleared");
        Ok(())
    }

    /// Read-only view of the active session
    pub async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Check whether a session is currently active
    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Install the session in memory, then persist it.
    ///
    /// The write lock is held across the two key writes so overlapping
    /// logins resolve last-writer-wins without interleaving the persisted
    /// `@user`/`@token` pair.
    async fn establish(&self, credentials: IssuedCredentials) -> Result<Session, SessionError> {
        let session = Session::new(
            credentials.user,
            credentials.token,
            self.config.session_ttl_hours,
        );

        let mut guard = self.session.write().await;
        *guard = Some(session.clone());
        let persisted = self.persist(&session).await;
        drop(guard);

        if let Err(e) = &persisted {
            warn!("Session persist failed, keeping in-memory session: {}", e);
        }
        persisted?;

        Ok(session)
    }

    async fn persist(&self, session: &Session) -> Result<(), StorageError> {
        let user_bytes = serde_json::to_vec(&session.user)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;

        self.bounded(self.store.set(USER_KEY, user_bytes)).await?;
        self.bounded(self.store.set(TOKEN_KEY, session.token.clone().into_bytes()))
            .await?;
        Ok(())
    }

    /// Apply the configured timeout to a store call
    async fn bounded<T, F>(&self, operation: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        match tokio::time::timeout(self.config.storage_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout),
        }
    }
}
