use crate::session::types::{MembershipTier, SignupProfile, User};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Authentication errors reported by the identity provider
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("an account already exists for this email")]
    DuplicateEmail,
    #[error("identity provider failure: {0}")]
    Provider(String),
}

/// Credentials issued by the identity provider on a successful
/// authentication or registration
#[derive(Debug, Clone)]
pub struct IssuedCredentials {
    pub user: User,
    pub token: String,
}

/// External identity provider contract.
///
/// Given valid credentials, `authenticate` returns the user plus an opaque
/// token; invalid credentials fail with [`AuthError::InvalidCredentials`].
/// `register` creates a Basic-tier account and fails with
/// [`AuthError::DuplicateEmail`] for a known email.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, email: &str, password: &str)
    -> Result<IssuedCredentials, AuthError>;

    async fn register(&self, profile: &SignupProfile) -> Result<IssuedCredentials, AuthError>;
}

/// In-memory identity provider for local development and tests.
///
/// Keeps registered accounts in a map keyed by email and mints random
/// bearer tokens. Real deployments swap in a network-backed provider.
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    accounts: RwLock<HashMap<String, StoredAccount>>,
}

struct StoredAccount {
    user: User,
    password: String,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IssuedCredentials, AuthError> {
        let accounts = self.accounts.read().await;
        let account = accounts
            .get(email)
            .filter(|account| account.password == password)
            .ok_or(AuthError::InvalidCredentials)?;

        debug!("Authenticated {}", email);
        Ok(IssuedCredentials {
            user: account.user.clone(),
            token: Uuid::new_v4().to_string(),
        })
    }

    async fn register(&self, profile: &SignupProfile) -> Result<IssuedCredentials, AuthError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&profile.email) {
            return Err(AuthError::DuplicateEmail);
        }

        let user = User {
            id: Uuid::new_v4(),
            email: profile.email.clone(),
            name: profile.name.clone(),
            phone: profile.phone.clone(),
            membership_tier: MembershipTier::Basic,
            member_since: Utc::now(),
        };

        accounts.insert(
            profile.email.clone(),
            StoredAccount {
                user: user.clone(),
                password: profile.password.clone(),
            },
        );

        debug!("Registered new account for {}", profile.email);
        Ok(IssuedCredentials {
            user,
            token: Uuid::new_v4().to_string(),
        })
    }
}
