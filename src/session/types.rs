use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Membership tier of a registered user
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MembershipTier {
    Basic,
    Premium,
}

/// A registered user of the charging app.
///
/// Created on signup; immutable for the lifetime of a session apart from
/// tier upgrades, which happen outside this crate.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub membership_tier: MembershipTier,
    pub member_since: DateTime<Utc>,
}

/// Profile supplied by a new user at signup
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SignupProfile {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub password: String,
}

/// The live authenticated identity bound to a client process.
///
/// Pairs the user with an opaque bearer token. At most one session is
/// active per [`crate::session::SessionManager`] instance.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Session {
    pub user: User,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a session valid for an optional number of hours from now
    pub fn new(user: User, token: String, ttl_hours: Option<u32>) -> Self {
        Self {
            user,
            token,
            expires_at: ttl_hours.map(|hours| Utc::now() + chrono::Duration::hours(hours as i64)),
        }
    }

    /// Check whether the validity marker has passed
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}
