//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered citizen, admin, or department account
///
/// Email is stored lowercased; email and username are each globally unique.
/// The password hash is an Argon2id PHC string and never leaves the data
/// layer in API responses (see [`UserView`]).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    /// Argon2id PHC-format password hash
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    /// Role tag: citizen, admin, department
    pub role: String,
    pub is_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Sanitized view safe to attach to requests and serialize to clients.
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
            role: self.role.clone(),
            is_verified: self.is_verified,
            last_login: self.last_login,
        }
    }
}

/// Sanitized user identity attached to authenticated requests
///
/// Never includes the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub is_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
}

/// User roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Citizen,
    Admin,
    Department,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Citizen => "citizen",
            Self::Admin => "admin",
            Self::Department => "department",
        }
    }
}

// =============================================================================
// Session Records
// =============================================================================

/// Short/long classification of a session
///
/// Stored explicitly per record instead of being re-inferred from the
/// remaining TTL on every touch. Set at login: remember-me logins create
/// long-lived sessions, everything else is short-lived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    ShortLived,
    LongLived,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortLived => "short",
            Self::LongLived => "long",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "long" => Self::LongLived,
            _ => Self::ShortLived,
        }
    }
}

/// One active login for a user
///
/// Owned exclusively by its user; mutated only through the session
/// operations on [`super::Database`]. Deleted on logout or expiry sweep,
/// never archived. Any lookup treats `expires_at <= now` as absent.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionRecord {
    /// Opaque identifier presented by the client (never the user id)
    pub session_id: String,
    pub user_id: String,
    /// "short" or "long", see [`SessionKind`]
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn kind(&self) -> SessionKind {
        SessionKind::from_str(&self.kind)
    }

    /// Whether this record is logically expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
