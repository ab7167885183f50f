//! Session lifecycle management
//!
//! Orchestrates login, logout, and the rolling-expiry touch behavior over
//! the session store. Each (user, session id) pair moves through
//! Absent -> Active(short|long) -> Expired/Removed; a record whose
//! `expires_at` has passed is treated as absent by every lookup, never left
//! to the background sweep alone.

use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

use super::password;
use super::rate_limit::LoginRateLimiter;
use crate::config::{AppConfig, AuthConfig};
use crate::data::{Database, EntityId, SessionKind, SessionRecord, User, UserRole};
use crate::error::AppError;
use crate::metrics::{
    LOGIN_ATTEMPTS_TOTAL, REGISTRATIONS_TOTAL, SESSION_TOUCHES_TOTAL, SESSIONS_CREATED_TOTAL,
    SESSIONS_REMOVED_TOTAL,
};

/// Opaque session identifier length in random bytes (before base64)
const SESSION_ID_BYTES: usize = 32;

/// Mint a new opaque session identifier
///
/// 32 random bytes, URL-safe base64. Correlates the transport cookie to a
/// session record; never derived from the user id.
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// TTL policy for the two session classes
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    pub short_ttl: Duration,
    pub long_ttl: Duration,
}

impl SessionPolicy {
    pub fn from_config(auth: &AuthConfig) -> Self {
        Self {
            short_ttl: Duration::seconds(auth.short_session_ttl_seconds),
            long_ttl: Duration::seconds(auth.long_session_ttl_seconds),
        }
    }

    pub fn ttl(&self, kind: SessionKind) -> Duration {
        match kind {
            SessionKind::ShortLived => self.short_ttl,
            SessionKind::LongLived => self.long_ttl,
        }
    }

    /// Expiry deadline for a session of `kind` as of `now`.
    pub fn expires_from(&self, kind: SessionKind, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.ttl(kind)
    }
}

/// Registration input (already shape-validated by the handler)
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

/// Outcome of resolving a presented session identifier
#[derive(Debug)]
pub enum AuthDecision {
    /// Session is live; its expiry has been extended.
    Granted(User),
    /// Session must be discarded by the transport (cookie cleared).
    Denied(SessionRejection),
}

/// Why a presented session identifier was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRejection {
    /// No live session record matches the identifier.
    Expired,
    /// The session's owning user no longer exists.
    UserMissing,
}

impl SessionRejection {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Expired => "Your session has expired, please log in again",
            Self::UserMissing => "User not found, please log in again",
        }
    }
}

/// Session lifecycle manager
///
/// Shared via `AppState`; never caches user rows across requests — every
/// operation re-reads through the store.
pub struct SessionService {
    db: Arc<Database>,
    limiter: Arc<LoginRateLimiter>,
    policy: SessionPolicy,
    min_password_length: usize,
}

impl SessionService {
    pub fn new(db: Arc<Database>, limiter: Arc<LoginRateLimiter>, auth: &AuthConfig) -> Self {
        Self {
            db,
            limiter,
            policy: SessionPolicy::from_config(auth),
            min_password_length: auth.min_password_length,
        }
    }

    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// Register a new user
    ///
    /// Email is lowercased before storage. Accounts are auto-verified
    /// (no email delivery in this service).
    pub async fn register(
        &self,
        input: RegisterInput,
        now: DateTime<Utc>,
    ) -> Result<User, AppError> {
        password::validate_password_strength(&input.password, self.min_password_length)?;

        if self.db.find_user_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict(
                "This email is already registered".to_string(),
            ));
        }
        if self
            .db
            .find_user_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Username is already taken".to_string(),
            ));
        }

        let password = input.password;
        let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(e.into()))??;

        let user = User {
            id: EntityId::new().0,
            email: input.email.trim().to_lowercase(),
            username: input.username.trim().to_string(),
            password_hash,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            phone: input.phone,
            role: UserRole::Citizen.as_str().to_string(),
            is_verified: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        };

        // Unique constraints catch the register/register race.
        self.db.insert_user(&user).await?;
        REGISTRATIONS_TOTAL.inc();

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(user)
    }

    /// Log a user in
    ///
    /// Rate-limit gate, credential check, expired-session cleanup, then a
    /// new session record: short-lived by default, long-lived for
    /// remember-me. The failure message never reveals whether the account
    /// exists.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        remember_me: bool,
        now: DateTime<Utc>,
    ) -> Result<(User, SessionRecord), AppError> {
        if !self.limiter.check_and_increment(identifier).await {
            LOGIN_ATTEMPTS_TOTAL.with_label_values(&["rate_limited"]).inc();
            return Err(AppError::RateLimited);
        }

        let Some(mut user) = self.db.find_user_by_identifier(identifier).await? else {
            LOGIN_ATTEMPTS_TOTAL
                .with_label_values(&["invalid_credentials"])
                .inc();
            return Err(invalid_credentials());
        };

        let candidate = password.to_string();
        let stored_hash = user.password_hash.clone();
        let valid =
            tokio::task::spawn_blocking(move || password::verify_password(&candidate, &stored_hash))
                .await
                .map_err(|e| AppError::Internal(e.into()))??;

        if !valid {
            LOGIN_ATTEMPTS_TOTAL
                .with_label_values(&["invalid_credentials"])
                .inc();
            return Err(invalid_credentials());
        }

        self.db.clean_expired_sessions(&user.id, now).await?;

        let kind = if remember_me {
            SessionKind::LongLived
        } else {
            SessionKind::ShortLived
        };
        let session = SessionRecord {
            session_id: generate_session_id(),
            user_id: user.id.clone(),
            kind: kind.as_str().to_string(),
            created_at: now,
            expires_at: self.policy.expires_from(kind, now),
        };
        self.db.add_session(&session).await?;

        self.db.update_last_login(&user.id, now).await?;
        user.last_login = Some(now);

        self.limiter.reset(identifier).await;

        LOGIN_ATTEMPTS_TOTAL.with_label_values(&["success"]).inc();
        SESSIONS_CREATED_TOTAL
            .with_label_values(&[kind.as_str()])
            .inc();

        tracing::info!(
            user_id = %user.id,
            kind = kind.as_str(),
            "Login successful"
        );

        Ok((user, session))
    }

    /// Resolve and touch a presented session identifier
    ///
    /// A denied decision means the transport session must be discarded.
    /// Store failures fail the request; a session is never treated as valid
    /// on error.
    pub async fn authenticate(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthDecision, AppError> {
        let Some(session) = self.db.find_session(session_id).await? else {
            return Ok(AuthDecision::Denied(SessionRejection::Expired));
        };
        if session.is_expired(now) {
            return Ok(AuthDecision::Denied(SessionRejection::Expired));
        }

        let Some(user) = self.db.get_user(&session.user_id).await? else {
            // Orphaned record; drop it so the identifier cannot linger.
            self.db.remove_session(session_id).await?;
            return Ok(AuthDecision::Denied(SessionRejection::UserMissing));
        };

        let touched = self
            .db
            .touch_session(
                session_id,
                now,
                self.policy.expires_from(SessionKind::ShortLived, now),
                self.policy.expires_from(SessionKind::LongLived, now),
            )
            .await?;
        if !touched {
            // Raced a logout or expired between lookup and touch.
            return Ok(AuthDecision::Denied(SessionRejection::Expired));
        }
        SESSION_TOUCHES_TOTAL.inc();

        Ok(AuthDecision::Granted(user))
    }

    /// Log out: remove the session record
    ///
    /// Idempotent; the transport cookie is cleared by the handler.
    pub async fn logout(&self, session_id: &str) -> Result<(), AppError> {
        let removed = self.db.remove_session(session_id).await?;
        if removed > 0 {
            SESSIONS_REMOVED_TOTAL.with_label_values(&["logout"]).inc();
        }
        Ok(())
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid email/username or password".to_string())
}

// =============================================================================
// Cookie helpers
// =============================================================================

/// Build the transport session cookie for a freshly minted session
pub fn session_cookie(
    config: &AppConfig,
    session_id: String,
    kind: SessionKind,
) -> Cookie<'static> {
    let max_age_seconds = match kind {
        SessionKind::ShortLived => config.auth.short_session_ttl_seconds,
        SessionKind::LongLived => config.auth.long_session_ttl_seconds,
    };

    let mut cookie = Cookie::new(config.auth.cookie_name.clone(), session_id);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(config.should_use_secure_cookies());
    cookie.set_max_age(time::Duration::seconds(max_age_seconds));
    cookie
}

/// Build a removal cookie that clears the transport session
pub fn removal_cookie(config: &AppConfig) -> Cookie<'static> {
    let mut cookie = Cookie::new(config.auth.cookie_name.clone(), "");
    cookie.set_path("/");
    cookie
}
