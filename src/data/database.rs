//! SQLite database operations
//!
//! All database access goes through this module. Users and their session
//! records live here; session rows are mutated only through the session
//! operations below, each of which is a single SQL statement so concurrent
//! requests for the same user cannot lose sibling updates.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    /// Check store reachability (health endpoint)
    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new user
    ///
    /// # Errors
    /// Returns `Conflict` if the email or username is already taken.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (
                id, email, username, password_hash, first_name, last_name,
                phone, role, is_verified, last_login, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&user.role)
        .bind(user.is_verified)
        .bind(user.last_login)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                AppError::Conflict("This email or username is already registered".to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a user by id
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find a user by login identifier (email or username)
    ///
    /// Emails are matched case-insensitively (stored lowercased);
    /// usernames are matched exactly.
    pub async fn find_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<User>, AppError> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ? OR username = ?")
                .bind(identifier.to_lowercase())
                .bind(identifier)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    /// Find a user by email (case-insensitive)
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find a user by username (exact match)
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Record a successful login time
    pub async fn update_last_login(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login = ?, updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(now)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Session Records
    // =========================================================================

    /// Add a session record for a user
    ///
    /// Upserts by `session_id`: reusing a transport session identifier across
    /// logins replaces the prior record instead of accumulating duplicates.
    pub async fn add_session(&self, session: &SessionRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, user_id, kind, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                user_id = excluded.user_id,
                kind = excluded.kind,
                created_at = excluded.created_at,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(&session.session_id)
        .bind(&session.user_id)
        .bind(&session.kind)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Look up a session record by its opaque identifier
    ///
    /// Returns expired records too; callers decide how to treat them.
    pub async fn find_session(&self, session_id: &str) -> Result<Option<SessionRecord>, AppError> {
        let session =
            sqlx::query_as::<_, SessionRecord>("SELECT * FROM sessions WHERE session_id = ?")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(session)
    }

    /// Remove a session record
    ///
    /// Idempotent: removing an absent session is a no-op. Removal is
    /// authoritative; a touch racing this delete cannot resurrect the record
    /// because [`Database::touch_session`] only updates live rows.
    ///
    /// # Returns
    /// Number of records removed (0 or 1).
    pub async fn remove_session(&self, session_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Extend a live session's expiry (rolling expiry)
    ///
    /// Single conditional UPDATE: a short-lived session moves to
    /// `short_expires_to`, a long-lived one to `long_expires_to`, and rows
    /// already expired at `now` (or removed by a racing logout) are left
    /// untouched.
    ///
    /// # Returns
    /// `true` if a live record was extended; `false` means the caller must
    /// treat the session as invalid.
    pub async fn touch_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
        short_expires_to: DateTime<Utc>,
        long_expires_to: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET expires_at = CASE kind WHEN 'long' THEN ? ELSE ? END
            WHERE session_id = ? AND expires_at > ?
            "#,
        )
        .bind(long_expires_to)
        .bind(short_expires_to)
        .bind(session_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Drop a user's expired session records
    ///
    /// Called opportunistically before adding a new session at login.
    ///
    /// # Returns
    /// Number of records removed.
    pub async fn clean_expired_sessions(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ? AND expires_at <= ?")
            .bind(user_id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Drop every expired session record (background sweep)
    pub async fn clean_all_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Count a user's non-expired sessions
    pub async fn count_active_sessions(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sessions WHERE user_id = ? AND expires_at > ?",
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Count every non-expired session (for the active-sessions gauge)
    pub async fn count_all_active_sessions(&self, now: DateTime<Utc>) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sessions WHERE expires_at > ?")
                .bind(now)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Backdate a session's expiry (test helper)
    pub async fn set_session_expires_at_for_test(
        &self,
        session_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE sessions SET expires_at = ? WHERE session_id = ?")
            .bind(expires_at)
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
