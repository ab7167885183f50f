//! Authentication endpoints
//!
//! Routes:
//! - POST /auth/register - Create an account
//! - POST /auth/login - Authenticate and mint a session
//! - POST /auth/logout - Remove the current session
//! - GET /auth/profile - Current sanitized identity
//! - GET /auth/session - Transport session status (never fails)

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::middleware::{CurrentSession, CurrentUser, require_auth};
use super::session::{RegisterInput, removal_cookie, session_cookie};
use crate::AppState;
use crate::error::AppError;

/// Create authentication router
pub fn auth_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/profile", get(profile))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/session", get(session_status))
        .merge(protected)
}

// =============================================================================
// Register
// =============================================================================

/// Registration request body
///
/// Fields are optional at the serde level so missing input surfaces as a
/// 400 validation error rather than a deserialization failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// POST /auth/register
///
/// # Returns
/// 201 with the sanitized user, 400 on missing fields, 409 on duplicate
/// email or username.
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(email), Some(username), Some(password), Some(first_name), Some(last_name)) = (
        non_empty(body.email),
        non_empty(body.username),
        non_empty(body.password),
        non_empty(body.first_name),
        non_empty(body.last_name),
    ) else {
        return Err(AppError::Validation(
            "Email, username, password, first name, and last name are required".to_string(),
        ));
    };

    let user = state
        .sessions
        .register(
            RegisterInput {
                email,
                username,
                password,
                first_name,
                last_name,
                phone: body.phone.and_then(|p| non_empty(Some(p))),
            },
            Utc::now(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": user.view(),
        })),
    ))
}

// =============================================================================
// Login
// =============================================================================

/// Login request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Email or username, matched as supplied
    pub identifier: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub remember_me: bool,
}

/// POST /auth/login
///
/// Sets the session cookie with a max-age matching the session class
/// (5 minutes, or 30 days for remember-me).
///
/// # Returns
/// 200 with the sanitized user, 400 on missing credentials, 401 on bad
/// credentials, 429 when rate-limited.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(identifier), Some(password)) = (non_empty(body.identifier), body.password) else {
        return Err(AppError::Validation(
            "Email/username and password are required".to_string(),
        ));
    };

    let (user, session) = state
        .sessions
        .login(&identifier, &password, body.remember_me, Utc::now())
        .await?;

    let jar = jar.add(session_cookie(
        &state.config,
        session.session_id.clone(),
        session.kind(),
    ));

    Ok((
        jar,
        Json(json!({
            "message": "Login successful",
            "user": user.view(),
        })),
    ))
}

// =============================================================================
// Logout
// =============================================================================

/// POST /auth/logout
///
/// Removes exactly the matching session record; sibling sessions for the
/// same user stay valid. Clears the transport cookie.
async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    state.sessions.logout(&session.session_id).await?;

    let jar = jar.remove(removal_cookie(&state.config));

    Ok((jar, Json(json!({ "message": "Logout successful" }))))
}

// =============================================================================
// Profile
// =============================================================================

/// GET /auth/profile
///
/// Requires a valid session; returns the sanitized identity.
async fn profile(CurrentUser(user): CurrentUser) -> Json<serde_json::Value> {
    Json(json!({ "user": user }))
}

// =============================================================================
// Session status
// =============================================================================

/// GET /auth/session
///
/// Reflects current transport state only and never fails: a store error
/// degrades to "not authenticated" rather than a 500.
async fn session_status(State(state): State<AppState>, jar: CookieJar) -> Json<serde_json::Value> {
    let session_id = jar
        .get(&state.config.auth.cookie_name)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty());

    let mut authenticated = false;
    let mut user_id: Option<String> = None;

    if let Some(id) = &session_id {
        match state.db.find_session(id).await {
            Ok(Some(session)) if !session.is_expired(Utc::now()) => {
                authenticated = true;
                user_id = Some(session.user_id);
            }
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(error = %error, "Session status lookup failed");
            }
        }
    }

    Json(json!({
        "authenticated": authenticated,
        "sessionId": session_id,
        "userId": user_id,
    }))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
