//! Authentication middleware
//!
//! The auth gate for protected routes: resolves the transport session
//! cookie to a live session record, touches it, and attaches a sanitized
//! identity to the request. Invalid or expired sessions are rejected with
//! a 401 and the cookie is cleared so clients discard the identifier.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, Request, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;

use super::session::{AuthDecision, removal_cookie};
use crate::AppState;
use crate::data::UserView;
use crate::error::AppError;

/// The authenticated session attached to request extensions
#[derive(Debug, Clone)]
pub struct CurrentSession {
    /// Opaque transport session identifier
    pub session_id: String,
    /// Sanitized identity (never includes the password hash)
    pub user: UserView,
}

fn extract_session_id(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    jar.get(cookie_name)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}

async fn authenticate_session(
    session_id: &str,
    state: &AppState,
) -> Result<CurrentSession, AppError> {
    match state.sessions.authenticate(session_id, Utc::now()).await? {
        AuthDecision::Granted(user) => Ok(CurrentSession {
            session_id: session_id.to_string(),
            user: user.view(),
        }),
        AuthDecision::Denied(rejection) => {
            Err(AppError::Unauthorized(rejection.message().to_string()))
        }
    }
}

/// Middleware to require authentication
///
/// Resolves the session cookie, touches the matching session record, and
/// adds [`CurrentSession`] to request extensions if valid. Rejections for
/// a presented-but-invalid session clear the cookie.
///
/// # Usage
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/auth/profile", ...)
///     .route_layer(middleware::from_fn_with_state(state, require_auth));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(session_id) = extract_session_id(request.headers(), &state.config.auth.cookie_name)
    else {
        return Err(AppError::Unauthorized(
            "Please log in to access this resource".to_string(),
        ));
    };

    match authenticate_session(&session_id, &state).await {
        Ok(session) => {
            request.extensions_mut().insert(session);
            Ok(next.run(request).await)
        }
        Err(error @ AppError::Unauthorized(_)) => {
            // Presented session is dead; tell the client to drop the cookie.
            let jar = jar.remove(removal_cookie(&state.config));
            Ok((jar, error).into_response())
        }
        Err(error) => Err(error),
    }
}

/// Role-gated variant of the auth gate
///
/// Layered after [`require_auth`]; checks the attached identity's role
/// against an allow-list.
pub async fn require_role(
    allowed: &'static [&'static str],
    request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(session) = request.extensions().get::<CurrentSession>() else {
        return Err(AppError::Unauthorized(
            "Please log in to access this resource".to_string(),
        ));
    };

    if !allowed.contains(&session.user.role.as_str()) {
        return Err(AppError::Forbidden(format!(
            "Access denied. Required role: {}",
            allowed.join(" or ")
        )));
    }

    Ok(next.run(request).await)
}

/// Middleware restricting a route to admin accounts
///
/// # Usage
/// ```ignore
/// .route_layer(middleware::from_fn(require_admin))
/// .route_layer(middleware::from_fn_with_state(state, require_auth))
/// ```
pub async fn require_admin(
    request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    require_role(&["admin"], request, next).await
}

/// Extractor for the current authenticated user
///
/// Use in handlers behind [`require_auth`] to get the sanitized identity.
///
/// # Usage
/// ```ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserView);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<CurrentSession>() {
            return Ok(CurrentUser(session.user.clone()));
        }

        let app_state = AppState::from_ref(state);
        let session_id = extract_session_id(&parts.headers, &app_state.config.auth.cookie_name)
            .ok_or_else(|| {
                AppError::Unauthorized("Please log in to access this resource".to_string())
            })?;
        let session = authenticate_session(&session_id, &app_state).await?;
        parts.extensions.insert(session.clone());

        Ok(CurrentUser(session.user))
    }
}

/// Optional current user extractor
///
/// Returns None if not authenticated, instead of an error.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<UserView>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<CurrentSession>() {
            return Ok(MaybeUser(Some(session.user.clone())));
        }

        let app_state = AppState::from_ref(state);
        let session = match extract_session_id(&parts.headers, &app_state.config.auth.cookie_name)
        {
            Some(session_id) => authenticate_session(&session_id, &app_state).await.ok(),
            None => None,
        };

        if let Some(session) = &session {
            parts.extensions.insert(session.clone());
        }

        Ok(MaybeUser(session.map(|s| s.user)))
    }
}
