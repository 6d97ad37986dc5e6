//! Session authentication middleware
//!
//! Requests carry a session token either as `Authorization: Bearer
//! <token>` or as a `session` cookie. Tokens are minted by the external
//! identity flow and validated here against the sessions table. Applied
//! to protected routes only; /health stays open.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{db, AppState};

/// The authenticated caller, inserted into request extensions
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Authentication middleware.
///
/// Returns 401 Unauthorized when no valid session accompanies the
/// request; no handler runs and nothing is written in that case.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(request.headers())
        .or_else(|| session_cookie(request.headers()))
        .ok_or(AuthError::MissingSession)?;

    let user_id = db::sessions::find_user_by_token(&state.db, &token)
        .await
        .map_err(|e| AuthError::Lookup(e.to_string()))?
        .ok_or(AuthError::InvalidSession)?;

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("session="))
        .map(str::to_string)
        .filter(|t| !t.is_empty())
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    MissingSession,
    InvalidSession,
    Lookup(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingSession => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized: missing session token".to_string(),
            ),
            AuthError::InvalidSession => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized: invalid or expired session".to_string(),
            ),
            AuthError::Lookup(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Authentication error: {}", msg),
            ),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
