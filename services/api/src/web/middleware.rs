//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use care_directory_core::domain::User;
use care_directory_core::ports::PortError;
use tracing::{error, warn};

use crate::error::ApiError;
use crate::web::state::AppState;

/// The user behind the request's bearer token, inserted into request extensions.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// The raw bearer token the request was authenticated with.
#[derive(Clone, Debug)]
pub struct AccessToken(pub String);

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

async fn authenticate(state: &AppState, req: &mut Request) -> Result<User, ApiError> {
    let token = bearer_token(req.headers())
        .ok_or(ApiError::Unauthenticated)?
        .to_string();

    let user = state
        .users
        .validate_auth_session(&token)
        .await
        .map_err(|e| match e {
            PortError::Unauthorized | PortError::NotFound(_) => ApiError::Unauthenticated,
            other => {
                error!("Failed to validate auth session: {:?}", other);
                ApiError::Port(other)
            }
        })?;

    req.extensions_mut().insert(CurrentUser(user.clone()));
    req.extensions_mut().insert(AccessToken(token));
    Ok(user)
}

/// Middleware that validates the bearer token and exposes the caller.
///
/// If valid, inserts `CurrentUser` and `AccessToken` into request extensions.
/// If invalid, expired or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authenticate(&state, &mut req).await?;
    Ok(next.run(req).await)
}

/// Like [`require_auth`], and additionally rejects non-admin callers with 403.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, &mut req).await?;
    if !user.is_admin() {
        warn!("User '{}' denied access to {}", user.username, req.uri().path());
        return Err(ApiError::Forbidden);
    }
    Ok(next.run(req).await)
}
