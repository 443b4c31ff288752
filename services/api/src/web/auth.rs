//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for admin login, registration, token refresh and logout.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use care_directory_core::domain::{NewUser, Role, User};
use care_directory_core::ports::{PortError, UserStore};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::BootstrapAdmin;
use crate::error::{ApiError, ErrorBody};
use crate::web::middleware::{AccessToken, CurrentUser};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct AuthenticateRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub username: String,
    pub password: String,
    /// `ADMIN` or omitted for a plain user.
    pub role: Option<String>,
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub full_name: String,
    pub username: String,
    pub role: Option<String>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            full_name: u.full_name,
            username: u.username,
            role: u.role.map(|r| r.to_string()),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserDto,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminCheckResponse {
    pub is_admin: bool,
}

//=========================================================================================
// Password and Token Helpers
//=========================================================================================

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })
}

/// False for a wrong password or an unreadable stored hash.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    match PasswordHash::new(hashed) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            error!("Failed to parse password hash: {:?}", e);
            false
        }
    }
}

async fn issue_token(state: &AppState, user: User) -> Result<AuthResponse, ApiError> {
    let token = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::hours(state.config.auth_session_ttl_hours);

    state
        .users
        .create_auth_session(&token, user.id, expires_at)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            ApiError::Port(e)
        })?;

    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_at,
        user: user.into(),
    })
}

/// Creates the configured bootstrap admin unless that username already exists.
pub async fn ensure_bootstrap_admin(
    users: &dyn UserStore,
    admin: &BootstrapAdmin,
) -> Result<(), ApiError> {
    match users.get_user_by_username(&admin.username).await {
        Ok(_) => Ok(()),
        Err(PortError::NotFound(_)) => {
            users
                .create_user(NewUser {
                    full_name: admin.username.clone(),
                    username: admin.username.clone(),
                    hashed_password: hash_password(&admin.password)?,
                    role: Some(Role::Admin),
                })
                .await?;
            info!("Created bootstrap admin '{}'", admin.username);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/authenticate - Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/authenticate",
    tag = "Auth",
    request_body = AuthenticateRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    )
)]
pub async fn authenticate_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AuthenticateRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let credentials = match state.users.get_user_by_username(&req.username).await {
        Ok(credentials) => credentials,
        Err(PortError::NotFound(_)) => {
            warn!("Login attempt for unknown user '{}'", req.username);
            return Err(ApiError::Unauthenticated);
        }
        Err(e) => return Err(e.into()),
    };

    if !verify_password(&req.password, &credentials.hashed_password) {
        warn!("Wrong password for user '{}'", req.username);
        return Err(ApiError::Unauthenticated);
    }

    Ok(Json(issue_token(&state, credentials.user).await?))
}

/// POST /api/auth/register - Create a user account (admin only)
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "User created", body = UserDto),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody),
        (status = 409, description = "Username taken", body = ErrorBody)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(PortError::InvalidInput(
            "username and password are required".to_string(),
        )
        .into());
    }
    let role = req
        .role
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .map(|r| r.parse::<Role>())
        .transpose()?;

    let user = state
        .users
        .create_user(NewUser {
            full_name: req.full_name,
            username: req.username.trim().to_string(),
            hashed_password: hash_password(&req.password)?,
            role,
        })
        .await?;
    info!("Registered user '{}'", user.username);

    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

/// POST /api/auth/refresh-token - Replace the caller's token with a fresh one
#[utoipa::path(
    post,
    path = "/api/auth/refresh-token",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "New token issued; the old one is revoked", body = AuthResponse),
        (status = 401, description = "Missing or expired token", body = ErrorBody)
    )
)]
pub async fn refresh_token_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(AccessToken(old_token)): Extension<AccessToken>,
) -> Result<Json<AuthResponse>, ApiError> {
    let response = issue_token(&state, user).await?;
    state.users.delete_auth_session(&old_token).await?;
    Ok(Json(response))
}

/// POST /api/auth/logout - Revoke the caller's token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Logout successful"),
        (status = 401, description = "No active session", body = ErrorBody)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Extension(AccessToken(token)): Extension<AccessToken>,
) -> Result<StatusCode, ApiError> {
    state.users.delete_auth_session(&token).await.map_err(|e| {
        error!("Failed to delete auth session: {:?}", e);
        ApiError::Port(e)
    })?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/check-admin - Whether the caller holds the admin role
#[utoipa::path(
    get,
    path = "/api/auth/check-admin",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Role check result", body = AdminCheckResponse),
        (status = 401, description = "Missing or expired token", body = ErrorBody)
    )
)]
pub async fn check_admin_handler(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<AdminCheckResponse> {
    Json(AdminCheckResponse {
        is_admin: user.is_admin(),
    })
}
