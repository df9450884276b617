//! Authentication handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::auth::{AuthTokens, RegisterInput};
use crate::services::AuthService;
use crate::AppState;
use shared::User;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<AuthTokens> for TokenResponse {
    fn from(tokens: AuthTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_in: tokens.expires_in,
        }
    }
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let tokens = service.login(&body.email, &body.password).await?;
    Ok(Json(tokens.into()))
}

/// Register a new user account
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterInput>,
) -> AppResult<(StatusCode, Json<User>)> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let user = service.register(body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Refresh token endpoint handler
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let tokens = service.refresh_token(&body.refresh_token).await?;
    Ok(Json(tokens.into()))
}

/// Current user profile
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<User>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let user = service.get_user(current_user.0.user_id).await?;
    Ok(Json(user))
}
