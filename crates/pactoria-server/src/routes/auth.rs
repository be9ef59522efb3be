use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use pactoria_auth::{AuthError, hash_password, verify_password};
use pactoria_core::entities::{Company, NewCompany, NewUser, User};
use pactoria_core::enums::UserRole;
use pactoria_core::responses::AuthResponse;
use pactoria_core::validation;
use pactoria_db::updates::profile::ProfileUpdate;

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, CurrentUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub company: NewCompany,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub company: Company,
}

/// Hash on the blocking pool.
pub(crate) async fn hash_blocking(password: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::internal(&e))?
        .map_err(ApiError::from)
}

async fn verify_blocking(password: String, phc: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &phc))
        .await
        .map_err(|e| ApiError::internal(&e))
}

pub(crate) fn auth_response(state: &AppState, user: User, company: Company) -> ApiResult<AuthResponse> {
    let token = state.tokens.issue(&user)?;
    Ok(AuthResponse {
        token: token.token,
        token_type: "bearer".to_string(),
        expires_at: token.expires_at,
        user,
        company,
    })
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    validation::password(&req.password)?;
    let hash = hash_blocking(req.password.clone()).await?;
    let admin = NewUser {
        email: req.email,
        full_name: req.full_name,
        password: req.password,
        role: UserRole::Admin,
    };
    let (company, user) = state.service.register_company(req.company, admin, &hash).await?;
    tracing::info!(company_id = %company.id, user_id = %user.id, "company registered");
    Ok((StatusCode::CREATED, Json(auth_response(&state, user, company)?)))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let Some(creds) = state.service.get_user_by_email(req.email.trim()).await? else {
        tracing::debug!("login for unknown email");
        return Err(AuthError::InvalidCredentials.into());
    };
    if !verify_blocking(req.password, creds.password_hash).await? || !creds.user.is_active {
        tracing::debug!(user_id = %creds.user.id, "login rejected");
        return Err(AuthError::InvalidCredentials.into());
    }
    state.service.record_login(&creds.user.id).await?;
    let company = state.service.get_company(&creds.user.company_id).await?;
    let user = state.service.get_user(&creds.user.id).await?;
    Ok(Json(auth_response(&state, user, company)?))
}

pub async fn me(State(state): State<AppState>, current: CurrentUser) -> ApiResult<Json<MeResponse>> {
    let company = state.service.get_company(&current.identity.company_id).await?;
    Ok(Json(MeResponse {
        user: current.user,
        company,
    }))
}

/// Change the caller's own name or email.
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> ApiResult<Json<MeResponse>> {
    let user = state.service.update_profile(&identity, update).await?;
    let company = state.service.get_company(&identity.company_id).await?;
    Ok(Json(MeResponse { user, company }))
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    let stored = state.service.get_password_hash(&identity.user_id).await?;
    if !verify_blocking(req.current_password, stored).await? {
        return Err(ApiError::validation("current_password", "is incorrect"));
    }
    validation::password(&req.new_password)?;
    let hash = hash_blocking(req.new_password).await?;
    state.service.set_password_hash(&identity, &hash).await?;
    tracing::info!(user_id = %identity.user_id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}
