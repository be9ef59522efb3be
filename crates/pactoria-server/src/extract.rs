//! Request extractors whose rejections render as [`ApiError`].

use axum::Json;
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde_json::json;

use pactoria_auth::AuthError;
use pactoria_core::entities::User;
use pactoria_core::identity::AuthIdentity;

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::AppState;

/// JSON body; malformed or mistyped bodies are 422.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// JSON body that may be omitted; an empty body yields `T::default()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalJson<T>(pub T);

impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|r| ApiError::body_rejected(r.status(), r.body_text()))?;
        parse_optional(&bytes).map(Self)
    }
}

fn parse_optional<T: DeserializeOwned + Default>(bytes: &[u8]) -> ApiResult<T> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(bytes).map_err(|e| {
        ApiError::new(ErrorCode::ValidationFailed, format!("invalid JSON body: {e}"))
            .with_details(json!({"source": "body"}))
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// The caller, resolved from `Authorization: Bearer <token>`.
///
/// The role comes from the stored user, so a role change or removal takes
/// effect before the token expires.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub identity: AuthIdentity,
    pub user: User,
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken("authorization header is not ASCII".into()))?;
    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| AuthError::InvalidToken("expected 'Bearer <token>'".into()))?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AuthError::InvalidToken("expected 'Bearer <token>'".into()));
    }
    Ok(token.trim())
}

/// Verify `token` and load its user.
///
/// # Errors
///
/// 401 for a bad token or a user that no longer exists, is deactivated, or
/// moved company.
pub async fn authenticate(state: &AppState, token: &str) -> ApiResult<CurrentUser> {
    let claims = state.tokens.verify(token)?;
    let user = match state.service.get_user(&claims.sub).await {
        Ok(user) => user,
        Err(e) if e.as_core().is_some() => {
            return Err(ApiError::unauthorized("account no longer exists"));
        }
        Err(e) => return Err(e.into()),
    };
    if !user.is_active || user.company_id != claims.company_id {
        tracing::debug!(user_id = %user.id, "token for inactive or moved account");
        return Err(ApiError::unauthorized("account is not active"));
    }
    let identity = AuthIdentity {
        user_id: user.id.clone(),
        company_id: user.company_id.clone(),
        email: user.email.clone(),
        role: user.role,
    };
    Ok(CurrentUser { identity, user })
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        authenticate(state, token).await
    }
}
