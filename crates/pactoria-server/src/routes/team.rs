use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use pactoria_auth::{RequirePermission, generate_token_hex};
use pactoria_core::entities::{Invitation, User};
use pactoria_core::enums::{InvitationStatus, Permission, UserRole};
use pactoria_core::identity::AuthIdentity;
use pactoria_core::responses::AuthResponse;
use pactoria_db::repos::invitations::NewInvitation;
use pactoria_notify::EmailMessage;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::fanout;
use crate::routes::auth::{auth_response, hash_blocking};
use crate::state::AppState;

/// Invitation tokens carry 256 bits of randomness.
const INVITATION_TOKEN_BYTES: usize = 32;

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub email: String,
    #[serde(default = "default_invite_role")]
    pub role: UserRole,
}

const fn default_invite_role() -> UserRole {
    UserRole::Member
}

#[derive(Debug, Default, Deserialize)]
pub struct InvitationParams {
    pub status: Option<InvitationStatus>,
}

#[derive(Debug, Deserialize)]
pub struct AcceptRequest {
    pub token: String,
    pub full_name: String,
    pub password: String,
}

pub async fn list_members(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.service.list_members(&identity.company_id).await?))
}

pub async fn change_role(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(user_id): ApiPath<String>,
    ApiJson(req): ApiJson<RoleRequest>,
) -> ApiResult<Json<User>> {
    identity.require(Permission::ManageTeam)?;
    Ok(Json(state.service.change_member_role(&identity, &user_id, req.role).await?))
}

pub async fn remove_member(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(user_id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    identity.require(Permission::ManageTeam)?;
    state.service.remove_member(&identity, &user_id).await?;
    tracing::info!(user_id = %user_id, removed_by = %identity.user_id, "member removed");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_invitations(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiQuery(params): ApiQuery<InvitationParams>,
) -> ApiResult<Json<Vec<Invitation>>> {
    identity.require(Permission::InviteMembers)?;
    Ok(Json(
        state
            .service
            .list_invitations(&identity.company_id, params.status)
            .await?,
    ))
}

/// Email the invitation link. Delivery failures are logged; the invitation
/// stays valid and can be resent.
async fn send_invitation(state: &AppState, identity: &AuthIdentity, invitation: &Invitation, token: &str) {
    let company_name = match state.service.get_company(&identity.company_id).await {
        Ok(company) => company.name,
        Err(error) => {
            tracing::warn!(%error, "company lookup failed; invitation email not sent");
            return;
        }
    };
    let message = EmailMessage::invitation(invitation, token, &company_name, &state.config.general.frontend_url);
    if let Err(error) = state.email.send(&message).await {
        tracing::warn!(%error, invitation_id = %invitation.id, "invitation email failed");
    }
}

pub async fn invite(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiJson(req): ApiJson<InviteRequest>,
) -> ApiResult<(StatusCode, Json<Invitation>)> {
    identity.require(Permission::InviteMembers)?;
    let token = generate_token_hex(INVITATION_TOKEN_BYTES)?;
    let invitation = state
        .service
        .create_invitation(
            &identity,
            NewInvitation {
                email: req.email,
                role: req.role,
                token: token.clone(),
                ttl_days: state.config.general.invitation_ttl_days,
            },
        )
        .await?;
    send_invitation(&state, &identity, &invitation, &token).await;
    Ok((StatusCode::CREATED, Json(invitation.redacted())))
}

pub async fn revoke_invitation(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Invitation>> {
    identity.require(Permission::InviteMembers)?;
    Ok(Json(state.service.revoke_invitation(&identity, &id).await?))
}

pub async fn resend_invitation(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Invitation>> {
    identity.require(Permission::InviteMembers)?;
    let token = generate_token_hex(INVITATION_TOKEN_BYTES)?;
    let invitation = state
        .service
        .resend_invitation(&identity, &id, &token, state.config.general.invitation_ttl_days)
        .await?;
    send_invitation(&state, &identity, &invitation, &token).await;
    Ok(Json(invitation.redacted()))
}

/// Unauthenticated: the token is the credential.
pub async fn accept_invitation(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AcceptRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    pactoria_core::validation::password(&req.password)?;
    let hash = hash_blocking(req.password.clone()).await?;
    let (user, invitation) = state
        .service
        .accept_invitation(req.token.trim(), &req.full_name, &req.password, &hash)
        .await?;
    tracing::info!(user_id = %user.id, invitation_id = %invitation.id, "invitation accepted");

    fanout::member_joined(&state, &user.company_id, &user.id, &user.full_name).await;
    let company = state.service.get_company(&user.company_id).await?;
    Ok((StatusCode::CREATED, Json(auth_response(&state, user, company)?)))
}
