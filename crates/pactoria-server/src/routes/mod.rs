//! HTTP surface. Everything except `/health` lives under `/api/v1`.

pub mod ai;
pub mod analytics;
pub mod auth;
pub mod clauses;
pub mod company;
pub mod compliance;
pub mod contracts;
pub mod health;
pub mod integrations;
pub mod notifications;
pub mod search;
pub mod team;
pub mod templates;
pub mod wizard;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::Uri;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};

use crate::error::ApiError;
use crate::middleware::{cors_middleware, request_tracing_middleware};
use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v1";

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        // auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me).put(auth::update_me))
        .route("/auth/change-password", post(auth::change_password))
        // company
        .route("/company", get(company::get_company).put(company::update_company))
        .route("/company/usage", get(company::usage))
        // contracts
        .route(
            "/contracts",
            get(contracts::list_contracts).post(contracts::create_contract),
        )
        .route(
            "/contracts/{id}",
            get(contracts::get_contract)
                .put(contracts::update_contract)
                .delete(contracts::delete_contract),
        )
        .route("/contracts/{id}/status", post(contracts::change_status))
        .route("/contracts/{id}/generate", post(contracts::generate))
        .route("/contracts/{id}/analyze", post(contracts::analyze))
        .route("/contracts/{id}/versions", get(contracts::list_versions))
        // templates
        .route(
            "/templates",
            get(templates::list_templates).post(templates::create_template),
        )
        .route(
            "/templates/{id}",
            get(templates::get_template)
                .put(templates::update_template)
                .delete(templates::delete_template),
        )
        .route("/templates/{id}/status", post(templates::change_status))
        .route("/templates/{id}/render", post(templates::render))
        // clauses
        .route("/clauses", get(clauses::list_clauses).post(clauses::create_clause))
        .route(
            "/clauses/{id}",
            get(clauses::get_clause)
                .put(clauses::update_clause)
                .delete(clauses::delete_clause),
        )
        .route("/clauses/{id}/status", post(clauses::change_status))
        // team
        .route("/team/members", get(team::list_members))
        .route("/team/members/{id}", delete(team::remove_member))
        .route("/team/members/{id}/role", put(team::change_role))
        .route("/team/invitations", get(team::list_invitations).post(team::invite))
        .route("/team/invitations/accept", post(team::accept_invitation))
        .route("/team/invitations/{id}", delete(team::revoke_invitation))
        .route("/team/invitations/{id}/resend", post(team::resend_invitation))
        // notifications
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/ws", get(notifications::websocket))
        .route("/notifications/{id}", delete(notifications::delete_notification))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        // ai
        .route("/ai/generate", post(ai::generate))
        .route("/ai/analyze", post(ai::analyze))
        .route("/ai/providers", get(ai::providers))
        // compliance
        .route("/compliance/check", post(compliance::check))
        .route("/compliance/contracts/{id}", get(compliance::check_contract))
        // search
        .route("/search/contracts", post(search::search_contracts))
        .route("/search/templates", get(search::search_templates))
        .route("/search/clauses", get(search::search_clauses))
        // analytics
        .route("/analytics/dashboard", get(analytics::dashboard))
        .route("/analytics/compliance", get(analytics::compliance))
        // wizard
        .route("/wizard", post(wizard::start))
        .route("/wizard/{id}", get(wizard::get).delete(wizard::abandon))
        .route("/wizard/{id}/steps/{step}", put(wizard::save_step))
        .route("/wizard/{id}/complete", post(wizard::complete))
        // integrations
        .route("/integrations", get(integrations::catalog))
        .route("/integrations/{provider}/connect", post(integrations::connect))
        .route("/integrations/{provider}/disconnect", post(integrations::disconnect))
        .route("/integrations/{provider}/sync", post(integrations::sync))
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::not_found("route", uri.path())
}

/// The full application: routes, middleware, and state.
pub fn build_router(state: AppState) -> Router {
    let max_body = state.config.server.max_body_bytes;
    Router::new()
        .route("/health", get(health::health))
        .nest(API_PREFIX, api_routes())
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(from_fn_with_state(state.clone(), cors_middleware))
        .layer(from_fn_with_state(state.clone(), request_tracing_middleware))
        .with_state(state)
}
