use axum::Json;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::Response;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;

use pactoria_core::entities::Notification;
use pactoria_core::identity::AuthIdentity;
use pactoria_core::pagination::Page;
use pactoria_notify::{ClientMessage, WsEvent};

use crate::error::ApiResult;
use crate::extract::{ApiPath, ApiQuery, CurrentUser, authenticate};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: String,
}

/// Push the current unread count to the user's open sockets.
async fn publish_unread(state: &AppState, user_id: &str) {
    match state.service.unread_count(user_id).await {
        Ok(count) => {
            state.hub.publish(user_id, WsEvent::UnreadCount { count });
        }
        Err(error) => tracing::debug!(%error, user_id, "unread count unavailable"),
    }
}

pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<Page<Notification>>> {
    let page = state.page(params.page, params.size);
    Ok(Json(
        state
            .service
            .list_notifications(&identity.user_id, params.unread_only, page)
            .await?,
    ))
}

pub async fn unread_count(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
) -> ApiResult<Json<UnreadCount>> {
    let count = state.service.unread_count(&identity.user_id).await?;
    Ok(Json(UnreadCount { count }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Notification>> {
    let notification = state.service.mark_notification_read(&identity.user_id, &id).await?;
    publish_unread(&state, &identity.user_id).await;
    Ok(Json(notification))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
) -> ApiResult<Json<MarkedRead>> {
    let updated = state.service.mark_all_notifications_read(&identity.user_id).await?;
    state.hub.publish(&identity.user_id, WsEvent::UnreadCount { count: 0 });
    Ok(Json(MarkedRead { updated }))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    state.service.delete_notification(&identity.user_id, &id).await?;
    publish_unread(&state, &identity.user_id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /notifications/ws?token=`. Browsers cannot set headers on a
/// WebSocket handshake, so the bearer token travels in the query.
pub async fn websocket(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<WsParams>,
    upgrade: WebSocketUpgrade,
) -> ApiResult<Response> {
    let current = authenticate(&state, &params.token).await?;
    Ok(upgrade.on_upgrade(move |socket| session(state, current.identity, socket)))
}

type WsSink = SplitSink<WebSocket, Message>;

async fn send_event(sink: &mut WsSink, event: &WsEvent) -> Result<(), axum::Error> {
    let text = match event.to_json() {
        Ok(text) => text,
        Err(error) => {
            tracing::warn!(%error, "failed to encode websocket event");
            return Ok(());
        }
    };
    sink.send(Message::Text(text.into())).await
}

async fn handle_client_message(state: &AppState, identity: &AuthIdentity, text: &str) -> WsEvent {
    match ClientMessage::parse(text) {
        Ok(ClientMessage::Ping) => WsEvent::Pong,
        Ok(ClientMessage::MarkRead { notification_id }) => {
            if let Err(error) = state
                .service
                .mark_notification_read(&identity.user_id, &notification_id)
                .await
            {
                return WsEvent::error(error.to_string());
            }
            match state.service.unread_count(&identity.user_id).await {
                Ok(count) => WsEvent::UnreadCount { count },
                Err(error) => WsEvent::error(error.to_string()),
            }
        }
        Err(error) => WsEvent::error(error.to_string()),
    }
}

async fn session(state: AppState, identity: AuthIdentity, socket: WebSocket) {
    let user_id = identity.user_id.clone();
    let (mut sink, mut stream) = socket.split();
    let mut events = state.hub.subscribe(&user_id);
    tracing::info!(user_id = %user_id, connections = state.hub.connection_count(), "websocket connected");

    if let Ok(count) = state.service.unread_count(&user_id).await
        && send_event(&mut sink, &WsEvent::UnreadCount { count }).await.is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if send_event(&mut sink, &event).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(user_id = %user_id, skipped, "websocket client lagging");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let reply = handle_client_message(&state, &identity, text.as_str()).await;
                    if send_event(&mut sink, &reply).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    drop(events);
    tracing::info!(user_id = %user_id, "websocket disconnected");
}
