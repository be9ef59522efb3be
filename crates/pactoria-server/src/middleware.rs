//! Request tracing and CORS.

use std::sync::atomic::Ordering;

use axum::body::Body;
use axum::extract::{MatchedPath, Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::Instrument;

use crate::state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_REQUEST_ID_LEN: usize = 128;

const ALLOW_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";
const ALLOW_HEADERS: &str = "authorization,content-type,x-request-id";

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Id of the request being served on this task, if any.
#[must_use]
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(Clone::clone).ok()
}

fn header_value(headers: &HeaderMap, name: &str, max_len: usize) -> Option<String> {
    let raw = headers.get(name)?.to_str().ok()?.trim();
    if raw.is_empty() || raw.len() > max_len || !raw.chars().all(|c| c.is_ascii_graphic()) {
        return None;
    }
    Some(raw.to_string())
}

/// One `http.request` span per request; the id is echoed in `x-request-id`.
pub async fn request_tracing_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let request_id = header_value(req.headers(), REQUEST_ID_HEADER, MAX_REQUEST_ID_LEN)
        .unwrap_or_else(|| {
            let id = state.request_id_seed.fetch_add(1, Ordering::Relaxed);
            format!("req-{id:016x}")
        });
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| req.uri().path().to_string(), |p| p.as_str().to_string());
    let method = req.method().clone();
    let span = tracing::info_span!(
        "http.request",
        request_id = %request_id,
        method = %method,
        route = %route,
    );

    let started = std::time::Instant::now();
    let mut resp = REQUEST_ID
        .scope(request_id.clone(), next.run(req).instrument(span.clone()))
        .await;
    let status = resp.status().as_u16();
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    span.in_scope(|| {
        if status >= 500 {
            tracing::warn!(status, latency_ms, "request failed");
        } else {
            tracing::info!(status, latency_ms, "request completed");
        }
    });

    if let Ok(v) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(REQUEST_ID_HEADER, v);
    }
    resp
}

fn allowed_origin(state: &AppState, headers: &HeaderMap) -> Option<HeaderValue> {
    let origin = header_value(headers, "origin", 256)?;
    state
        .config
        .server
        .cors_allowed_origins
        .iter()
        .any(|allowed| allowed == &origin || allowed == "*")
        .then(|| HeaderValue::from_str(&origin).ok())
        .flatten()
}

/// Allow-list CORS; preflights are answered here and never reach a handler.
pub async fn cors_middleware(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let origin = allowed_origin(&state, req.headers());

    if req.method() == Method::OPTIONS {
        let mut resp = StatusCode::NO_CONTENT.into_response();
        if let Some(origin) = origin {
            let headers = resp.headers_mut();
            headers.insert("access-control-allow-origin", origin);
            headers.insert("access-control-allow-methods", HeaderValue::from_static(ALLOW_METHODS));
            headers.insert("access-control-allow-headers", HeaderValue::from_static(ALLOW_HEADERS));
            headers.insert("access-control-max-age", HeaderValue::from_static("600"));
            headers.insert("vary", HeaderValue::from_static("Origin"));
        }
        return resp;
    }

    let mut resp = next.run(req).await;
    if let Some(origin) = origin {
        let headers = resp.headers_mut();
        headers.insert("access-control-allow-origin", origin);
        headers.insert("access-control-expose-headers", HeaderValue::from_static(REQUEST_ID_HEADER));
        headers.insert("vary", HeaderValue::from_static("Origin"));
    }
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_value_rejects_junk() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("abc-123"));
        assert_eq!(header_value(&headers, REQUEST_ID_HEADER, 16).as_deref(), Some("abc-123"));
        assert_eq!(header_value(&headers, REQUEST_ID_HEADER, 3), None);

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("has space"));
        assert_eq!(header_value(&headers, REQUEST_ID_HEADER, 64), None);
        assert_eq!(header_value(&headers, "origin", 64), None);
    }

    #[tokio::test]
    async fn request_id_is_task_scoped() {
        assert_eq!(current_request_id(), None);
        let seen = REQUEST_ID
            .scope("req-0000000000000001".to_string(), async { current_request_id() })
            .await;
        assert_eq!(seen.as_deref(), Some("req-0000000000000001"));
    }
}
