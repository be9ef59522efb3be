//! Shared HTTP response checks for provider clients.
//!
//! 429 becomes [`AiError::RateLimited`] and any other non-success status
//! becomes [`AiError::Api`]; whether that is retried is decided by
//! [`AiError::is_retryable`].

use crate::error::AiError;

/// Longest provider error body kept in an error message.
const MAX_ERROR_BODY: usize = 500;

/// Check a provider response, returning it unchanged on success.
///
/// `Retry-After` is read as seconds and falls back to 60 s when absent or
/// unparseable.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, AiError> {
    if resp.status() == 429 {
        return Err(AiError::RateLimited {
            retry_after_secs: parse_retry_after(&resp),
        });
    }
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let mut message = resp.text().await.unwrap_or_default();
        if message.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY).rev().find(|&i| message.is_char_boundary(i)).unwrap_or(0);
            message.truncate(cut);
        }
        return Err(AiError::Api { status, message });
    }
    Ok(resp)
}

/// Parse the `Retry-After` header as seconds, falling back to 60 s.
fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60)
}
