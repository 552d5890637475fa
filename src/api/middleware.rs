//! API Middleware
//!
//! Cron-secret authentication, rate limiting, and request logging.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::AppState;

/// Header carrying the scheduler's shared secret
pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

// =========================================================================
// Cron-Secret Authentication Middleware
// =========================================================================

/// Validate the x-cron-secret header before any work is performed
pub async fn cron_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let secret = match headers.get(CRON_SECRET_HEADER).and_then(|v| v.to_str().ok()) {
        Some(secret) => secret,
        None => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "Missing x-cron-secret header",
                    "error_code": "missing_cron_secret"
                })),
            )
                .into_response());
        }
    };

    if secret != state.config.cron_secret {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Invalid cron secret",
                "error_code": "invalid_cron_secret"
            })),
        )
            .into_response());
    }

    Ok(next.run(request).await)
}

// =========================================================================
// Rate Limiting Middleware
// =========================================================================

/// Client identity for rate limiting: first forwarded hop, or "direct"
fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "direct".to_string())
}

/// Rate limiting middleware over the injected limiter
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let key = client_key(request.headers());

    let allowed = match state.limiter.check_and_increment(&key).await {
        Ok(allowed) => allowed,
        Err(e) => {
            tracing::error!("Rate limit check error: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Rate limit check failed",
                    "error_code": "database_error"
                })),
            )
                .into_response());
        }
    };

    if !allowed {
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": "Rate limit exceeded",
                "error_code": "rate_limit_exceeded"
            })),
        )
            .into_response());
    }

    Ok(next.run(request).await)
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &[
    "x-cron-secret",
    "authorization",
    "cookie",
    "set-cookie",
];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    // Mask sensitive headers
    let headers = mask_headers_for_logging(request.headers());

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_headers_for_logging() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("x-cron-secret", "super-secret-value".parse().unwrap());
        headers.insert("x-forwarded-for", "10.0.0.1".parse().unwrap());

        let masked = mask_headers_for_logging(&headers);

        let secret = masked.iter().find(|(k, _)| k == "x-cron-secret");
        let content_type = masked.iter().find(|(k, _)| k == "content-type");
        let forwarded = masked.iter().find(|(k, _)| k == "x-forwarded-for");

        assert_eq!(secret.unwrap().1, "[REDACTED]");
        assert_eq!(content_type.unwrap().1, "application/json");
        assert_eq!(forwarded.unwrap().1, "10.0.0.1");
    }

    #[test]
    fn test_sensitive_headers_list() {
        assert!(SENSITIVE_HEADERS.contains(&"x-cron-secret"));
        assert!(SENSITIVE_HEADERS.contains(&"authorization"));
        assert!(!SENSITIVE_HEADERS.contains(&"content-type"));
    }

    #[test]
    fn test_client_key_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1, 10.0.0.2".parse().unwrap());
        assert_eq!(client_key(&headers), "10.0.0.1");

        let empty = HeaderMap::new();
        assert_eq!(client_key(&empty), "direct");
    }
}
