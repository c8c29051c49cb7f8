//! # Request/Response Logging Middleware
//!
//! One structured line per request and one per response, correlated by the
//! request id from [`stamp_req`](super::stamp_req). Credentials never reach
//! the logs: sensitive headers are redacted, and requests to the sign-in
//! endpoint are flagged so nothing about their payload is logged.

use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::mw_req_stamp::RequestStamp;

/// Headers whose values are never logged.
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "x-identity-secret"];

/// Endpoints whose traffic carries identity material.
const SENSITIVE_ENDPOINTS: &[&str] = &["/api/auth/callback"];

const REDACTED: &str = "***REDACTED***";

fn sanitized_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            if SENSITIVE_HEADERS.contains(&name.as_str()) {
                Some((name.to_string(), REDACTED.to_string()))
            } else {
                value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
            }
        })
        .collect()
}

pub async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let request_id = RequestStamp::id_of(&req);
    let is_sensitive = SENSITIVE_ENDPOINTS.iter().any(|ep| path.starts_with(ep));

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        query = ?query,
        sensitive = is_sensitive,
        "[REQUEST] {} {}",
        method,
        path
    );

    if !is_sensitive {
        debug!(
            request_id = %request_id,
            headers = ?sanitized_headers(req.headers()),
            "[REQUEST HEADERS]"
        );
    }

    let response = next.run(req).await;

    let duration_ms = start.elapsed().as_millis();
    let status = response.status();

    if status.is_server_error() {
        error!(
            request_id = %request_id,
            status = status.as_u16(),
            duration_ms,
            "[RESPONSE] {} {} -> {} ({}ms) [SERVER ERROR]",
            method,
            path,
            status.as_u16(),
            duration_ms
        );
    } else if status.is_client_error() {
        warn!(
            request_id = %request_id,
            status = status.as_u16(),
            duration_ms,
            "[RESPONSE] {} {} -> {} ({}ms) [CLIENT ERROR]",
            method,
            path,
            status.as_u16(),
            duration_ms
        );
    } else {
        info!(
            request_id = %request_id,
            status = status.as_u16(),
            duration_ms,
            "[RESPONSE] {} {} -> {} ({}ms)",
            method,
            path,
            status.as_u16(),
            duration_ms
        );
    }

    response
}
