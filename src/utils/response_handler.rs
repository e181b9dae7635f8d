// Uniform JSON envelope for error responses, plus per-request logging.
// Successful responses pass through untouched.

use std::{convert::Infallible, time::Instant};
use axum::{
    body::{Body, Bytes},
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderValue, Method, Request, Response, StatusCode,
        response::Parts,
    },
    middleware::Next,
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// JSON body sent for every 4xx and 5xx response
#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseFormat {
    pub status: String,        // HTTP status text (e.g. "NOT_FOUND")
    pub code: u16,             // HTTP status code
    pub messages: Vec<String>, // Text the inner service produced, if any
    pub date: String,          // ISO timestamp
}

impl ResponseFormat {
    pub fn new(status: StatusCode, messages: Vec<String>) -> Self {
        Self {
            status: status_label(status),
            code: status.as_u16(),
            messages,
            date: Utc::now().to_rfc3339(),
        }
    }
}

/// "Method Not Allowed" -> "METHOD_NOT_ALLOWED"
fn status_label(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("UNKNOWN STATUS")
        .to_uppercase()
        .replace(' ', "_")
}

fn body_to_messages(raw: &[u8]) -> Vec<String> {
    match std::str::from_utf8(raw) {
        Ok(text) if !text.trim().is_empty() => vec![text.trim().to_string()],
        Ok(_) => Vec::new(),
        Err(err) => {
            warn!("Error response body is not valid UTF-8: {err}");
            Vec::new()
        }
    }
}

/// Logs the envelope as two-space indented JSON
fn log_formatted_response(wrapped: &ResponseFormat) {
    match serde_json::to_string_pretty(wrapped) {
        Ok(spaced_json) => debug!("\nFinal response:\n{}", spaced_json),
        Err(err) => error!("Failed to format response JSON: {:?}", err),
    }
}

/// Swaps the body for the envelope, keeping status and unrelated headers
fn build_final_response(mut parts: Parts, wrapped: &ResponseFormat) -> Response<Body> {
    let json_body: Vec<u8> = serde_json::to_vec(wrapped).unwrap_or_else(|err| {
        error!("Failed to serialize response envelope: {err}");
        b"{}".to_vec()
    });

    parts.headers.remove(CONTENT_LENGTH);
    parts.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Response::from_parts(parts, Body::from(json_body))
}

fn is_error(status: StatusCode) -> bool {
    status.is_client_error() || status.is_server_error()
}

/// Middleware that logs every request and wraps error responses in `ResponseFormat`
pub async fn response_wrapper(
    req: Request<Body>,
    next: Next,
) -> Result<Response<Body>, Infallible> {
    let start_time: Instant = Instant::now();
    let method: Method = req.method().clone();
    let path: String = req.uri().path().to_owned();

    let response: Response<Body> = next.run(req).await;
    let status: StatusCode = response.status();

    info!(
        %method,
        %path,
        status = status.as_u16(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Request completed"
    );

    if !is_error(status) {
        return Ok(response);
    }

    let (parts, body) = response.into_parts();
    let raw: Bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            warn!("Failed to read error response body: {err}");
            Bytes::new()
        }
    };

    let wrapped: ResponseFormat = ResponseFormat::new(status, body_to_messages(&raw));
    log_formatted_response(&wrapped);

    Ok(build_final_response(parts, &wrapped))
}
