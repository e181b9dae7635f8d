// Global error handling for HTTP middleware layers

use axum::{
    BoxError,
    http::StatusCode,
    response::IntoResponse,
};
use std::error::Error;
// tower's error type for timeouts
use tower::timeout::error::Elapsed;
use tracing::{error, warn};

/// Maps errors raised by the middleware stack to HTTP statuses.
/// The response wrapper turns the status into the JSON envelope.
/// Oversized bodies never get here: the body limit layer answers 413 itself.
pub async fn handle_global_error(err: BoxError) -> impl IntoResponse {
    map_error_status(&*err)
}

fn map_error_status(err: &(dyn Error + 'static)) -> StatusCode {
    // 408 if the request took too long
    if err.is::<Elapsed>() || find_cause::<Elapsed>(err).is_some() {
        warn!("Request timed out");
        return StatusCode::REQUEST_TIMEOUT;
    }

    error!("Unhandled internal error: {err}");
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Answers every request that matched no route.
pub async fn fallback_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "The requested route does not exist")
}

/// Helper function to find specific error type in error chain
pub fn find_cause<T: Error + 'static>(err: &dyn Error) -> Option<&T> {
    let mut source: Option<&dyn Error> = err.source();

    while let Some(s) = source {
        if let Some(typed) = s.downcast_ref::<T>() {
            return Some(typed);
        }
        source = s.source();
    }

    None
}
