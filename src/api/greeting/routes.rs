// Start of file: /src/api/greeting/routes.rs

use axum::{routing::get, Router};

use crate::api::greeting::handler::hello_handler;
use crate::config::state::AppState;

/// GET /hello. Other methods on the same path get axum's 405.
pub fn greeting_routes() -> Router<AppState> {
    Router::new().route("/hello", get(hello_handler))
}

// End of file: /src/api/greeting/routes.rs
