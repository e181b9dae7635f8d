// Start of file: /src/api/greeting/handler.rs

/*
    * Handler for the greeting endpoint.
    * It consumes nothing from the request and always answers with the same text.
*/

/// Body returned by `GET /hello`, byte for byte.
pub const GREETING: &str = "Hello World!";

/// Returns the greeting as `text/plain; charset=utf-8` with status 200.
#[tracing::instrument]
pub async fn hello_handler() -> &'static str {
    GREETING
}


// End of file: /src/api/greeting/handler.rs
