//! tests/common/mod.rs
//! A shared test helper to spawn the app on an ephemeral port.

use greeting_service::{create_app, AppState, EnvironmentVariables};

use tokio::net::TcpListener as TokioTcpListener;
use axum::serve;

/// Spawns the app on a random unused port and returns its base URL.
pub fn spawn_app() -> String {
    // * Same router and layers as main(), with default configuration.
    let state: AppState = AppState::new(EnvironmentVariables::default());
    let app: axum::Router = create_app(state);

    // * Bind an ephemeral port using std::net::TcpListener.
    let std_listener: std::net::TcpListener = std::net::TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    std_listener.set_nonblocking(true).unwrap();

    // * Convert std::net::TcpListener to tokio::net::TcpListener.
    let tokio_listener: TokioTcpListener = TokioTcpListener::from_std(std_listener)
        .expect("Failed to convert to tokio listener");

    let addr: std::net::SocketAddr = tokio_listener.local_addr().unwrap();

    // * Spawn the server in a background task.
    tokio::spawn(async move {
        serve(tokio_listener, app)
            .await
            .expect("Server failed");
    });

    format!("http://{}", addr)
}
