// Start of file: src/main.rs

use axum::{Router, serve};
use tokio::net::TcpListener;
use tracing::info;

use greeting_service::config::state::AppState;
use greeting_service::core::{
    logging::init_tracing,
    server::{create_app, setup_listener, shutdown_signal},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let state: AppState = AppState::from_env()?;
    info!(environment = %state.environment.environment, "Configuration loaded");

    let listener: TcpListener = setup_listener(&state.environment).await?;
    let app: Router = create_app(state);

    info!("Server listening on: {}", listener.local_addr()?);

    serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

// End of file: src/main.rs
