// Application server configuration and setup

use std::time::Duration;
use axum::{
    Router,
    middleware::from_fn,
    error_handling::HandleErrorLayer,
};
use tower::{ServiceBuilder, timeout::TimeoutLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tokio::{signal, net::TcpListener};
use listenfd::ListenFd;
use anyhow::{Context, Result};
use tracing::error;

use crate::api::greeting::greeting_routes;
use crate::config::{environment::EnvironmentVariables, state::AppState};
use crate::utils::{
    error_handler::{fallback_handler, handle_global_error},
    response_handler::response_wrapper,
};

/// Creates the application router with all middleware layers
pub fn create_app(state: AppState) -> Router {
    let routes: Router<AppState> = Router::new()
        .merge(greeting_routes())
        // Add new routes here
        .fallback(fallback_handler);

    with_global_layers(routes, &state.environment).with_state(state)
}

/// Outermost first: envelope, error mapping, timeout, body limit.
/// The body limit answers 413 itself when Content-Length is over the limit.
fn with_global_layers(router: Router<AppState>, env: &EnvironmentVariables) -> Router<AppState> {
    router.layer(
        ServiceBuilder::new()
            .layer(from_fn(response_wrapper))
            .layer(HandleErrorLayer::new(handle_global_error))
            .layer(TimeoutLayer::new(Duration::from_secs(env.default_timeout_seconds)))
            .layer(RequestBodyLimitLayer::new(env.max_request_body_size))
    )
}

/// Takes a listener handed over by systemfd/listenfd, or binds HOST:PORT
pub async fn setup_listener(env: &EnvironmentVariables) -> Result<TcpListener> {
    let mut listenfd: ListenFd = ListenFd::from_env();

    let listener: TcpListener = match listenfd.take_tcp_listener(0)? {
        Some(std_listener) => {
            std_listener.set_nonblocking(true)?;
            TcpListener::from_std(std_listener)?
        }
        None => {
            let addr: String = format!("{}:{}", env.host, env.port);
            TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {addr}"))?
        }
    };

    Ok(listener)
}

/// Handles graceful shutdown signals (Ctrl+C and TERM)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("Failed to install TERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Shutting down via Ctrl+C"),
        _ = terminate => tracing::info!("Shutting down via TERM signal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, Bytes},
        http::{header, Method, Request, Response, StatusCode},
        routing::get,
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::new(EnvironmentVariables {
            default_timeout_seconds: 1,
            ..EnvironmentVariables::default()
        })
    }

    async fn send(app: Router, method: Method, uri: &str) -> Response<Body> {
        let request: Request<Body> = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        app.oneshot(request).await.unwrap()
    }

    async fn send_with_body(app: Router, method: Method, uri: &str, body: Vec<u8>) -> Response<Body> {
        let request: Request<Body> = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap();
        app.oneshot(request).await.unwrap()
    }

    fn small_limit_state() -> AppState {
        AppState::new(EnvironmentVariables {
            max_request_body_size: 16,
            ..EnvironmentVariables::default()
        })
    }

    async fn body_bytes(response: Response<Body>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn get_hello_returns_plain_text_greeting() {
        let response: Response<Body> = send(create_app(test_state()), Method::GET, "/hello").await;

        assert_eq!(response.status(), StatusCode::OK);
        let content_type: &str = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/plain"));
        assert_eq!(&body_bytes(response).await[..], b"Hello World!");
    }

    #[tokio::test]
    async fn post_hello_is_method_not_allowed() {
        let response: Response<Body> = send(create_app(test_state()), Method::POST, "/hello").await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers().contains_key(header::ALLOW));

        let body: Bytes = body_bytes(response).await;
        assert!(!String::from_utf8_lossy(&body).contains("Hello World!"));
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "METHOD_NOT_ALLOWED");
        assert_eq!(json["code"], 405);
    }

    #[tokio::test]
    async fn head_hello_succeeds_without_body() {
        let response: Response<Body> = send(create_app(test_state()), Method::HEAD, "/hello").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_bytes(response).await.is_empty());
    }

    // Paths match exactly; no trailing slash redirect
    #[tokio::test]
    async fn trailing_slash_is_not_found() {
        let response: Response<Body> = send(create_app(test_state()), Method::GET, "/hello/").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["status"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn unknown_route_gets_enveloped_404() {
        let response: Response<Body> = send(create_app(test_state()), Method::GET, "/missing").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["code"], 404);
        assert_eq!(json["messages"][0], "The requested route does not exist");
        assert!(json["date"].is_string());
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_with_413_before_routing() {
        for method in [Method::GET, Method::POST] {
            let response: Response<Body> =
                send_with_body(create_app(small_limit_state()), method, "/hello", vec![b'X'; 4096]).await;

            assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
            let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
            assert_eq!(json["status"], "PAYLOAD_TOO_LARGE");
            assert_eq!(json["code"], 413);
        }
    }

    #[tokio::test]
    async fn body_within_limit_still_reaches_the_handler() {
        let response: Response<Body> =
            send_with_body(create_app(small_limit_state()), Method::GET, "/hello", vec![b'X'; 8]).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(&body_bytes(response).await[..], b"Hello World!");
    }

    #[tokio::test]
    async fn slow_handler_times_out_with_408() {
        let state: AppState = test_state();
        let routes: Router<AppState> = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                "late"
            }),
        );
        let app: Router = with_global_layers(routes, &state.environment).with_state(state);

        let response: Response<Body> = send(app, Method::GET, "/slow").await;

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["status"], "REQUEST_TIMEOUT");
        assert_eq!(json["code"], 408);
    }
}
