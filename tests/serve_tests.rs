//! Integration tests against a real listener.
//!
//! Each test binds a random port, serves a dispatcher on it and talks to it
//! with `reqwest`, then stops the server through its cancellation token.
//!
//! ## Test Coverage
//!
//! - `test_routes_params_and_middleware_over_http`: full three-tier dispatch
//! - `test_unknown_path_is_404`: default answer when nothing responds
//! - `test_panic_does_not_kill_server`: a panicking handler yields 500 and the
//!   server keeps serving
//! - `test_cancellation_token_stops_server`: graceful shutdown on cancel

use axum_dispatch::{Config, Dispatcher, Next, RequestContext, Router, from_fn};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;

fn test_config() -> Config {
    r#"
[http]
bind_addr = "127.0.0.1"
bind_port = 0
shutdown_timeout = "1s"

[routing]
powered_by = "serve-tests"

[logging]
format = "json"
    "#
    .parse()
    .expect("Failed to parse test config TOML")
}

fn test_router() -> Router {
    let mut router = Router::new();
    router.use_middleware(from_fn(|mut ctx: RequestContext, next: Next| async move {
        ctx.res
            .set_header("x-router", "users".parse().unwrap());
        next.run(ctx).await
    }));
    router
        .get(
            "/users/:id",
            [from_fn(|mut ctx: RequestContext, _next: Next| async move {
                let id = ctx.req.param("id").unwrap_or_default().to_string();
                ctx.res.text(format!("user {id}"));
                ctx
            })],
        )
        .unwrap()
        .get(
            "/panic",
            [from_fn(|ctx: RequestContext, _next: Next| async move {
                if ctx.req.path == "/api/panic" {
                    panic!("Test panic!");
                }
                ctx
            })],
        )
        .unwrap();
    router
}

/// Starts a server on a random port and returns its port, a shutdown token
/// and the server task.
async fn start_test_server() -> (u16, CancellationToken, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let port = listener.local_addr().unwrap().port();

    let mut dispatcher = Dispatcher::new(test_config()).expect("Failed to create Dispatcher");
    dispatcher.use_middleware(from_fn(|mut ctx: RequestContext, next: Next| async move {
        ctx.res.set_header("x-global", "yes".parse().unwrap());
        next.run(ctx).await
    }));
    dispatcher
        .mount(test_router(), "/api")
        .expect("Failed to mount router");

    let token = dispatcher.cancellation_token();
    let handle = tokio::spawn(async move {
        dispatcher.serve(listener).await.expect("Server failed");
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (port, token, handle)
}

#[tokio::test]
async fn test_routes_params_and_middleware_over_http() {
    let (port, token, handle) = start_test_server().await;
    let client = Client::new();

    let response = client
        .get(format!("http://127.0.0.1:{port}/api/users/42"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-global"], "yes");
    assert_eq!(response.headers()["x-router"], "users");
    assert_eq!(response.headers()["x-powered-by"], "serve-tests");
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "user 42");

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let (port, token, handle) = start_test_server().await;

    let response = Client::new()
        .post(format!("http://127.0.0.1:{port}/api/users/42"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["x-global"], "yes");
    assert!(response.headers().get("x-router").is_none());
    assert_eq!(response.text().await.unwrap(), "Cannot POST /api/users/42");

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_panic_does_not_kill_server() {
    let (port, token, handle) = start_test_server().await;
    let client = Client::new();

    let response = client
        .get(format!("http://127.0.0.1:{port}/api/panic"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = client
        .get(format!("http://127.0.0.1:{port}/api/users/7"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_cancellation_token_stops_server() {
    let (port, token, handle) = start_test_server().await;

    token.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("Server did not stop in time")
        .unwrap();

    let result = Client::new()
        .get(format!("http://127.0.0.1:{port}/api/users/1"))
        .timeout(Duration::from_millis(500))
        .send()
        .await;
    assert!(result.is_err());
}
