//! Serving a [`Dispatcher`] over HTTP with Axum.
//!
//! The dispatcher is installed as the fallback service of an `axum::Router`,
//! so every request reaches it regardless of path. Tower layers wrap it from
//! the inside out:
//!
//! 1. **Timeout** answers 408 when `http.request_timeout` elapses (optional)
//! 2. **Trace** opens an `http_request` span per request
//! 3. **RequestId** generates or preserves `x-request-id` and echoes it back
//! 4. **CatchPanic** turns a panicking handler into a 500 (unless disabled)

use {
    super::{Dispatcher, shutdown::shutdown_signal},
    crate::{ResponseView, Result, utils::RequestIdGenerator},
    axum::{
        body::Body,
        extract::{Request, State},
        response::{IntoResponse, Response},
    },
    http::{HeaderName, StatusCode},
    std::sync::Arc,
    tokio::net::TcpListener,
    tower_http::{
        catch_panic::CatchPanicLayer,
        request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
        timeout::TimeoutLayer,
        trace::TraceLayer,
    },
};

impl Dispatcher {
    /// Converts the dispatcher into an `axum::Router` with the transport
    /// layers configured in `[http]`.
    pub fn into_router(self) -> axum::Router {
        let http = self.config.http.clone();
        let mut router = axum::Router::new()
            .fallback(respond)
            .with_state(Arc::new(self));

        if let Some(timeout) = http.request_timeout {
            router = router.layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                timeout,
            ));
        }

        let x_request_id = HeaderName::from_static("x-request-id");
        router = router
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &http::Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");

                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }),
            )
            .layer(SetRequestIdLayer::new(
                x_request_id.clone(),
                RequestIdGenerator,
            ))
            .layer(PropagateRequestIdLayer::new(x_request_id));

        if http.catch_panic {
            router = router.layer(CatchPanicLayer::custom(panic_response));
        }

        router
    }

    /// Serves requests accepted on `listener` until Ctrl+C, SIGTERM or the
    /// [cancellation token](Dispatcher::cancellation_token) fires.
    ///
    /// In-flight requests get `http.shutdown_timeout` to finish; after that
    /// the server stops without waiting for them.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let shutdown_timeout = self.config.http.shutdown_timeout;
        let token = self.cancellation_token();

        if let Ok(addr) = listener.local_addr() {
            tracing::info!("Bound to {}", addr);
        }
        tracing::info!("Waiting for connections");

        let service = self.into_router().into_make_service();
        let serve_future = axum::serve(listener, service)
            .with_graceful_shutdown(shutdown_signal(shutdown_timeout, token.clone()));

        tokio::select! {
            result = serve_future => {
                tracing::info!("Graceful shutdown completed");
                result?;
            }
            _ = async {
                token.cancelled().await;
                tokio::time::sleep(shutdown_timeout).await;
            } => {
                tracing::warn!("Graceful shutdown timeout expired, forcing shutdown");
            }
        }

        Ok(())
    }

    /// Binds `http.bind_addr:http.bind_port` and serves on it.
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.http.full_bind_addr();
        let listener = TcpListener::bind(&bind_addr).await?;
        self.serve(listener).await
    }
}

/// The fallback handler: every request goes through the dispatcher.
async fn respond(State(dispatcher): State<Arc<Dispatcher>>, request: Request) -> Response {
    let ctx = dispatcher.build_context(request, ResponseView::default());
    let mut ctx = dispatcher.dispatch_request(ctx).await;

    if !ctx.res.is_sent() {
        let message = format!("Cannot {} {}", ctx.req.method, ctx.req.path);
        ctx.res.status(StatusCode::NOT_FOUND).text(message);
    }
    ctx.res.into_response()
}

fn panic_response(err: Box<dyn std::any::Any + Send + 'static>) -> Response<String> {
    let msg = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unable to downcast the panic info".to_string()
    };
    tracing::error!("Handler panicked: {}", msg);

    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body("Internal Server Error".to_string())
        .unwrap_or_else(|_| Response::new("Internal Server Error".to_string()))
}
