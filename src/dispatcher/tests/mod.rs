//! Dispatcher tests.
//!
//! These run in-process: either by calling `dispatch_request` directly and
//! inspecting the returned context, or through `into_router()` with
//! `oneshot()`. Tests against a real listener live in `tests/`.

use crate::{
    BoxedMiddleware, Config, Dispatcher, Next, RequestContext, ResponseView, from_fn,
};
use axum::{body::Body, http::Request, response::Response};
use http::Method;
use std::sync::{Arc, Mutex};

mod dispatch;

/// Shared record of which handlers ran, in order.
pub(crate) type Log = Arc<Mutex<Vec<String>>>;

pub(crate) fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub(crate) fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Default configuration without reading `RUST_ENV`.
pub(crate) fn test_config() -> Config {
    "".parse().unwrap()
}

pub(crate) fn test_dispatcher() -> Dispatcher {
    Dispatcher::new(test_config()).unwrap()
}

/// A handler that records `name` and continues.
pub(crate) fn recorder(log: &Log, name: &str) -> BoxedMiddleware {
    let log = Arc::clone(log);
    let name = name.to_string();
    from_fn(move |ctx: RequestContext, next: Next| {
        log.lock().unwrap().push(name.clone());
        next.run(ctx)
    })
}

/// A handler that records `name` and ends the request with `name` as body.
pub(crate) fn responder(log: &Log, name: &str) -> BoxedMiddleware {
    let log = Arc::clone(log);
    let name = name.to_string();
    from_fn(move |mut ctx: RequestContext, _next: Next| {
        log.lock().unwrap().push(name.clone());
        ctx.res.text(name.clone());
        std::future::ready(ctx)
    })
}

pub(crate) fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Dispatches one request without going through the transport.
pub(crate) async fn dispatch(dispatcher: &Dispatcher, method: Method, uri: &str) -> RequestContext {
    let ctx = dispatcher.build_context(request(method, uri), ResponseView::default());
    dispatcher.dispatch_request(ctx).await
}

pub(crate) fn body_text(ctx: &RequestContext) -> Option<String> {
    ctx.res
        .body()
        .map(|body| String::from_utf8_lossy(body).into_owned())
}

pub(crate) async fn get_body_string(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}
