//! Per-request state threaded through the middleware chains.
//!
//! One [`RequestContext`] is created for each incoming request and moved from
//! handler to handler. It is never shared between requests.

use {
    crate::{Config, Methods},
    axum::{
        body::{Body, Bytes},
        response::{IntoResponse, Response},
    },
    http::{
        Extensions, HeaderMap, HeaderValue, Method, Request, StatusCode, Uri, Version,
        header::{CONTENT_TYPE, IntoHeaderName},
    },
    std::{collections::HashMap, fmt, sync::Arc},
};

/// The request half of a context.
pub struct RequestView {
    pub method: Method,
    /// The request target exactly as received.
    pub uri: Uri,
    /// The path used for route matching.
    pub path: String,
    pub version: Version,
    pub headers: HeaderMap,
    /// Parameters bound by the matched route. Empty until a route matches.
    pub params: HashMap<String, String>,
    pub body: Body,
}

impl RequestView {
    pub fn from_request(request: Request<Body>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            path: parts.uri.path().to_string(),
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            params: HashMap::new(),
            body,
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// The raw query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Path and query as received.
    pub fn original_url(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
    }

    /// A header value, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Takes the body, leaving an empty one behind.
    pub fn take_body(&mut self) -> Body {
        std::mem::take(&mut self.body)
    }
}

impl fmt::Debug for RequestView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestView")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// The response half of a context.
///
/// A response counts as sent once a body has been set with [`send`](Self::send),
/// [`text`](Self::text) or [`end`](Self::end). Requests left unsent by every
/// handler are answered with 404 by the transport.
#[derive(Debug, Default)]
pub struct ResponseView {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl ResponseView {
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn set_header<K: IntoHeaderName>(&mut self, name: K, value: HeaderValue) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Sets the body and marks the response as sent.
    pub fn send(&mut self, body: impl Into<Bytes>) -> &mut Self {
        self.body = Some(body.into());
        self
    }

    /// Sends a UTF-8 text body, defaulting the content type to `text/plain`.
    pub fn text(&mut self, body: impl Into<String>) -> &mut Self {
        if !self.headers.contains_key(CONTENT_TYPE) {
            self.headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
        }
        self.send(body.into())
    }

    /// Marks the response as sent with an empty body.
    pub fn end(&mut self) -> &mut Self {
        self.send(Bytes::new())
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn is_sent(&self) -> bool {
        self.body.is_some()
    }
}

impl IntoResponse for ResponseView {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body.unwrap_or_default()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Read access to the application configuration from inside a handler.
#[derive(Debug, Clone)]
pub struct AppHandle {
    config: Arc<Config>,
}

impl AppHandle {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Reads a value from the `[settings]` table.
    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.config.get(key)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// The route that matched the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute {
    pub pattern: String,
    pub methods: Methods,
}

/// Everything a handler sees for one request.
#[derive(Debug)]
pub struct RequestContext {
    pub req: RequestView,
    pub res: ResponseView,
    /// Typed per-request storage for handlers to share values.
    pub extensions: Extensions,
    app: AppHandle,
    route: Option<MatchedRoute>,
}

impl RequestContext {
    pub fn new(req: RequestView, res: ResponseView, app: AppHandle) -> Self {
        Self {
            req,
            res,
            extensions: Extensions::new(),
            app,
            route: None,
        }
    }

    pub fn app(&self) -> &AppHandle {
        &self.app
    }

    /// The matched route, once route resolution succeeded.
    pub fn route(&self) -> Option<&MatchedRoute> {
        self.route.as_ref()
    }

    pub(crate) fn set_route(&mut self, route: MatchedRoute) {
        self.route = Some(route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> RequestView {
        RequestView::from_request(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header("x-token", "abc")
                .body(Body::empty())
                .unwrap(),
        )
    }

    #[test]
    fn test_request_view_accessors() {
        let req = request("/search/items?q=rust&page=2");
        assert_eq!(req.path, "/search/items");
        assert_eq!(req.query(), Some("q=rust&page=2"));
        assert_eq!(req.original_url(), "/search/items?q=rust&page=2");
        assert_eq!(req.header("x-token"), Some("abc"));
        assert_eq!(req.header("missing"), None);
        assert!(req.param("id").is_none());
    }

    #[test]
    fn test_response_not_sent_by_default() {
        let mut res = ResponseView::default();
        assert_eq!(res.status_code(), StatusCode::OK);
        res.status(StatusCode::CREATED)
            .set_header("x-a", HeaderValue::from_static("1"));
        assert!(!res.is_sent());
        res.end();
        assert!(res.is_sent());
    }

    #[test]
    fn test_text_keeps_explicit_content_type() {
        let mut res = ResponseView::default();
        res.set_header(CONTENT_TYPE, HeaderValue::from_static("text/html"))
            .text("<p>hi</p>");
        assert_eq!(res.header("content-type").unwrap(), "text/html");
    }

    #[tokio::test]
    async fn test_into_response() {
        let mut res = ResponseView::default();
        res.status(StatusCode::ACCEPTED).text("queued");
        let response = res.into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(
            response.headers()["content-type"],
            "text/plain; charset=utf-8"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"queued");
    }

    #[test]
    fn test_app_handle_reads_settings() {
        let config = "".parse::<Config>().unwrap().with_setting("name", "demo");
        let app = AppHandle::new(Arc::new(config));
        assert_eq!(app.get("name").and_then(|v| v.as_str()), Some("demo"));
    }
}
