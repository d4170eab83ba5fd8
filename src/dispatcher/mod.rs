//! The request dispatcher.
//!
//! A [`Dispatcher`] owns the global middleware chain and the top-level
//! routers. Each request runs through three tiers:
//!
//! 1. the global chain, in the order handlers were added with
//!    [`Dispatcher::use_middleware`]
//! 2. the router-level chain of the router owning the first matching route
//! 3. the matched route's own handlers
//!
//! Route resolution happens only after the whole global chain has called its
//! continuation, so a global handler that ends the request prevents any
//! lookup. When no route matches the context comes back untouched and the
//! transport answers 404.

mod shutdown;
mod transport;

#[cfg(test)]
mod tests;

use {
    crate::{
        AppHandle, BoxFuture, BoxedMiddleware, Config, Continuation, MatchedRoute,
        MiddlewareChain, MountOptions, RequestContext, RequestView, ResponseView, Result, Router,
        middleware::done,
    },
    axum::body::Body,
    http::{HeaderValue, Method, Request},
    std::{collections::HashMap, fmt, sync::Arc},
    tokio_util::sync::CancellationToken,
};

/// Routes requests through the global, router and route middleware tiers.
///
/// ```rust
/// use axum_dispatch::{Config, Dispatcher, Router, from_fn, RequestContext, Next};
///
/// # fn main() -> axum_dispatch::Result<()> {
/// let mut api = Router::new();
/// api.get("/users/:id", [from_fn(|mut ctx: RequestContext, _next: Next| async move {
///     let id = ctx.req.param("id").unwrap_or_default().to_string();
///     ctx.res.text(format!("user {id}"));
///     ctx
/// })])?;
///
/// let mut dispatcher = Dispatcher::new("".parse::<Config>()?)?;
/// dispatcher.mount(api, "/api")?;
/// let app: axum::Router = dispatcher.into_router();
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher {
    config: Arc<Config>,
    global: Vec<BoxedMiddleware>,
    chain: MiddlewareChain,
    routers: Arc<Vec<Arc<Router>>>,
    powered_by: Option<HeaderValue>,
    shutdown: CancellationToken,
}

impl Dispatcher {
    /// Creates a dispatcher with no middleware and no routers.
    ///
    /// # Errors
    ///
    /// Returns the error reported by [`Config::validate`].
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            powered_by: config.routing.powered_by_header(),
            config: Arc::new(config),
            global: Vec::new(),
            chain: MiddlewareChain::default(),
            routers: Arc::new(Vec::new()),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Appends a handler to the global chain.
    pub fn use_middleware(&mut self, middleware: BoxedMiddleware) -> &mut Self {
        self.global.push(middleware);
        self.chain = MiddlewareChain::compile(self.global.iter().cloned());
        self
    }

    /// Mounts a top-level router.
    ///
    /// The router is rebased and given the mount-supplied handlers, then
    /// activated with the match options from the `[routing]` configuration.
    /// Routers are searched in mount order.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::TypeMismatch`](crate::ErrorKind::TypeMismatch)
    /// error for a malformed base route, or a pattern error when rebasing
    /// fails. Nothing is mounted on error.
    pub fn mount(&mut self, mut router: Router, options: impl Into<MountOptions>) -> Result<&mut Self> {
        router.attach(options.into())?;
        router.activate(self.config.routing.match_options())?;
        tracing::debug!(
            base = router.base().unwrap_or("/"),
            routes = router.routes().len(),
            "router mounted"
        );
        Arc::make_mut(&mut self.routers).push(Arc::new(router));
        Ok(self)
    }

    /// The mounted top-level routers, in mount order.
    pub fn routers(&self) -> &[Arc<Router>] {
        &self.routers
    }

    /// The global chain.
    pub fn chain(&self) -> &MiddlewareChain {
        &self.chain
    }

    /// A token cancelled when the server begins shutting down. Cancelling
    /// it also triggers a graceful shutdown.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Wraps a transport request and response into a fresh context.
    pub fn build_context(&self, request: Request<Body>, mut response: ResponseView) -> RequestContext {
        if let Some(value) = &self.powered_by {
            response.set_header("x-powered-by", value.clone());
        }
        RequestContext::new(
            RequestView::from_request(request),
            response,
            AppHandle::new(Arc::clone(&self.config)),
        )
    }

    /// Runs `ctx` through the global chain, then through the tiers of the
    /// first matching route.
    ///
    /// The returned context reflects whatever the handlers did. Its response
    /// is left unsent when no route matched or no handler sent one.
    pub fn dispatch_request(&self, ctx: RequestContext) -> BoxFuture<RequestContext> {
        tracing::trace!(method = %ctx.req.method, path = %ctx.req.path, "dispatching request");
        self.chain
            .invoke(ctx, route_tier(Arc::clone(&self.routers)))
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("global", &self.global.len())
            .field("routers", &self.routers)
            .finish_non_exhaustive()
    }
}

/// What to run for a request once a route matched.
struct RoutePlan {
    router_chain: MiddlewareChain,
    route_chain: MiddlewareChain,
    params: HashMap<String, String>,
    matched: MatchedRoute,
}

fn plan_route(routers: &[Arc<Router>], path: &str, method: &Method) -> Result<Option<RoutePlan>> {
    for router in routers {
        if let Some(resolved) = router.find(path, method)? {
            return Ok(Some(RoutePlan {
                router_chain: resolved.router.chain().clone(),
                route_chain: resolved.route.chain().clone(),
                params: resolved.params(path),
                matched: MatchedRoute {
                    pattern: resolved.route.pattern().to_string(),
                    methods: resolved.route.methods().clone(),
                },
            }));
        }
    }
    Ok(None)
}

/// The continuation of the global chain: resolve, then run the router tier
/// followed by the route tier.
fn route_tier(routers: Arc<Vec<Arc<Router>>>) -> Continuation {
    Box::new(move |mut ctx: RequestContext| -> BoxFuture<RequestContext> {
        let plan = match plan_route(&routers, &ctx.req.path, &ctx.req.method) {
            Ok(Some(plan)) => plan,
            Ok(None) => {
                tracing::trace!(method = %ctx.req.method, path = %ctx.req.path, "no route matched");
                return Box::pin(std::future::ready(ctx));
            }
            Err(err) => {
                tracing::error!(error = %err, "route resolution failed");
                return Box::pin(std::future::ready(ctx));
            }
        };

        tracing::trace!(pattern = %plan.matched.pattern, "route matched");
        let RoutePlan {
            router_chain,
            route_chain,
            params,
            matched,
        } = plan;
        ctx.req.params = params;
        ctx.set_route(matched);

        router_chain.invoke(
            ctx,
            Box::new(move |ctx: RequestContext| route_chain.invoke(ctx, done())),
        )
    })
}
