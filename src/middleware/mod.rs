//! Middleware chains with explicit continuations.
//!
//! A handler receives the request context by value together with a [`Next`]
//! continuation. Calling `next.run(ctx).await` hands the context to the rest
//! of the chain and returns it once everything behind this handler finished;
//! returning without calling `next` ends the request right there.
//!
//! ```rust
//! use axum_dispatch::{RequestContext, Next, from_fn};
//!
//! let auth = from_fn(|mut ctx: RequestContext, next: Next| async move {
//!     if ctx.req.header("authorization").is_none() {
//!         ctx.res.status(http::StatusCode::UNAUTHORIZED).text("unauthorized");
//!         return ctx;
//!     }
//!     next.run(ctx).await
//! });
//! ```
//!
//! `Next` is consumed by `run`, so a handler cannot resume its chain twice:
//!
//! ```rust,compile_fail
//! use axum_dispatch::{RequestContext, Next, from_fn};
//!
//! let twice = from_fn(|ctx: RequestContext, next: Next| async move {
//!     let ctx = next.run(ctx).await;
//!     next.run(ctx).await
//! });
//! ```

mod scoped;

pub(crate) use scoped::ScopedMiddleware;

use {
    crate::RequestContext,
    std::{fmt, future::Future, pin::Pin, sync::Arc},
};

/// A boxed, sendable future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// The continuation run after the last handler of a chain calls `next`.
pub type Continuation = Box<dyn FnOnce(RequestContext) -> BoxFuture<RequestContext> + Send>;

/// A shared, type-erased middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// A request handler that may pass control to the rest of its chain.
///
/// Implemented for every `Fn(RequestContext, Next) -> impl Future<Output = RequestContext>`
/// closure; use [`from_fn`] to box one.
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, ctx: RequestContext, next: Next) -> BoxFuture<RequestContext>;
}

impl<F, Fut> Middleware for F
where
    F: Fn(RequestContext, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RequestContext> + Send + 'static,
{
    fn call(&self, ctx: RequestContext, next: Next) -> BoxFuture<RequestContext> {
        Box::pin(self(ctx, next))
    }
}

/// Boxes a closure as a middleware.
pub fn from_fn<F, Fut>(f: F) -> BoxedMiddleware
where
    F: Fn(RequestContext, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RequestContext> + Send + 'static,
{
    Arc::new(f)
}

/// A continuation that completes immediately with the context it receives.
pub fn done() -> Continuation {
    Box::new(|ctx: RequestContext| -> BoxFuture<RequestContext> {
        Box::pin(std::future::ready(ctx))
    })
}

/// The remainder of a chain, handed to each handler.
pub struct Next {
    handlers: Arc<[BoxedMiddleware]>,
    index: usize,
    on_complete: Continuation,
}

impl Next {
    /// Runs the next handler, or the chain's completion continuation when
    /// this was the last one.
    pub fn run(self, ctx: RequestContext) -> BoxFuture<RequestContext> {
        let Next {
            handlers,
            index,
            on_complete,
        } = self;

        match handlers.get(index).cloned() {
            Some(handler) => handler.call(
                ctx,
                Next {
                    handlers,
                    index: index + 1,
                    on_complete,
                },
            ),
            None => on_complete(ctx),
        }
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field("remaining", &(self.handlers.len() - self.index))
            .finish()
    }
}

/// An ordered, immutable list of handlers compiled into one invocable unit.
///
/// Compiling does not run anything. Chains are cheap to clone and hold no
/// per-request state, so one chain serves any number of concurrent requests.
#[derive(Clone)]
pub struct MiddlewareChain {
    handlers: Arc<[BoxedMiddleware]>,
}

impl MiddlewareChain {
    pub fn compile<I>(list: I) -> Self
    where
        I: IntoIterator<Item = BoxedMiddleware>,
    {
        Self {
            handlers: list.into_iter().collect(),
        }
    }

    /// Starts the chain. `on_complete` runs when the last handler calls its
    /// continuation, and never if any handler short-circuits.
    pub fn invoke(&self, ctx: RequestContext, on_complete: Continuation) -> BoxFuture<RequestContext> {
        Next {
            handlers: Arc::clone(&self.handlers),
            index: 0,
            on_complete,
        }
        .run(ctx)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::compile(Vec::new())
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("len", &self.handlers.len())
            .finish()
    }
}
