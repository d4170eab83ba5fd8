//! # axum-dispatch
//!
//! An Express-style request dispatch core on top of Axum: path patterns with
//! named parameters, nestable routers, and three tiers of middleware that pass
//! control with explicit continuations.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use axum_dispatch::{Config, Dispatcher, Next, RequestContext, Result, Router, from_fn};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::default(); // Loads from config/{RUST_ENV}.toml
//!     config.setup_tracing();
//!
//!     let mut api = Router::new();
//!     api.get("/hello/:name", [from_fn(|mut ctx: RequestContext, _next: Next| async move {
//!         let name = ctx.req.param("name").unwrap_or("world").to_string();
//!         ctx.res.text(format!("Hello, {name}!"));
//!         ctx
//!     })])?;
//!
//!     let mut dispatcher = Dispatcher::new(config)?;
//!     dispatcher.use_middleware(from_fn(|ctx: RequestContext, next: Next| async move {
//!         tracing::info!(path = %ctx.req.path, "incoming");
//!         next.run(ctx).await
//!     }));
//!     dispatcher.mount(api, "/api")?;
//!     dispatcher.start().await
//! }
//! ```
//!
//! With `config/dev.toml`:
//! ```toml
//! [http]
//! bind_port = 3000
//! request_timeout = "30s"
//!
//! [routing]
//! case_sensitive = false
//! strict = false
//!
//! [settings]
//! greeting = "hello"
//! ```
//!
//! # Request flow
//!
//! ```text
//! request ─► global chain ─► resolve route ─► router chain ─► route chain
//!                 │                │
//!                 │ short-circuit  │ no match
//!                 ▼                ▼
//!              response           404
//! ```
//!
//! Every handler receives the [`RequestContext`] and a [`Next`] continuation.
//! Calling `next.run(ctx).await` continues; returning without it ends the
//! request. Handlers run strictly in declaration order within each tier.

mod config;
mod context;
mod dispatcher;
mod error;
mod middleware;
mod routing;
mod utils;

pub use config::*;
pub use context::*;
pub use dispatcher::*;
pub use error::*;
pub use middleware::{
    BoxFuture, BoxedMiddleware, Continuation, Middleware, MiddlewareChain, Next, done, from_fn,
};
pub use routing::*;
pub use utils::*;

pub type Result<T> = std::result::Result<T, Error>;
