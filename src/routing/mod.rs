//! Path patterns, routes and routers.
//!
//! - [`CompiledMatcher`] turns a pattern into a matcher and extracts parameters
//! - [`Route`] pairs a matcher with a method filter and a middleware chain
//! - [`Router`] groups routes, router-level middleware and mounted children

mod path;
mod route;
mod router;

pub use {
    path::{CompiledMatcher, MatchOptions},
    route::{Methods, Route},
    router::{MountOptions, Resolved, Router},
};

/// Prefixes `path` with `base`.
///
/// A trailing slash on `base` is dropped so that `/v1/` and `/v1` compose the
/// same way; a root `path` yields the base itself.
pub(crate) fn join_paths(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    match path {
        "" | "/" if !base.is_empty() => base.to_string(),
        "*" => format!("{base}/*"),
        _ => format!("{base}{path}"),
    }
}
