//!
//! Utility functions shared by the configuration and transport layers.
//!
//! This module provides:
//! - [`replace_handlebars_with_env`] - Template substitution for environment variables
//! - [`RequestIdGenerator`] - Generates or preserves request IDs for request correlation
//!

use {
    http::{HeaderValue, Request},
    regex::{Captures, Regex},
    std::{env, sync::LazyLock},
    tower_http::request_id::{MakeRequestId, RequestId},
    uuid::{ContextV7, Timestamp, Uuid},
};

/// Matches `{{ VAR_NAME }}` with optional whitespace around an upper-case variable name.
static HANDLEBAR_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Z0-9_]+)\s*\}\}").unwrap());

/// Replaces handlebars-style placeholders with environment variable values.
///
/// Searches the input for patterns like `{{ VAR_NAME }}` and replaces them with
/// the corresponding environment variable. Missing variables become empty strings
/// and a warning is logged.
///
/// ```
/// use axum_dispatch::replace_handlebars_with_env;
///
/// let template = "Value: {{ AXUM_DISPATCH_SURELY_MISSING }}";
/// assert_eq!(replace_handlebars_with_env(template), "Value: ");
/// ```
pub fn replace_handlebars_with_env(input: &str) -> String {
    HANDLEBAR_REGEXP
        .replace_all(input, |caps: &Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| {
                tracing::warn!(
                    variable = %var_name,
                    "Environment variable not found, substituting with empty string"
                );
                String::new()
            })
        })
        .to_string()
}

/// Request ID generator used by the transport layer.
///
/// Preserves an incoming `x-request-id` header, otherwise generates a UUIDv7 so
/// that ids sort by creation time.
#[derive(Debug, Clone, Copy)]
pub struct RequestIdGenerator;

impl MakeRequestId for RequestIdGenerator {
    fn make_request_id<B>(&mut self, req: &Request<B>) -> Option<RequestId> {
        match req.headers().get("x-request-id") {
            Some(value) => Some(RequestId::new(value.clone())),
            None => {
                let cx = ContextV7::new().with_additional_precision();
                let uuid = Uuid::new_v7(Timestamp::now(cx));
                let value = HeaderValue::from_str(&uuid.to_string()).ok()?;
                Some(RequestId::new(value))
            }
        }
    }
}
