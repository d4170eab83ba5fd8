use {
    crate::{Error, MatchOptions, Result},
    http::HeaderValue,
    serde::Deserialize,
};

///
/// Configuration for route matching and the response marker header.
///
/// Path patterns are compiled with the options derived from this section when
/// a router is mounted into the dispatcher.
///
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    /// `/Users` and `/users` are different paths when enabled.
    #[serde(default)]
    pub case_sensitive: bool,

    /// A trailing slash is significant when enabled (`/users/` differs from `/users`).
    #[serde(default)]
    pub strict: bool,

    /// Value of the `x-powered-by` header added to every response.
    /// Defaults to the crate name. An empty string disables the header.
    #[serde(default = "RoutingConfig::default_powered_by")]
    pub powered_by: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            strict: false,
            powered_by: Self::default_powered_by(),
        }
    }
}

impl RoutingConfig {
    fn default_powered_by() -> String {
        env!("CARGO_PKG_NAME").into()
    }

    /// Options used to compile route patterns.
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            sensitive: self.case_sensitive,
            strict: self.strict,
            end: true,
        }
    }

    /// The marker header value, or `None` when disabled.
    pub fn powered_by_header(&self) -> Option<HeaderValue> {
        if self.powered_by.is_empty() {
            None
        } else {
            HeaderValue::from_str(&self.powered_by).ok()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.powered_by.is_empty() && HeaderValue::from_str(&self.powered_by).is_err() {
            return Err(Error::config(format!(
                "[routing] powered_by = {:?} is not a valid header value",
                self.powered_by
            )));
        }
        Ok(())
    }
}
