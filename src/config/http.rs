use {
    crate::{Error, Result},
    serde::Deserialize,
    std::time::Duration,
};

///
/// Configuration for the HTTP transport that feeds requests into the dispatcher.
///
/// None of these values influence route matching or middleware ordering; they
/// only shape the Axum/Tower stack built by `Dispatcher::into_router`.
///
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// IP address to bind the HTTP server to.
    /// The default `bind_addr` is "127.0.0.1".
    #[serde(default = "HttpConfig::default_bind_addr")]
    pub bind_addr: String,

    /// Port to bind the HTTP server to.
    /// The default `bind_port` is 3000.
    #[serde(default = "HttpConfig::default_bind_port")]
    pub bind_port: u16,

    /// Maximum allowed time for a request to complete before the transport
    /// answers with 408 Request Timeout. The dispatcher itself never times
    /// out a chain. By default `request_timeout` is None.
    #[serde(default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,

    /// Time allowed for in-flight requests to drain after a shutdown signal.
    /// The default is 30 seconds.
    #[serde(
        default = "HttpConfig::default_shutdown_timeout",
        with = "humantime_serde"
    )]
    pub shutdown_timeout: Duration,

    /// Whether a panicking handler is turned into a 500 response instead of
    /// tearing down the connection. Enabled by default.
    #[serde(default = "HttpConfig::default_catch_panic")]
    pub catch_panic: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: Self::default_bind_addr(),
            bind_port: Self::default_bind_port(),
            request_timeout: None,
            shutdown_timeout: Self::default_shutdown_timeout(),
            catch_panic: Self::default_catch_panic(),
        }
    }
}

impl HttpConfig {
    pub fn full_bind_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.bind_port)
    }

    fn default_bind_addr() -> String {
        "127.0.0.1".into()
    }

    fn default_bind_port() -> u16 {
        3000
    }

    fn default_shutdown_timeout() -> Duration {
        Duration::from_secs(30)
    }

    fn default_catch_panic() -> bool {
        true
    }

    pub fn validate(&self) -> Result<()> {
        if self.bind_addr.trim().is_empty() {
            return Err(Error::invalid_input(
                "HTTP bind_addr is required. Set [http] bind_addr = \"0.0.0.0\" or \"127.0.0.1\" in config.",
            ));
        }

        if self.bind_addr.parse::<std::net::IpAddr>().is_err() {
            return Err(Error::invalid_input(
                "HTTP bind_addr must be a valid IP address. Examples: \"127.0.0.1\", \"0.0.0.0\", \"::1\"",
            ));
        }

        if self.request_timeout == Some(Duration::ZERO) {
            return Err(Error::invalid_input(
                "HTTP request_timeout must be greater than zero when set.",
            ));
        }

        Ok(())
    }
}
