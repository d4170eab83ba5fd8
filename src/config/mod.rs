//!
//! Configuration structures for the dispatcher and its transport.
//!
//! A configuration can be created in many ways:
//! - From an environment-specific TOML file via `Config::from_rust_env` or `Config::from_toml_file`
//! - From a TOML string via `Config::from_toml` or `str::parse`
//! - Constructed programmatically via the builder methods on `Config`
//!
//! In both TOML-based methods, environment variables can be referenced using the
//! `{{ VAR_NAME }}` syntax and are substituted before parsing.
//!
//! Configuration is split into logical sections, each represented by their own struct:
//!
//! - `HttpConfig` for the transport (bind address, timeouts, panic catching)
//! - `RoutingConfig` for pattern matching options and the marker header
//! - `LoggingConfig` for logging and tracing settings
//! - a free-form `[settings]` table read through [`Config::get`]
//!
mod http;
mod logging;
mod routing;

pub use http::*;
pub use logging::*;
pub use routing::*;

use {
    crate::{Error, Result, utils::replace_handlebars_with_env},
    serde::Deserialize,
    std::{env, fs, str::FromStr, time::Duration},
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub settings: toml::Table,
}

impl Default for Config {
    ///
    /// Creates a default configuration.
    /// This will attempt to load configuration from the file based on the RUST_ENV
    /// environment variable falling back to a default configuration if the variable
    /// is not set or the file cannot be loaded.
    ///
    fn default() -> Self {
        match Self::from_rust_env() {
            Ok(config) => config,
            Err(_) => Config {
                http: HttpConfig::default(),
                routing: RoutingConfig::default(),
                logging: LoggingConfig::default(),
                settings: toml::Table::new(),
            },
        }
    }
}

impl Config {
    ///
    /// Loads the configuration from `config/{RUST_ENV}.toml`.
    ///
    pub fn from_rust_env() -> Result<Config> {
        Self::from_toml_file(env::var("RUST_ENV")?)
    }

    ///
    /// Loads `config/{env}.toml`, substitutes environment variables and parses it.
    ///
    pub fn from_toml_file(env: impl AsRef<str>) -> Result<Config> {
        let path = format!("config/{}.toml", env.as_ref());
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    ///
    /// Parses a configuration string in TOML format into a Config struct.
    ///
    pub fn from_toml(toml_str: &str) -> Result<Config> {
        toml_str.parse()
    }

    /// Reads a value from the `[settings]` table.
    ///
    /// ```rust
    /// use axum_dispatch::Config;
    ///
    /// let config: Config = r#"
    ///     [settings]
    ///     greeting = "hello"
    /// "#.parse().unwrap();
    /// assert_eq!(config.get("greeting").and_then(|v| v.as_str()), Some("hello"));
    /// assert!(config.get("missing").is_none());
    /// ```
    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.settings.get(key)
    }

    /// Sets a value in the `[settings]` table.
    pub fn with_setting(mut self, key: &str, value: impl Into<toml::Value>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Sets the HTTP server bind address of the HttpConfig.
    pub fn with_bind_addr<S: AsRef<str>>(mut self, addr: S) -> Self {
        self.http.bind_addr = addr.as_ref().into();
        self
    }

    /// Sets the HTTP server bind port of the HttpConfig.
    pub fn with_bind_port(mut self, port: u16) -> Self {
        self.http.bind_port = port;
        self
    }

    /// Sets the request timeout enforced by the transport.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.http.request_timeout = Some(timeout);
        self
    }

    /// Sets the graceful shutdown timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.http.shutdown_timeout = timeout;
        self
    }

    /// Enables or disables panic catching in the transport.
    pub fn with_catch_panic(mut self, enable: bool) -> Self {
        self.http.catch_panic = enable;
        self
    }

    /// Enables or disables case-sensitive route matching.
    pub fn with_case_sensitive_routing(mut self, enable: bool) -> Self {
        self.routing.case_sensitive = enable;
        self
    }

    /// Enables or disables strict trailing-slash matching.
    pub fn with_strict_routing(mut self, enable: bool) -> Self {
        self.routing.strict = enable;
        self
    }

    /// Sets the `x-powered-by` value. An empty string disables the header.
    pub fn with_powered_by(mut self, value: impl Into<String>) -> Self {
        self.routing.powered_by = value.into();
        self
    }

    /// Sets the log format of the LoggingConfig.
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.logging.format = format;
        self
    }

    /// Ensures that the configuration is valid.
    pub fn validate(&self) -> Result<()> {
        self.http.validate()?;
        self.routing.validate()?;
        Ok(())
    }

    ///
    /// Sets up the tracing subscriber for logging based on the LoggingConfig.
    ///
    /// NOTE: This should be called early during startup to ensure logging is configured
    ///       before any log messages are emitted.
    ///
    pub fn setup_tracing(&self) {
        use tracing_subscriber::{EnvFilter, prelude::*};
        let env_filter = EnvFilter::from_default_env();
        match self.logging.format {
            LogFormat::Json => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer().json())
                    .with(env_filter)
                    .try_init();
            }
            LogFormat::Default => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer())
                    .with(env_filter)
                    .try_init();
            }
            LogFormat::Compact => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer().compact())
                    .with(env_filter)
                    .try_init();
            }
            LogFormat::Pretty => {
                let _ = tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer().pretty())
                    .with(env_filter)
                    .try_init();
            }
        }
    }
}

///
/// Parses a configuration string with references to environment variables
/// into a Config struct by substituting the environment variables and then
/// parsing the resulting TOML.
///
impl FromStr for Config {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let config_file = replace_handlebars_with_env(s);
        let config = toml::from_str::<Config>(&config_file)?;
        Ok(config)
    }
}
