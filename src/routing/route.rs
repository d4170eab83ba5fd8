use {
    super::{CompiledMatcher, MatchOptions, join_paths},
    crate::{BoxedMiddleware, Error, MiddlewareChain, Result},
    http::Method,
    std::{collections::HashMap, fmt, str::FromStr},
};

/// The methods a route answers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Methods {
    /// Every method, written `*`.
    Any,
    /// Only the listed methods, compared case-insensitively.
    Only(Vec<Method>),
}

impl Methods {
    pub fn allows(&self, method: &Method) -> bool {
        match self {
            Methods::Any => true,
            Methods::Only(methods) => methods
                .iter()
                .any(|m| m.as_str().eq_ignore_ascii_case(method.as_str())),
        }
    }
}

impl From<Method> for Methods {
    fn from(method: Method) -> Self {
        Methods::Only(vec![method])
    }
}

impl From<Vec<Method>> for Methods {
    fn from(methods: Vec<Method>) -> Self {
        Methods::Only(methods)
    }
}

impl<const N: usize> From<[Method; N]> for Methods {
    fn from(methods: [Method; N]) -> Self {
        Methods::Only(methods.into())
    }
}

///
/// Parses `*` or a comma separated list of method names such as `get, POST`.
/// Names are normalised to upper case.
///
impl FromStr for Methods {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        if s.trim() == "*" {
            return Ok(Methods::Any);
        }

        let methods = s
            .split(',')
            .map(str::trim)
            .map(|name| {
                if name.is_empty() {
                    return Err(Error::invalid_input(format!("empty method name in {s:?}")));
                }
                Method::from_bytes(name.to_ascii_uppercase().as_bytes())
                    .map_err(|_| Error::invalid_input(format!("invalid method name {name:?}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Methods::Only(methods))
    }
}

/// A path pattern and method filter bound to a chain of handlers.
///
/// The pattern is compiled when the route is created, so a malformed pattern
/// is reported at declaration time rather than on the first request.
#[derive(Clone)]
pub struct Route {
    methods: Methods,
    matcher: CompiledMatcher,
    chain: MiddlewareChain,
}

impl Route {
    /// Creates a route compiled with the default [`MatchOptions`].
    ///
    /// ```rust
    /// use axum_dispatch::{Route, Methods};
    /// use http::Method;
    ///
    /// let route = Route::new(Method::GET, "/users/:id", []).unwrap();
    /// assert!(route.is_match("/users/7", &Method::GET));
    /// assert!(!route.is_match("/users/7", &Method::POST));
    /// assert_eq!(route.extract_params("/users/7")["id"], "7");
    /// ```
    pub fn new<M, I>(methods: M, path: &str, middleware: I) -> Result<Self>
    where
        M: Into<Methods>,
        I: IntoIterator<Item = BoxedMiddleware>,
    {
        Self::with_options(methods.into(), path, middleware, MatchOptions::default())
    }

    pub(crate) fn with_options<I>(
        methods: Methods,
        path: &str,
        middleware: I,
        options: MatchOptions,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = BoxedMiddleware>,
    {
        Ok(Self {
            methods,
            matcher: CompiledMatcher::compile(path, options)?,
            chain: MiddlewareChain::compile(middleware),
        })
    }

    /// True when both the path and the method match.
    pub fn is_match(&self, path: &str, method: &Method) -> bool {
        self.methods.allows(method) && self.matcher.test(path)
    }

    /// True when the path matches, whatever the method.
    pub fn match_path(&self, path: &str) -> bool {
        self.matcher.test(path)
    }

    /// Parameter bindings for `path`, empty when the path does not match.
    pub fn extract_params(&self, path: &str) -> HashMap<String, String> {
        self.matcher.exec(path).unwrap_or_default()
    }

    /// Prefixes the pattern with `base` and recompiles it.
    ///
    /// Rebasing twice compounds the prefix. On error the route is unchanged.
    pub fn rebase(&mut self, base: &str) -> Result<()> {
        let pattern = join_paths(base, self.matcher.pattern());
        self.matcher = CompiledMatcher::compile(&pattern, self.matcher.options())?;
        Ok(())
    }

    pub(crate) fn recompile(&mut self, options: MatchOptions) -> Result<()> {
        if self.matcher.options() != options {
            self.matcher = CompiledMatcher::compile(self.matcher.pattern(), options)?;
        }
        Ok(())
    }

    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }

    pub fn methods(&self) -> &Methods {
        &self.methods
    }

    pub fn param_names(&self) -> &[String] {
        self.matcher.keys()
    }

    /// The route's own handlers.
    pub fn chain(&self) -> &MiddlewareChain {
        &self.chain
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("methods", &self.methods)
            .field("pattern", &self.matcher.pattern())
            .field("handlers", &self.chain.len())
            .finish()
    }
}
