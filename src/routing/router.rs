use {
    super::{MatchOptions, Methods, Route, join_paths},
    crate::{BoxedMiddleware, Error, MiddlewareChain, Result, middleware::ScopedMiddleware},
    http::Method,
    std::{collections::HashMap, fmt},
};

/// Where and how a router is attached to its parent.
///
/// ```rust
/// use axum_dispatch::MountOptions;
///
/// let options = MountOptions::at("/api");
/// assert_eq!(options.base_route.as_deref(), Some("/api"));
///
/// let options: MountOptions = "/v1".into();
/// assert_eq!(options.base_route.as_deref(), Some("/v1"));
/// ```
#[derive(Clone, Default)]
pub struct MountOptions {
    /// Prefix applied to every route of the mounted router.
    pub base_route: Option<String>,
    /// Handlers run before the mounted router's own middleware.
    pub middleware: Vec<BoxedMiddleware>,
}

impl MountOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(base_route: impl Into<String>) -> Self {
        Self {
            base_route: Some(base_route.into()),
            middleware: Vec::new(),
        }
    }

    pub fn with_base_route(mut self, base_route: impl Into<String>) -> Self {
        self.base_route = Some(base_route.into());
        self
    }

    pub fn with_middleware(mut self, middleware: BoxedMiddleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Rejects a base route that is not an absolute path.
    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(base) = &self.base_route {
            if !base.starts_with('/') {
                return Err(Error::type_mismatch(format!(
                    "base route {base:?} must start with '/'"
                )));
            }
            if base.contains(['?', '#']) {
                return Err(Error::type_mismatch(format!(
                    "base route {base:?} must not contain a query or fragment"
                )));
            }
        }
        Ok(())
    }
}

impl From<&str> for MountOptions {
    fn from(base_route: &str) -> Self {
        Self::at(base_route)
    }
}

impl From<String> for MountOptions {
    fn from(base_route: String) -> Self {
        Self::at(base_route)
    }
}

impl fmt::Debug for MountOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountOptions")
            .field("base_route", &self.base_route)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// The outcome of a successful lookup.
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    /// The first route matching the path and method.
    pub route: &'a Route,
    /// The router that owns `route`.
    pub router: &'a Router,
}

impl Resolved<'_> {
    /// Parameter bindings of the matched route for `path`.
    pub fn params(&self, path: &str) -> HashMap<String, String> {
        self.route.extract_params(path)
    }
}

/// An ordered group of routes with its own middleware and mounted children.
///
/// Routes are tried in declaration order and the first one matching both the
/// path and the method wins. A router must be activated before it resolves
/// anything; mounting it into a [`Dispatcher`](crate::Dispatcher) does that.
///
/// ```rust
/// use axum_dispatch::{MatchOptions, Router, from_fn, RequestContext, Next};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.get("/health", [from_fn(|mut ctx: RequestContext, _next: Next| async move {
///     ctx.res.text("ok");
///     ctx
/// })]).unwrap();
///
/// router.activate(MatchOptions::default()).unwrap();
/// let resolved = router.resolve("/health", &Method::GET).unwrap().unwrap();
/// assert_eq!(resolved.route.pattern(), "/health");
/// ```
#[derive(Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
    middleware: Vec<ScopedMiddleware>,
    children: Vec<Router>,
    base: Option<String>,
    options: MatchOptions,
    chain: MiddlewareChain,
    active: bool,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a route. The pattern is compiled immediately, under the
    /// router's base when it has one.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::Pattern`](crate::ErrorKind::Pattern) error for a
    /// malformed pattern, in which case nothing is added.
    pub fn route<M, I>(&mut self, methods: M, path: &str, middleware: I) -> Result<&mut Self>
    where
        M: Into<Methods>,
        I: IntoIterator<Item = BoxedMiddleware>,
    {
        let path = self.based(path);
        let route = Route::with_options(methods.into(), &path, middleware, self.options)?;
        tracing::debug!(methods = ?route.methods(), pattern = route.pattern(), "route declared");
        self.routes.push(route);
        Ok(self)
    }

    pub fn get<I>(&mut self, path: &str, middleware: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = BoxedMiddleware>,
    {
        self.route(Method::GET, path, middleware)
    }

    pub fn post<I>(&mut self, path: &str, middleware: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = BoxedMiddleware>,
    {
        self.route(Method::POST, path, middleware)
    }

    pub fn put<I>(&mut self, path: &str, middleware: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = BoxedMiddleware>,
    {
        self.route(Method::PUT, path, middleware)
    }

    pub fn patch<I>(&mut self, path: &str, middleware: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = BoxedMiddleware>,
    {
        self.route(Method::PATCH, path, middleware)
    }

    pub fn delete<I>(&mut self, path: &str, middleware: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = BoxedMiddleware>,
    {
        self.route(Method::DELETE, path, middleware)
    }

    /// Declares a route answering to every method.
    pub fn all<I>(&mut self, path: &str, middleware: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = BoxedMiddleware>,
    {
        self.route(Methods::Any, path, middleware)
    }

    /// Appends a router-level handler that runs for every request resolved
    /// by this router or one of its descendants.
    pub fn use_middleware(&mut self, middleware: BoxedMiddleware) -> &mut Self {
        self.middleware.push(ScopedMiddleware::global(middleware));
        self.active = false;
        self
    }

    /// Appends a router-level handler that only runs when the request path
    /// starts with `path`.
    pub fn use_at(&mut self, path: &str, middleware: BoxedMiddleware) -> Result<&mut Self> {
        let path = self.based(path);
        self.middleware
            .push(ScopedMiddleware::at(&path, middleware, self.options)?);
        self.active = false;
        Ok(self)
    }

    /// Mounts `child` under this router.
    ///
    /// The base route, when present, is prefixed to every route of `child`
    /// and its descendants, followed by this router's own base. Handlers from
    /// `options` run before the child's own middleware.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::TypeMismatch`](crate::ErrorKind::TypeMismatch)
    /// error for a malformed base route, or a pattern error when rebasing
    /// fails. Nothing is mounted on error.
    pub fn mount(&mut self, mut child: Router, options: impl Into<MountOptions>) -> Result<&mut Self> {
        child.attach(options.into())?;
        if let Some(base) = &self.base {
            child.rebase(base)?;
        }
        self.children.push(child);
        self.active = false;
        Ok(self)
    }

    /// Applies mount options to a router about to be attached somewhere.
    pub(crate) fn attach(&mut self, options: MountOptions) -> Result<()> {
        options.validate()?;
        if let Some(base) = &options.base_route {
            self.rebase(base)?;
        }
        if !options.middleware.is_empty() {
            let supplied = options.middleware.into_iter().map(ScopedMiddleware::global);
            self.middleware.splice(0..0, supplied);
        }
        Ok(())
    }

    /// Prefixes every route and scoped handler of this router and its
    /// descendants with `base`.
    ///
    /// The router and its descendants must be activated again afterwards.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::Pattern`](crate::ErrorKind::Pattern) error when
    /// a prefixed pattern does not compile. The router is unchanged on error.
    pub fn rebase(&mut self, base: &str) -> Result<()> {
        let mut staged = self.clone();
        staged.rebase_in_place(base)?;
        *self = staged;
        tracing::debug!(base = self.base.as_deref(), "router rebased");
        Ok(())
    }

    fn rebase_in_place(&mut self, base: &str) -> Result<()> {
        for route in &mut self.routes {
            route.rebase(base)?;
        }
        for middleware in &mut self.middleware {
            middleware.rebase(base)?;
        }
        for child in &mut self.children {
            child.rebase_in_place(base)?;
        }
        self.base = Some(join_paths(base, self.base.as_deref().unwrap_or("/")));
        self.active = false;
        Ok(())
    }

    /// `path` under this router's base.
    fn based(&self, path: &str) -> String {
        match &self.base {
            Some(base) => join_paths(base, path),
            None => path.to_string(),
        }
    }

    /// Recompiles every pattern with `options` and builds the router-level
    /// chains. Must be called again after the router is modified.
    pub fn activate(&mut self, options: MatchOptions) -> Result<()> {
        self.activate_under(options, &[])
    }

    fn activate_under(&mut self, options: MatchOptions, inherited: &[BoxedMiddleware]) -> Result<()> {
        self.options = options;
        for route in &mut self.routes {
            route.recompile(options)?;
        }
        for middleware in &mut self.middleware {
            middleware.recompile(options)?;
        }

        let mut effective = inherited.to_vec();
        effective.extend(self.middleware.iter().map(ScopedMiddleware::to_middleware));
        for child in &mut self.children {
            child.activate_under(options, &effective)?;
        }

        self.chain = MiddlewareChain::compile(effective);
        self.active = true;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Finds the first of this router's own routes matching `path` and
    /// `method`. Children are not searched.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::NotActivated`](crate::ErrorKind::NotActivated)
    /// error when the router has not been activated.
    pub fn resolve(&self, path: &str, method: &Method) -> Result<Option<Resolved<'_>>> {
        if !self.active {
            return Err(Error::not_activated(format!(
                "router {} must be activated before resolving {path}",
                self.base.as_deref().unwrap_or("/")
            )));
        }

        Ok(self
            .routes
            .iter()
            .find(|route| route.is_match(path, method))
            .map(|route| Resolved {
                route,
                router: self,
            }))
    }

    /// Like [`resolve`](Self::resolve), then searches mounted children
    /// depth-first in mount order.
    pub fn find(&self, path: &str, method: &Method) -> Result<Option<Resolved<'_>>> {
        if let Some(resolved) = self.resolve(path, method)? {
            return Ok(Some(resolved));
        }
        for child in &self.children {
            if let Some(resolved) = child.find(path, method)? {
                return Ok(Some(resolved));
            }
        }
        Ok(None)
    }

    /// The router-level chain: ancestors' handlers, then mount-supplied
    /// handlers, then this router's own.
    pub fn chain(&self) -> &MiddlewareChain {
        &self.chain
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn children(&self) -> &[Router] {
        &self.children
    }

    /// The accumulated base path, if this router was mounted under one.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("base", &self.base)
            .field("routes", &self.routes)
            .field("middleware", &self.middleware.len())
            .field("children", &self.children)
            .field("active", &self.active)
            .finish()
    }
}
