use {
    super::{BoxFuture, BoxedMiddleware, Middleware, Next},
    crate::{CompiledMatcher, MatchOptions, RequestContext, Result},
};

/// A router-level middleware, optionally restricted to a path prefix.
///
/// Unscoped entries run for every request that reaches their router. Scoped
/// entries only run when the request path starts with their prefix, and the
/// prefix follows the router when it is mounted under a base path.
#[derive(Clone)]
pub(crate) struct ScopedMiddleware {
    scope: Option<CompiledMatcher>,
    handler: BoxedMiddleware,
}

impl ScopedMiddleware {
    pub(crate) fn global(handler: BoxedMiddleware) -> Self {
        Self {
            scope: None,
            handler,
        }
    }

    pub(crate) fn at(path: &str, handler: BoxedMiddleware, options: MatchOptions) -> Result<Self> {
        Ok(Self {
            scope: Some(CompiledMatcher::compile(path, options.prefix())?),
            handler,
        })
    }

    pub(crate) fn rebase(&mut self, base: &str) -> Result<()> {
        if let Some(scope) = &self.scope {
            let pattern = crate::routing::join_paths(base, scope.pattern());
            self.scope = Some(CompiledMatcher::compile(&pattern, scope.options())?);
        }
        Ok(())
    }

    pub(crate) fn recompile(&mut self, options: MatchOptions) -> Result<()> {
        if let Some(scope) = &self.scope {
            self.scope = Some(CompiledMatcher::compile(scope.pattern(), options.prefix())?);
        }
        Ok(())
    }

    /// The handler to place in a compiled chain.
    pub(crate) fn to_middleware(&self) -> BoxedMiddleware {
        match &self.scope {
            None => self.handler.clone(),
            Some(scope) => std::sync::Arc::new(PathScoped {
                scope: scope.clone(),
                inner: self.handler.clone(),
            }),
        }
    }
}

struct PathScoped {
    scope: CompiledMatcher,
    inner: BoxedMiddleware,
}

impl Middleware for PathScoped {
    fn call(&self, ctx: RequestContext, next: Next) -> BoxFuture<RequestContext> {
        if self.scope.test(&ctx.req.path) {
            self.inner.call(ctx, next)
        } else {
            next.run(ctx)
        }
    }
}
