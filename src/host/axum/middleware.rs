use crate::host::{HostError, HostResult};
use crate::metadata::{Matcher, MiddlewareRef, MiddlewareSpec};
use ::axum::extract::{RawPathParams, Request};
use ::axum::http::StatusCode;
use ::axum::middleware::{Next, from_fn};
use ::axum::response::{IntoResponse, Response};
use ::axum::routing::MethodRouter;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type BoxResponseFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// A `from_fn` style middleware usable from route decorators.
///
/// # Example
/// ```
/// use girouette::host::axum::AxumMiddleware;
/// use axum::{extract::Request, middleware::Next};
///
/// let audit = AxumMiddleware::new(|request: Request, next: Next| async move {
///     tracing::info!(uri = %request.uri(), "audit");
///     next.run(request).await
/// });
/// ```
#[derive(Clone)]
pub struct AxumMiddleware(Arc<dyn Fn(Request, Next) -> BoxResponseFuture + Send + Sync>);

impl AxumMiddleware {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self(Arc::new(move |request, next| Box::pin(f(request, next))))
    }

    /// Wraps this middleware as an opaque reference for `route_middleware`
    /// and `resource_middleware`.
    pub fn into_ref(self) -> MiddlewareRef {
        MiddlewareRef::handle(self)
    }
}

/// Shorthand for `AxumMiddleware::new(f).into_ref()`.
pub fn middleware<F, Fut>(f: F) -> MiddlewareRef
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    AxumMiddleware::new(f).into_ref()
}

/// Arguments attached to a named middleware, available to it as a request
/// extension.
#[derive(Clone, Debug, PartialEq)]
pub struct MiddlewareArgs(pub Value);

#[derive(Clone)]
pub(crate) struct ResolvedMiddleware {
    middleware: AxumMiddleware,
    args: Option<Value>,
}

pub(crate) fn resolve(
    kernel: &HashMap<String, AxumMiddleware>,
    spec: &MiddlewareSpec,
) -> HostResult<Vec<ResolvedMiddleware>> {
    spec.iter()
        .map(|reference| match reference {
            MiddlewareRef::Named(named) => kernel
                .get(&named.name)
                .map(|middleware| ResolvedMiddleware {
                    middleware: middleware.clone(),
                    args: named.args.clone(),
                })
                .ok_or_else(|| HostError::UnknownMiddleware(named.name.clone())),
            MiddlewareRef::Handle(handle) => handle
                .downcast_ref::<AxumMiddleware>()
                .map(|middleware| ResolvedMiddleware {
                    middleware: middleware.clone(),
                    args: None,
                })
                .ok_or_else(|| HostError::UnknownMiddleware(handle.type_name().to_owned())),
        })
        .collect()
}

#[derive(Clone)]
pub(crate) enum CompiledMatcher {
    Regex(Regex),
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl CompiledMatcher {
    pub(crate) fn compile(key: &str, matcher: &Matcher) -> HostResult<Self> {
        match matcher {
            Matcher::Literal(source) => Regex::new(source)
                .map(CompiledMatcher::Regex)
                .map_err(|source| HostError::InvalidMatcher {
                    key: key.to_owned(),
                    source,
                }),
            Matcher::Regex(regex) => Ok(CompiledMatcher::Regex(regex.clone())),
            Matcher::Predicate(predicate) => Ok(CompiledMatcher::Predicate(predicate.clone())),
        }
    }

    fn matches(&self, value: &str) -> bool {
        match self {
            CompiledMatcher::Regex(regex) => regex.is_match(value),
            CompiledMatcher::Predicate(predicate) => predicate(value),
        }
    }
}

/// Wraps `router` so middleware runs in the given order, then constraints
/// are checked ahead of all of it. Any failed constraint answers 404.
pub(crate) fn apply_layers(
    mut router: MethodRouter,
    constraints: &[(String, CompiledMatcher)],
    middleware: &[ResolvedMiddleware],
) -> MethodRouter {
    for resolved in middleware.iter().rev() {
        let resolved = resolved.clone();
        router = router.route_layer(from_fn(move |mut request: Request, next: Next| {
            let resolved = resolved.clone();
            async move {
                if let Some(args) = resolved.args {
                    request.extensions_mut().insert(MiddlewareArgs(args));
                }
                (resolved.middleware.0)(request, next).await
            }
        }));
    }

    if constraints.is_empty() {
        return router;
    }

    let constraints: Arc<Vec<(String, CompiledMatcher)>> = Arc::new(constraints.to_vec());
    router.route_layer(from_fn(
        move |params: Result<RawPathParams, ::axum::extract::rejection::RawPathParamsRejection>,
              request: Request,
              next: Next| {
            let constraints = constraints.clone();
            async move {
                if let Ok(params) = params {
                    for (key, matcher) in constraints.iter() {
                        let rejected = params
                            .iter()
                            .any(|(name, value)| name == key.as_str() && !matcher.matches(value));
                        if rejected {
                            tracing::trace!(param = %key, "Route constraint rejected request");
                            return StatusCode::NOT_FOUND.into_response();
                        }
                    }
                }
                next.run(request).await
            }
        },
    ))
}
