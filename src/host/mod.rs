//! The host router seam.
//!
//! Discovery never matches requests itself. It replays descriptors through
//! [`HostRouter`], whose implementations own the real routing:
//!
//! - [`table::RouteTable`] records every call, for listings and tests
//! - [`axum::AxumRouter`] turns the calls into an `axum::Router`

pub mod axum;
pub mod table;

use crate::metadata::{ControllerId, HttpMethod, Matcher, MiddlewareSpec, ResourceActions};
use std::fmt;
use thiserror::Error;

pub type HostResult<T> = std::result::Result<T, HostError>;

/// Errors raised by a host router while routes are being registered.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid matcher for param `{key}`: {source}")]
    InvalidMatcher {
        key: String,
        #[source]
        source: regex::Error,
    },

    #[error("Duplicate route name: {0}")]
    DuplicateName(String),

    #[error("Route already registered: {method} {pattern}")]
    Conflict { method: HttpMethod, pattern: String },

    #[error("Controller not attached to the router: {0}")]
    UnknownController(&'static str),

    #[error("Controller has no handler for {0}")]
    UnknownHandler(String),

    #[error("Middleware not registered: {0}")]
    UnknownMiddleware(String),

    #[error(transparent)]
    Custom(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HostError {
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }
}

/// Controller method a route dispatches to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HandlerRef {
    pub controller: ControllerId,
    pub method: String,
}

impl HandlerRef {
    pub fn new(controller: ControllerId, method: impl Into<String>) -> Self {
        Self {
            controller,
            method: method.into(),
        }
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.controller, self.method)
    }
}

/// Router capability the registration step replays descriptors into.
pub trait HostRouter {
    fn route(
        &mut self,
        pattern: &str,
        methods: &[HttpMethod],
        handler: HandlerRef,
    ) -> HostResult<Box<dyn RouteHandle + '_>>;

    fn resource(
        &mut self,
        pattern: &str,
        controller: ControllerId,
    ) -> HostResult<Box<dyn ResourceHandle + '_>>;
}

/// A freshly created route.
pub trait RouteHandle {
    fn name(&mut self, name: &str) -> HostResult<()>;

    fn constrain(&mut self, key: &str, matcher: &Matcher) -> HostResult<()>;

    fn use_middleware(&mut self, middleware: &MiddlewareSpec) -> HostResult<()>;
}

/// A freshly created resource.
pub trait ResourceHandle {
    fn name(&mut self, name: &str) -> HostResult<()>;

    fn middleware(
        &mut self,
        actions: &ResourceActions,
        middleware: &MiddlewareSpec,
    ) -> HostResult<()>;
}
