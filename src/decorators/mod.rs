//! Builders mirroring the route decorators.
//!
//! Each function returns a value that is applied with
//! [`Decorate::method`](crate::Decorate::method) or
//! [`Decorate::class`](crate::Decorate::class). The `#[controller]` macro
//! expands attributes into exactly these calls.

use crate::metadata::{
    HttpMethod, Matcher, MiddlewareSpec, ParamConstraint, ResourceActions, ResourceDescriptor,
    ResourceMiddleware as ResourceMiddlewareEntry, RouteDescriptor, RouteTarget,
};

/// A decorator applied to one controller method.
pub trait MethodDecorator {
    fn apply(self, route: &mut RouteDescriptor);
}

/// A decorator applied to the controller itself.
pub trait ClassDecorator {
    fn apply(self, resource: &mut ResourceDescriptor);
}

#[derive(Clone, Debug)]
#[must_use]
pub struct Route {
    method: HttpMethod,
    pattern: String,
    name: Option<String>,
}

impl Route {
    pub fn new(method: HttpMethod, pattern: impl Into<String>) -> Self {
        Self {
            method,
            pattern: pattern.into(),
            name: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl MethodDecorator for Route {
    fn apply(self, route: &mut RouteDescriptor) {
        route.merge_target(RouteTarget {
            method: self.method,
            pattern: self.pattern,
            name: self.name,
        });
    }
}

pub fn get(pattern: impl Into<String>) -> Route {
    Route::new(HttpMethod::Get, pattern)
}

pub fn post(pattern: impl Into<String>) -> Route {
    Route::new(HttpMethod::Post, pattern)
}

pub fn put(pattern: impl Into<String>) -> Route {
    Route::new(HttpMethod::Put, pattern)
}

pub fn patch(pattern: impl Into<String>) -> Route {
    Route::new(HttpMethod::Patch, pattern)
}

pub fn delete(pattern: impl Into<String>) -> Route {
    Route::new(HttpMethod::Delete, pattern)
}

pub fn any(pattern: impl Into<String>) -> Route {
    Route::new(HttpMethod::Any, pattern)
}

#[derive(Clone, Debug)]
#[must_use]
pub struct Where {
    key: String,
    matcher: Matcher,
}

impl MethodDecorator for Where {
    fn apply(self, route: &mut RouteDescriptor) {
        route.push_constraint(ParamConstraint {
            key: self.key,
            matcher: self.matcher,
        });
    }
}

/// Constrains the route parameter `key`. Repeated keys are all kept.
pub fn where_param(key: impl Into<String>, matcher: impl Into<Matcher>) -> Where {
    Where {
        key: key.into(),
        matcher: matcher.into(),
    }
}

#[derive(Clone, Debug)]
#[must_use]
pub struct RouteMiddleware(MiddlewareSpec);

impl MethodDecorator for RouteMiddleware {
    fn apply(self, route: &mut RouteDescriptor) {
        route.push_middleware(self.0);
    }
}

pub fn route_middleware(middleware: impl Into<MiddlewareSpec>) -> RouteMiddleware {
    RouteMiddleware(middleware.into())
}

#[derive(Clone, Debug)]
#[must_use]
pub struct Resource {
    pattern: String,
    name: Option<String>,
}

impl Resource {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl ClassDecorator for Resource {
    fn apply(self, resource: &mut ResourceDescriptor) {
        resource.declare(self.pattern, self.name);
    }
}

/// Declares the controller as a resource rooted at `pattern`.
pub fn resource(pattern: impl Into<String>) -> Resource {
    Resource {
        pattern: pattern.into(),
        name: None,
    }
}

#[derive(Clone, Debug)]
#[must_use]
pub struct ResourceMiddleware {
    actions: ResourceActions,
    middleware: MiddlewareSpec,
}

impl ClassDecorator for ResourceMiddleware {
    fn apply(self, resource: &mut ResourceDescriptor) {
        resource.push_middleware(ResourceMiddlewareEntry {
            actions: self.actions,
            middleware: self.middleware,
        });
    }
}

/// Applies middleware to some or all of the resource's actions.
pub fn resource_middleware(
    actions: impl Into<ResourceActions>,
    middleware: impl Into<MiddlewareSpec>,
) -> ResourceMiddleware {
    ResourceMiddleware {
        actions: actions.into(),
        middleware: middleware.into(),
    }
}
