//! Host router backed by axum.
//!
//! Routes are staged while discovery replays descriptors and only turned
//! into an [`axum::Router`](::axum::Router) by [`AxumRouter::into_router`],
//! so names, constraints and middleware can still be attached after a route
//! is created. Every rejection happens during registration; building the
//! final router cannot fail.

mod endpoint;
mod middleware;
mod pattern;

pub use endpoint::{Endpoint, Endpoints, endpoint};
pub use middleware::{AxumMiddleware, MiddlewareArgs, middleware};

use self::middleware::{CompiledMatcher, ResolvedMiddleware, apply_layers, resolve};
use self::pattern::{shape, to_axum_path};
use super::{HandlerRef, HostError, HostResult, HostRouter, ResourceHandle, RouteHandle};
use crate::metadata::{
    ControllerId, HttpMethod, Matcher, MiddlewareSpec, ResourceAction, ResourceActions,
};
use ::axum::Router;
use ::axum::routing::{MethodFilter, MethodRouter, on_service};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::ops::Range;
use std::sync::Arc;
use strum::IntoEnumIterator;

struct StagedRoute {
    pattern: String,
    path: String,
    methods: Vec<HttpMethod>,
    handler: HandlerRef,
    endpoint: Endpoint,
    name: Option<String>,
    action: Option<ResourceAction>,
    constraints: Vec<(String, CompiledMatcher)>,
    middleware: Vec<ResolvedMiddleware>,
}

impl StagedRoute {
    fn into_method_router(self) -> MethodRouter {
        // `any_service` would install a fallback, which rejects route layers.
        let filter = self
            .methods
            .iter()
            .map(|method| method_filter(*method))
            .reduce(MethodFilter::or)
            .unwrap_or(MethodFilter::GET);
        apply_layers(on_service(filter, self.endpoint), &self.constraints, &self.middleware)
    }
}

fn method_filter(method: HttpMethod) -> MethodFilter {
    match method {
        HttpMethod::Get => MethodFilter::GET,
        HttpMethod::Post => MethodFilter::POST,
        HttpMethod::Put => MethodFilter::PUT,
        HttpMethod::Patch => MethodFilter::PATCH,
        HttpMethod::Delete => MethodFilter::DELETE,
        HttpMethod::Any => [
            MethodFilter::HEAD,
            MethodFilter::POST,
            MethodFilter::PUT,
            MethodFilter::PATCH,
            MethodFilter::DELETE,
            MethodFilter::OPTIONS,
            MethodFilter::TRACE,
            MethodFilter::CONNECT,
        ]
        .into_iter()
        .fold(MethodFilter::GET, MethodFilter::or),
    }
}

/// Resource routes whose default names wait for an explicit name.
struct PendingResource {
    routes: Range<usize>,
    prefix: String,
}

/// Builds an `axum::Router` from replayed route descriptors.
///
/// # Example
/// ```rust,ignore
/// let mut router = AxumRouter::new()
///     .controller(Arc::new(UsersController::new(service)))
///     .middleware("auth", |request, next| async move { next.run(request).await });
///
/// RouterProvider::default().start(&mut router)?;
/// let app: axum::Router = router.into_router();
/// ```
#[derive(Default)]
pub struct AxumRouter {
    controllers: HashMap<ControllerId, Arc<dyn Endpoints>>,
    kernel: HashMap<String, AxumMiddleware>,
    routes: Vec<StagedRoute>,
    names: HashSet<String>,
    pending: Option<PendingResource>,
}

impl AxumRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `controller`'s handlers available to routes that reference it.
    pub fn controller<C: Endpoints>(mut self, controller: Arc<C>) -> Self {
        self.controllers.insert(ControllerId::of::<C>(), controller);
        self
    }

    /// Registers a named middleware, referenced from decorators by name.
    pub fn middleware<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(::axum::extract::Request, ::axum::middleware::Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ::axum::response::Response> + Send + 'static,
    {
        self.kernel.insert(name.into(), AxumMiddleware::new(f));
        self
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Names of all staged routes, generated resource routes included.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = (0..self.routes.len())
            .filter_map(|index| self.name_at(index))
            .collect();
        names.sort();
        names
    }

    /// Pattern of the route registered under `name`.
    pub fn pattern_of(&self, name: &str) -> Option<&str> {
        (0..self.routes.len())
            .find(|index| self.name_at(*index).as_deref() == Some(name))
            .map(|index| self.routes[index].pattern.as_str())
    }

    /// Explicit name of a route, or the default it will get from its resource.
    fn name_at(&self, index: usize) -> Option<String> {
        let route = &self.routes[index];
        if let Some(name) = &route.name {
            return Some(name.clone());
        }
        let pending = self.pending.as_ref()?;
        let action = route.action?;
        pending
            .routes
            .contains(&index)
            .then(|| format!("{}.{action}", pending.prefix))
    }

    /// Gives the last resource its default names unless it was named
    /// explicitly. All or none of the names are assigned.
    fn settle_pending(&mut self) -> HostResult<()> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        let mut assigned = Vec::new();
        for index in pending.routes {
            let route = &self.routes[index];
            if let (None, Some(action)) = (&route.name, route.action) {
                let name = format!("{}.{action}", pending.prefix);
                if self.names.contains(&name) {
                    return Err(HostError::DuplicateName(name));
                }
                assigned.push((index, name));
            }
        }
        for (index, name) in assigned {
            self.names.insert(name.clone());
            self.routes[index].name = Some(name);
        }
        Ok(())
    }

    /// Builds the router. A default resource name that is already taken is
    /// left off with a warning.
    pub fn into_router(mut self) -> Router {
        if let Err(err) = self.settle_pending() {
            tracing::warn!("Leaving resource routes unnamed: {}", err);
        }
        let mut router = Router::new();
        for route in self.routes {
            tracing::debug!(
                "Mounting {} {} -> {}",
                route
                    .methods
                    .iter()
                    .map(AsRef::as_ref)
                    .collect::<Vec<&str>>()
                    .join("|"),
                route.path,
                route.handler
            );
            let path = route.path.clone();
            router = router.route(&path, route.into_method_router());
        }
        router
    }

    fn attached(&self, controller: ControllerId) -> HostResult<Arc<dyn Endpoints>> {
        self.controllers
            .get(&controller)
            .cloned()
            .ok_or(HostError::UnknownController(controller.name()))
    }

    fn resolve_endpoint(&self, handler: &HandlerRef) -> HostResult<Endpoint> {
        self.attached(handler.controller)?
            .endpoint(&handler.method)
            .ok_or_else(|| HostError::UnknownHandler(handler.to_string()))
    }

    fn check_conflicts(
        &self,
        staged: &[StagedRoute],
        path: &str,
        methods: &[HttpMethod],
    ) -> HostResult<()> {
        let path_shape = shape(path);
        for existing in self.routes.iter().chain(staged) {
            if shape(&existing.path) != path_shape {
                continue;
            }
            if existing.path != path {
                return Err(HostError::invalid_pattern(
                    path,
                    format!("conflicts with `{}`", existing.path),
                ));
            }
            let overlap = methods.iter().find(|method| {
                **method == HttpMethod::Any
                    || existing.methods.contains(&HttpMethod::Any)
                    || existing.methods.contains(method)
            });
            if let Some(method) = overlap {
                return Err(HostError::Conflict {
                    method: *method,
                    pattern: existing.pattern.clone(),
                });
            }
        }
        Ok(())
    }

    /// Checks `pattern` against committed routes and the not yet committed
    /// `staged` ones.
    fn stage(
        &self,
        staged: &[StagedRoute],
        pattern: &str,
        methods: &[HttpMethod],
        handler: HandlerRef,
        endpoint: Endpoint,
    ) -> HostResult<StagedRoute> {
        let path = to_axum_path(pattern)?;
        self.check_conflicts(staged, &path, methods)?;
        Ok(StagedRoute {
            pattern: pattern.to_owned(),
            path,
            methods: methods.to_vec(),
            handler,
            endpoint,
            name: None,
            action: None,
            constraints: Vec::new(),
            middleware: Vec::new(),
        })
    }
}

/// Methods and path suffix of the route a resource action expands to.
fn resource_routes(action: ResourceAction) -> (&'static [HttpMethod], &'static str) {
    match action {
        ResourceAction::Index => (&[HttpMethod::Get], ""),
        ResourceAction::Create => (&[HttpMethod::Get], "/create"),
        ResourceAction::Store => (&[HttpMethod::Post], ""),
        ResourceAction::Show => (&[HttpMethod::Get], "/:id"),
        ResourceAction::Edit => (&[HttpMethod::Get], "/:id/edit"),
        ResourceAction::Update => (&[HttpMethod::Put, HttpMethod::Patch], "/:id"),
        ResourceAction::Destroy => (&[HttpMethod::Delete], "/:id"),
    }
}

/// `/blog/posts` -> `blog.posts`; parameter segments are skipped.
fn default_resource_name(pattern: &str) -> String {
    pattern
        .split('/')
        .filter(|segment| !segment.is_empty() && !segment.starts_with(':'))
        .collect::<Vec<_>>()
        .join(".")
}

fn set_name(names: &mut HashSet<String>, slot: &mut Option<String>, name: String) -> HostResult<()> {
    if slot.as_deref() == Some(name.as_str()) {
        return Ok(());
    }
    if names.contains(&name) {
        return Err(HostError::DuplicateName(name));
    }
    if let Some(previous) = slot.take() {
        names.remove(&previous);
    }
    names.insert(name.clone());
    *slot = Some(name);
    Ok(())
}

impl HostRouter for AxumRouter {
    fn route(
        &mut self,
        pattern: &str,
        methods: &[HttpMethod],
        handler: HandlerRef,
    ) -> HostResult<Box<dyn RouteHandle + '_>> {
        self.settle_pending()?;
        let endpoint = self.resolve_endpoint(&handler)?;
        let staged = self.stage(&[], pattern, methods, handler, endpoint)?;
        self.routes.push(staged);
        let index = self.routes.len() - 1;
        Ok(Box::new(AxumRoute {
            route: &mut self.routes[index],
            names: &mut self.names,
            kernel: &self.kernel,
        }))
    }

    fn resource(
        &mut self,
        pattern: &str,
        controller: ControllerId,
    ) -> HostResult<Box<dyn ResourceHandle + '_>> {
        self.settle_pending()?;
        let endpoints = self.attached(controller)?;
        let base = pattern.trim_end_matches('/');

        let mut staged = Vec::new();
        for action in ResourceAction::iter() {
            let Some(endpoint) = Arc::clone(&endpoints).endpoint(action.as_ref()) else {
                tracing::trace!("Resource {} has no {} handler", pattern, action);
                continue;
            };
            let handler = HandlerRef::new(controller, action.as_ref());
            let (methods, suffix) = resource_routes(action);
            let mut route =
                self.stage(&staged, &format!("{base}{suffix}"), methods, handler, endpoint)?;
            route.action = Some(action);
            staged.push(route);
        }

        let start = self.routes.len();
        self.routes.extend(staged);
        self.pending = Some(PendingResource {
            routes: start..self.routes.len(),
            prefix: default_resource_name(pattern),
        });

        Ok(Box::new(AxumResource {
            prefix: None,
            routes: &mut self.routes[start..],
            names: &mut self.names,
            pending: &mut self.pending,
            kernel: &self.kernel,
        }))
    }
}

struct AxumRoute<'a> {
    route: &'a mut StagedRoute,
    names: &'a mut HashSet<String>,
    kernel: &'a HashMap<String, AxumMiddleware>,
}

impl RouteHandle for AxumRoute<'_> {
    fn name(&mut self, name: &str) -> HostResult<()> {
        set_name(self.names, &mut self.route.name, name.to_owned())
    }

    fn constrain(&mut self, key: &str, matcher: &Matcher) -> HostResult<()> {
        let compiled = CompiledMatcher::compile(key, matcher)?;
        self.route.constraints.push((key.to_owned(), compiled));
        Ok(())
    }

    fn use_middleware(&mut self, middleware: &MiddlewareSpec) -> HostResult<()> {
        let resolved = resolve(self.kernel, middleware)?;
        self.route.middleware.extend(resolved);
        Ok(())
    }
}

struct AxumResource<'a> {
    prefix: Option<String>,
    routes: &'a mut [StagedRoute],
    names: &'a mut HashSet<String>,
    pending: &'a mut Option<PendingResource>,
    kernel: &'a HashMap<String, AxumMiddleware>,
}

impl ResourceHandle for AxumResource<'_> {
    fn name(&mut self, name: &str) -> HostResult<()> {
        if self.prefix.as_deref() == Some(name) {
            return Ok(());
        }
        let names: Vec<String> = self
            .routes
            .iter()
            .filter_map(|route| route.action)
            .map(|action| format!("{name}.{action}"))
            .collect();
        if let Some(taken) = names.iter().find(|candidate| {
            self.names.contains(*candidate)
                && !self
                    .routes
                    .iter()
                    .any(|route| route.name.as_ref() == Some(*candidate))
        }) {
            return Err(HostError::DuplicateName(taken.clone()));
        }
        for (route, name) in self
            .routes
            .iter_mut()
            .filter(|route| route.action.is_some())
            .zip(names)
        {
            set_name(self.names, &mut route.name, name)?;
        }
        *self.pending = None;
        self.prefix = Some(name.to_owned());
        Ok(())
    }

    fn middleware(
        &mut self,
        actions: &ResourceActions,
        middleware: &MiddlewareSpec,
    ) -> HostResult<()> {
        let resolved = resolve(self.kernel, middleware)?;
        for route in self.routes.iter_mut() {
            if route.action.is_some_and(|action| actions.contains(action)) {
                route.middleware.extend(resolved.iter().cloned());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::axum::body::{Body, to_bytes};
    use ::axum::extract::{Path, Request};
    use ::axum::http::StatusCode;
    use ::axum::middleware::Next;
    use ::axum::response::{IntoResponse, Response};
    use tower::ServiceExt;

    struct UsersController;

    impl UsersController {
        async fn index(&self) -> &'static str {
            "index"
        }

        async fn show(&self, id: String) -> String {
            format!("show {id}")
        }
    }

    impl Endpoints for UsersController {
        fn endpoint(self: Arc<Self>, method: &str) -> Option<Endpoint> {
            match method {
                "index" => Some(endpoint({
                    let controller = self.clone();
                    move || {
                        let controller = controller.clone();
                        async move { controller.index().await.into_response() }
                    }
                })),
                "show" => Some(endpoint({
                    let controller = self.clone();
                    move |Path(id): Path<String>| {
                        let controller = controller.clone();
                        async move { controller.show(id).await.into_response() }
                    }
                })),
                _ => None,
            }
        }
    }

    fn users() -> HandlerRef {
        HandlerRef::new(ControllerId::of::<UsersController>(), "show")
    }

    async fn call(router: Router, method: &str, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    type Tagged = std::pin::Pin<Box<dyn Future<Output = Response> + Send>>;

    fn tag(label: &'static str) -> impl Fn(Request, Next) -> Tagged + Send + Sync + 'static {
        move |request: Request, next: Next| {
            Box::pin(async move {
                let mut response = next.run(request).await;
                let seen = response
                    .headers()
                    .get("x-trace")
                    .and_then(|value| value.to_str().ok())
                    .map(|value| format!("{label},{value}"))
                    .unwrap_or_else(|| label.to_owned());
                response
                    .headers_mut()
                    .insert("x-trace", seen.parse().unwrap());
                response
            })
        }
    }

    #[tokio::test]
    async fn test_constraint_failure_is_not_found() {
        let mut router = AxumRouter::new().controller(Arc::new(UsersController));
        {
            let mut route = router.route("/users/:id", &[HttpMethod::Get], users()).unwrap();
            route.constrain("id", &Matcher::from("^\\d+$")).unwrap();
        }
        let app = router.into_router();

        assert_eq!(
            call(app.clone(), "GET", "/users/42").await,
            (StatusCode::OK, "show 42".to_owned())
        );
        assert_eq!(call(app.clone(), "GET", "/users/abc").await.0, StatusCode::NOT_FOUND);
        assert_eq!(
            call(app, "POST", "/users/42").await.0,
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[tokio::test]
    async fn test_middleware_runs_in_use_order() {
        let mut router = AxumRouter::new()
            .controller(Arc::new(UsersController))
            .middleware("first", tag("first"))
            .middleware("second", tag("second"));
        {
            let mut route = router.route("/users/:id", &[HttpMethod::Get], users()).unwrap();
            route.use_middleware(&MiddlewareSpec::from("first")).unwrap();
            route
                .use_middleware(&MiddlewareSpec::from(middleware(tag("third"))))
                .unwrap();
            route.use_middleware(&MiddlewareSpec::from("second")).unwrap();
        }
        let response = router
            .into_router()
            .oneshot(Request::builder().uri("/users/1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        // Responses unwind innermost first, so the header lists outer layers last.
        assert_eq!(response.headers()["x-trace"], "first,third,second");
    }

    #[test]
    fn test_registration_rejections() {
        let mut router = AxumRouter::new().controller(Arc::new(UsersController));

        assert!(matches!(
            router.route("/users/:id?", &[HttpMethod::Get], users()),
            Err(HostError::InvalidPattern { .. })
        ));
        assert!(matches!(
            router.route("/users", &[HttpMethod::Get], HandlerRef::new(ControllerId::of::<UsersController>(), "missing")),
            Err(HostError::UnknownHandler(_))
        ));
        assert!(matches!(
            router.route("/x", &[HttpMethod::Get], HandlerRef::new(ControllerId::of::<String>(), "show")),
            Err(HostError::UnknownController(_))
        ));

        router
            .route("/users/:id", &[HttpMethod::Get], users())
            .unwrap()
            .name("users.show")
            .unwrap();
        assert!(matches!(
            router.route("/users/:id", &[HttpMethod::Any], users()),
            Err(HostError::Conflict { .. })
        ));
        assert!(matches!(
            router.route("/users/:slug", &[HttpMethod::Post], users()),
            Err(HostError::InvalidPattern { .. })
        ));

        let mut other = router.route("/people/:id", &[HttpMethod::Get], users()).unwrap();
        assert!(matches!(other.name("users.show"), Err(HostError::DuplicateName(_))));
        assert!(matches!(
            other.constrain("id", &Matcher::from("(")),
            Err(HostError::InvalidMatcher { .. })
        ));
        assert!(matches!(
            other.use_middleware(&MiddlewareSpec::from("auth")),
            Err(HostError::UnknownMiddleware(_))
        ));
    }

    #[tokio::test]
    async fn test_resource_expands_implemented_actions() {
        let mut router = AxumRouter::new()
            .controller(Arc::new(UsersController))
            .middleware("deny", |_request: Request, _next: Next| async {
                StatusCode::FORBIDDEN.into_response()
            });
        {
            let mut resource = router
                .resource("/users", ControllerId::of::<UsersController>())
                .unwrap();
            resource.name("admin.users").unwrap();
            resource
                .middleware(
                    &ResourceActions::from(ResourceAction::Show),
                    &MiddlewareSpec::from("deny"),
                )
                .unwrap();
        }

        assert_eq!(router.len(), 2);
        assert_eq!(router.pattern_of("admin.users.index"), Some("/users"));
        assert_eq!(router.pattern_of("admin.users.show"), Some("/users/:id"));
        assert!(router.names().iter().all(|name| name.starts_with("admin.users.")));

        let app = router.into_router();
        assert_eq!(
            call(app.clone(), "GET", "/users").await,
            (StatusCode::OK, "index".to_owned())
        );
        assert_eq!(call(app, "GET", "/users/7").await.0, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_any_route_takes_constraints_and_middleware() {
        let mut router = AxumRouter::new()
            .controller(Arc::new(UsersController))
            .middleware("first", tag("first"));
        {
            let mut route = router.route("/items/:id", &[HttpMethod::Any], users()).unwrap();
            route.constrain("id", &Matcher::from("^\\d+$")).unwrap();
            route.use_middleware(&MiddlewareSpec::from("first")).unwrap();
        }
        let app = router.into_router();

        for method in ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method(method)
                        .uri("/items/5")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{method}");
            assert_eq!(response.headers()["x-trace"], "first");
        }
        assert_eq!(call(app, "GET", "/items/five").await.0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_explicit_resource_name_replaces_default() {
        let mut router = AxumRouter::new().controller(Arc::new(UsersController));
        router
            .route("/people/:id", &[HttpMethod::Get], users())
            .unwrap()
            .name("users.index")
            .unwrap();

        router
            .resource("/users", ControllerId::of::<UsersController>())
            .unwrap()
            .name("people")
            .unwrap();
        router.route("/health", &[HttpMethod::Get], users()).unwrap();

        assert_eq!(router.pattern_of("users.index"), Some("/people/:id"));
        assert_eq!(router.pattern_of("people.index"), Some("/users"));
        assert_eq!(router.pattern_of("people.show"), Some("/users/:id"));
        assert_eq!(router.names(), vec!["people.index", "people.show", "users.index"]);
    }

    #[test]
    fn test_default_resource_names_settle_on_next_registration() {
        let mut router = AxumRouter::new().controller(Arc::new(UsersController));
        router
            .resource("/users", ControllerId::of::<UsersController>())
            .unwrap();
        assert_eq!(router.pattern_of("users.show"), Some("/users/:id"));

        let mut other = router.route("/people/:id", &[HttpMethod::Get], users()).unwrap();
        assert!(matches!(other.name("users.show"), Err(HostError::DuplicateName(_))));
    }

    struct NotAttached;

    #[test]
    fn test_resource_requires_attached_controller() {
        let mut router = AxumRouter::new().controller(Arc::new(UsersController));
        assert!(matches!(
            router.resource("/posts", ControllerId::of::<NotAttached>()),
            Err(HostError::UnknownController(_))
        ));
        assert!(router.is_empty());
    }

    #[test]
    fn test_failed_resource_commits_nothing() {
        let mut router = AxumRouter::new().controller(Arc::new(UsersController));
        router.route("/users/:id", &[HttpMethod::Get], users()).unwrap();

        // index stages fine, show conflicts with the route above.
        assert!(matches!(
            router.resource("/users", ControllerId::of::<UsersController>()),
            Err(HostError::Conflict { .. })
        ));
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_default_resource_name() {
        assert_eq!(default_resource_name("/blog/posts"), "blog.posts");
        assert_eq!(default_resource_name("/users/:user_id/posts"), "users.posts");
    }
}
