//! A host router that only records what it is asked to register.

use super::{HandlerRef, HostResult, HostRouter, ResourceHandle, RouteHandle};
use crate::metadata::{
    ControllerId, HttpMethod, Matcher, MiddlewareSpec, ParamConstraint, ResourceActions,
    ResourceMiddleware,
};
use serde_json::{Value, json};
use std::fmt;

#[derive(Clone, Debug)]
pub struct RouteEntry {
    pub pattern: String,
    pub methods: Vec<HttpMethod>,
    pub handler: HandlerRef,
    pub name: Option<String>,
    pub constraints: Vec<ParamConstraint>,
    pub middleware: Vec<MiddlewareSpec>,
}

#[derive(Clone, Debug)]
pub struct ResourceEntry {
    pub pattern: String,
    pub controller: ControllerId,
    pub name: Option<String>,
    pub middleware: Vec<ResourceMiddleware>,
}

/// Records routes and resources exactly as they are replayed.
///
/// # Example
/// ```
/// use girouette::{Controller, Decorate, Manifest, MetadataStore, get};
/// use girouette::discovery::Discovery;
/// use girouette::host::table::RouteTable;
///
/// struct HealthController;
///
/// impl Controller for HealthController {
///     fn decorate(controller: &mut Decorate<'_>) {
///         controller.method("check", get("/health").name("health"));
///     }
/// }
///
/// let manifest = Manifest::new().controller::<HealthController>("app::health_controller");
/// let store = MetadataStore::new();
/// let mut table = RouteTable::new();
/// Discovery::new(&manifest, &store).register(&mut table).unwrap();
///
/// assert_eq!(table.routes()[0].pattern, "/health");
/// ```
#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    routes: Vec<RouteEntry>,
    resources: Vec<ResourceEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    pub fn resources(&self) -> &[ResourceEntry] {
        &self.resources
    }

    pub fn route_named(&self, name: &str) -> Option<&RouteEntry> {
        self.routes
            .iter()
            .find(|route| route.name.as_deref() == Some(name))
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.resources.is_empty()
    }

    /// JSON listing of everything registered.
    pub fn to_json(&self) -> Value {
        let routes: Vec<Value> = self
            .routes
            .iter()
            .map(|route| {
                json!({
                    "methods": route.methods.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "pattern": route.pattern,
                    "name": route.name,
                    "handler": route.handler.to_string(),
                    "constraints": route
                        .constraints
                        .iter()
                        .map(|c| json!({ "key": c.key, "matcher": c.matcher.to_string() }))
                        .collect::<Vec<_>>(),
                    "middleware": route.middleware.iter().map(ToString::to_string).collect::<Vec<_>>(),
                })
            })
            .collect();

        let resources: Vec<Value> = self
            .resources
            .iter()
            .map(|resource| {
                json!({
                    "pattern": resource.pattern,
                    "name": resource.name,
                    "controller": resource.controller.to_string(),
                    "middleware": resource
                        .middleware
                        .iter()
                        .map(|m| json!({ "actions": m.actions.to_string(), "middleware": m.middleware.to_string() }))
                        .collect::<Vec<_>>(),
                })
            })
            .collect();

        json!({ "routes": routes, "resources": resources })
    }
}

impl fmt::Display for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for route in &self.routes {
            let methods: Vec<&str> = route.methods.iter().map(AsRef::as_ref).collect();
            write!(f, "{:<8} {:<32} {}", methods.join("|"), route.pattern, route.handler)?;
            if let Some(name) = &route.name {
                write!(f, " as {name}")?;
            }
            for constraint in &route.constraints {
                write!(f, " where {}={}", constraint.key, constraint.matcher)?;
            }
            for middleware in &route.middleware {
                write!(f, " use {middleware}")?;
            }
            writeln!(f)?;
        }
        for resource in &self.resources {
            write!(f, "{:<8} {:<32} {}", "RESOURCE", resource.pattern, resource.controller)?;
            if let Some(name) = &resource.name {
                write!(f, " as {name}")?;
            }
            for middleware in &resource.middleware {
                write!(f, " use {}@{}", middleware.middleware, middleware.actions)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl HostRouter for RouteTable {
    fn route(
        &mut self,
        pattern: &str,
        methods: &[HttpMethod],
        handler: HandlerRef,
    ) -> HostResult<Box<dyn RouteHandle + '_>> {
        let index = self.routes.len();
        self.routes.push(RouteEntry {
            pattern: pattern.to_owned(),
            methods: methods.to_vec(),
            handler,
            name: None,
            constraints: Vec::new(),
            middleware: Vec::new(),
        });
        Ok(Box::new(TableRoute(&mut self.routes[index])))
    }

    fn resource(
        &mut self,
        pattern: &str,
        controller: ControllerId,
    ) -> HostResult<Box<dyn ResourceHandle + '_>> {
        let index = self.resources.len();
        self.resources.push(ResourceEntry {
            pattern: pattern.to_owned(),
            controller,
            name: None,
            middleware: Vec::new(),
        });
        Ok(Box::new(TableResource(&mut self.resources[index])))
    }
}

struct TableRoute<'a>(&'a mut RouteEntry);

impl RouteHandle for TableRoute<'_> {
    fn name(&mut self, name: &str) -> HostResult<()> {
        self.0.name = Some(name.to_owned());
        Ok(())
    }

    fn constrain(&mut self, key: &str, matcher: &Matcher) -> HostResult<()> {
        self.0.constraints.push(ParamConstraint {
            key: key.to_owned(),
            matcher: matcher.clone(),
        });
        Ok(())
    }

    fn use_middleware(&mut self, middleware: &MiddlewareSpec) -> HostResult<()> {
        self.0.middleware.push(middleware.clone());
        Ok(())
    }
}

struct TableResource<'a>(&'a mut ResourceEntry);

impl ResourceHandle for TableResource<'_> {
    fn name(&mut self, name: &str) -> HostResult<()> {
        self.0.name = Some(name.to_owned());
        Ok(())
    }

    fn middleware(
        &mut self,
        actions: &ResourceActions,
        middleware: &MiddlewareSpec,
    ) -> HostResult<()> {
        self.0.middleware.push(ResourceMiddleware {
            actions: actions.clone(),
            middleware: middleware.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Users;

    #[test]
    fn test_records_route_calls() {
        let mut table = RouteTable::new();
        let handler = HandlerRef::new(ControllerId::of::<Users>(), "show");
        {
            let mut route = table
                .route("/users/:id", &[HttpMethod::Get], handler.clone())
                .unwrap();
            route.name("users.show").unwrap();
            route.constrain("id", &Matcher::from("^\\d+$")).unwrap();
            route.use_middleware(&MiddlewareSpec::from("auth")).unwrap();
        }

        let entry = table.route_named("users.show").unwrap();
        assert_eq!(entry.handler, handler);
        assert_eq!(entry.constraints.len(), 1);
        assert_eq!(entry.middleware.len(), 1);

        let listing = table.to_string();
        assert!(listing.contains("GET"));
        assert!(listing.contains("Users.show as users.show where id=\"^\\\\d+$\" use [auth]"));
    }

    #[test]
    fn test_json_listing() {
        let mut table = RouteTable::new();
        {
            let mut resource = table
                .resource("/posts", ControllerId::of::<Users>())
                .unwrap();
            resource.name("blog.posts").unwrap();
            resource
                .middleware(&ResourceActions::All, &MiddlewareSpec::from("auth"))
                .unwrap();
        }

        let listing = table.to_json();
        assert_eq!(listing["routes"], json!([]));
        assert_eq!(listing["resources"][0]["name"], "blog.posts");
        assert_eq!(listing["resources"][0]["middleware"][0]["actions"], "*");
        assert_eq!(listing["resources"][0]["middleware"][0]["middleware"], "[auth]");
    }
}
