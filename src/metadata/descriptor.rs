use super::{HttpMethod, ResourceActions};
use regex::Regex;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Restricts the values a route parameter may take.
///
/// A `Literal` is handed to the host untouched; the bundled hosts read it as
/// a regular-expression source.
#[derive(Clone)]
pub enum Matcher {
    Literal(String),
    Regex(Regex),
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl Matcher {
    pub fn literal(source: impl Into<String>) -> Self {
        Matcher::Literal(source.into())
    }

    pub fn regex(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Matcher::Regex)
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Matcher::Predicate(Arc::new(predicate))
    }

    /// Pattern source for literal and regex matchers.
    pub fn source(&self) -> Option<&str> {
        match self {
            Matcher::Literal(source) => Some(source),
            Matcher::Regex(regex) => Some(regex.as_str()),
            Matcher::Predicate(_) => None,
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Literal(source) => f.debug_tuple("Literal").field(source).finish(),
            Matcher::Regex(regex) => f.debug_tuple("Regex").field(&regex.as_str()).finish(),
            Matcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Literal(source) => write!(f, "{source:?}"),
            Matcher::Regex(regex) => write!(f, "/{}/", regex.as_str()),
            Matcher::Predicate(_) => f.write_str("<fn>"),
        }
    }
}

impl From<&str> for Matcher {
    fn from(source: &str) -> Self {
        Matcher::Literal(source.to_owned())
    }
}

impl From<String> for Matcher {
    fn from(source: String) -> Self {
        Matcher::Literal(source)
    }
}

impl From<Regex> for Matcher {
    fn from(regex: Regex) -> Self {
        Matcher::Regex(regex)
    }
}

#[derive(Clone, Debug)]
pub struct ParamConstraint {
    pub key: String,
    pub matcher: Matcher,
}

/// Middleware the host resolves by name, optionally with arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct NamedMiddleware {
    pub name: String,
    pub args: Option<Value>,
}

/// Type-erased middleware value. Hosts downcast it to the type they accept.
#[derive(Clone)]
pub struct MiddlewareHandle {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl MiddlewareHandle {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for MiddlewareHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MiddlewareHandle").field(&self.type_name).finish()
    }
}

#[derive(Clone, Debug)]
pub enum MiddlewareRef {
    Named(NamedMiddleware),
    Handle(MiddlewareHandle),
}

impl MiddlewareRef {
    pub fn named(name: impl Into<String>) -> Self {
        MiddlewareRef::Named(NamedMiddleware {
            name: name.into(),
            args: None,
        })
    }

    pub fn handle<T: Any + Send + Sync>(value: T) -> Self {
        MiddlewareRef::Handle(MiddlewareHandle::new(value))
    }

    /// Attaches arguments to a named middleware. Handles are returned as is.
    pub fn with_args(self, args: Value) -> Self {
        match self {
            MiddlewareRef::Named(named) => MiddlewareRef::Named(NamedMiddleware {
                args: Some(args),
                ..named
            }),
            handle => handle,
        }
    }
}

impl fmt::Display for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiddlewareRef::Named(NamedMiddleware { name, args: None }) => f.write_str(name),
            MiddlewareRef::Named(NamedMiddleware {
                name,
                args: Some(args),
            }) => write!(f, "{name}({args})"),
            MiddlewareRef::Handle(handle) => write!(f, "<{}>", handle.type_name()),
        }
    }
}

impl From<&str> for MiddlewareRef {
    fn from(name: &str) -> Self {
        MiddlewareRef::named(name)
    }
}

impl From<String> for MiddlewareRef {
    fn from(name: String) -> Self {
        MiddlewareRef::named(name)
    }
}

impl From<NamedMiddleware> for MiddlewareRef {
    fn from(named: NamedMiddleware) -> Self {
        MiddlewareRef::Named(named)
    }
}

impl From<MiddlewareHandle> for MiddlewareRef {
    fn from(handle: MiddlewareHandle) -> Self {
        MiddlewareRef::Handle(handle)
    }
}

/// One or more middleware recorded by a single decorator application.
#[derive(Clone, Debug, Default)]
pub struct MiddlewareSpec(Vec<MiddlewareRef>);

impl MiddlewareSpec {
    pub fn refs(&self) -> &[MiddlewareRef] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MiddlewareRef> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a MiddlewareSpec {
    type Item = &'a MiddlewareRef;
    type IntoIter = std::slice::Iter<'a, MiddlewareRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for MiddlewareSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let refs: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", refs.join(", "))
    }
}

impl From<MiddlewareRef> for MiddlewareSpec {
    fn from(middleware: MiddlewareRef) -> Self {
        MiddlewareSpec(vec![middleware])
    }
}

impl From<&str> for MiddlewareSpec {
    fn from(name: &str) -> Self {
        MiddlewareSpec(vec![name.into()])
    }
}

impl From<String> for MiddlewareSpec {
    fn from(name: String) -> Self {
        MiddlewareSpec(vec![name.into()])
    }
}

impl From<NamedMiddleware> for MiddlewareSpec {
    fn from(named: NamedMiddleware) -> Self {
        MiddlewareSpec(vec![named.into()])
    }
}

impl From<MiddlewareHandle> for MiddlewareSpec {
    fn from(handle: MiddlewareHandle) -> Self {
        MiddlewareSpec(vec![handle.into()])
    }
}

impl From<Vec<MiddlewareRef>> for MiddlewareSpec {
    fn from(refs: Vec<MiddlewareRef>) -> Self {
        MiddlewareSpec(refs)
    }
}

impl<const N: usize> From<[MiddlewareRef; N]> for MiddlewareSpec {
    fn from(refs: [MiddlewareRef; N]) -> Self {
        MiddlewareSpec(refs.into())
    }
}

impl<const N: usize> From<[&str; N]> for MiddlewareSpec {
    fn from(names: [&str; N]) -> Self {
        MiddlewareSpec(names.into_iter().map(MiddlewareRef::from).collect())
    }
}

/// Verb, pattern and name of a route, always written together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteTarget {
    pub method: HttpMethod,
    pub pattern: String,
    pub name: Option<String>,
}

/// Everything recorded against one controller method.
#[derive(Clone, Debug, Default)]
pub struct RouteDescriptor {
    target: Option<RouteTarget>,
    constraints: Vec<ParamConstraint>,
    middleware: Vec<MiddlewareSpec>,
}

impl RouteDescriptor {
    pub fn target(&self) -> Option<&RouteTarget> {
        self.target.as_ref()
    }

    pub fn method(&self) -> Option<HttpMethod> {
        self.target.as_ref().map(|target| target.method)
    }

    pub fn pattern(&self) -> Option<&str> {
        self.target.as_ref().map(|target| target.pattern.as_str())
    }

    pub fn name(&self) -> Option<&str> {
        self.target.as_ref().and_then(|target| target.name.as_deref())
    }

    pub fn constraints(&self) -> &[ParamConstraint] {
        &self.constraints
    }

    pub fn middleware(&self) -> &[MiddlewareSpec] {
        &self.middleware
    }

    /// Fields already present win over the candidate: the first method
    /// decorator applied fixes verb, pattern and name for good.
    pub(crate) fn merge_target(&mut self, candidate: RouteTarget) {
        if self.target.is_none() {
            self.target = Some(candidate);
        }
    }

    pub(crate) fn push_constraint(&mut self, constraint: ParamConstraint) {
        self.constraints.push(constraint);
    }

    pub(crate) fn push_middleware(&mut self, middleware: MiddlewareSpec) {
        self.middleware.push(middleware);
    }
}

/// Method key -> descriptor, iterated in first-insertion order.
#[derive(Clone, Debug, Default)]
pub struct RouteMap {
    entries: Vec<(String, RouteDescriptor)>,
}

impl RouteMap {
    pub fn get(&self, key: &str) -> Option<&RouteDescriptor> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, route)| route)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouteDescriptor)> {
        self.entries.iter().map(|(key, route)| (key.as_str(), route))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entry(&mut self, key: &str) -> &mut RouteDescriptor {
        let index = match self.entries.iter().position(|(k, _)| k == key) {
            Some(index) => index,
            None => {
                self.entries.push((key.to_owned(), RouteDescriptor::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }
}

#[derive(Clone, Debug)]
pub struct ResourceMiddleware {
    pub actions: ResourceActions,
    pub middleware: MiddlewareSpec,
}

/// Class-level resource declaration.
#[derive(Clone, Debug, Default)]
pub struct ResourceDescriptor {
    pattern: Option<String>,
    name: Option<String>,
    middleware: Vec<ResourceMiddleware>,
}

impl ResourceDescriptor {
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn middleware(&self) -> &[ResourceMiddleware] {
        &self.middleware
    }

    /// A resource is only registered once it has a non-empty pattern.
    pub fn is_declared(&self) -> bool {
        self.pattern.as_deref().is_some_and(|pattern| !pattern.is_empty())
    }

    /// Overwrites the pattern. A missing or empty name leaves the previous one.
    pub(crate) fn declare(&mut self, pattern: String, name: Option<String>) {
        self.pattern = Some(pattern);
        if let Some(name) = name.filter(|name| !name.is_empty()) {
            self.name = Some(name);
        }
    }

    pub(crate) fn push_middleware(&mut self, middleware: ResourceMiddleware) {
        self.middleware.push(middleware);
    }
}

/// All metadata recorded for one controller type.
#[derive(Clone, Debug, Default)]
pub struct ControllerMetadata {
    routes: RouteMap,
    resource: ResourceDescriptor,
}

impl ControllerMetadata {
    pub fn routes(&self) -> &RouteMap {
        &self.routes
    }

    pub fn resource(&self) -> &ResourceDescriptor {
        &self.resource
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
            && self.resource.pattern.is_none()
            && self.resource.middleware.is_empty()
    }

    pub(crate) fn routes_mut(&mut self) -> &mut RouteMap {
        &mut self.routes
    }

    pub(crate) fn resource_mut(&mut self) -> &mut ResourceDescriptor {
        &mut self.resource
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_map_keeps_insertion_order() {
        let mut routes = RouteMap::default();
        routes.entry("show");
        routes.entry("index");
        routes.entry("show");
        assert_eq!(routes.keys().collect::<Vec<_>>(), vec!["show", "index"]);
        assert_eq!(routes.len(), 2);
    }

    #[test]
    fn test_merge_target_first_writer_wins() {
        let mut route = RouteDescriptor::default();
        route.merge_target(RouteTarget {
            method: HttpMethod::Get,
            pattern: "/users".into(),
            name: None,
        });
        route.merge_target(RouteTarget {
            method: HttpMethod::Post,
            pattern: "/people".into(),
            name: Some("people.store".into()),
        });
        assert_eq!(route.method(), Some(HttpMethod::Get));
        assert_eq!(route.pattern(), Some("/users"));
        assert_eq!(route.name(), None);
    }

    #[test]
    fn test_resource_declare_keeps_previous_name() {
        let mut resource = ResourceDescriptor::default();
        resource.declare("/x".into(), Some("n".into()));
        resource.declare("/y".into(), None);
        assert_eq!(resource.pattern(), Some("/y"));
        assert_eq!(resource.name(), Some("n"));

        resource.declare(String::new(), None);
        assert!(!resource.is_declared());
    }

    #[test]
    fn test_middleware_display() {
        let spec = MiddlewareSpec::from(vec![
            MiddlewareRef::named("auth"),
            MiddlewareRef::named("throttle").with_args(json!({ "max": 10 })),
            MiddlewareRef::handle(42_u8),
        ]);
        assert_eq!(spec.to_string(), r#"[auth, throttle({"max":10}), <u8>]"#);
        assert_eq!(spec.len(), 3);
    }

    #[test]
    fn test_matcher_sources() {
        assert_eq!(Matcher::from("^\\d+$").source(), Some("^\\d+$"));
        assert_eq!(Matcher::regex("[a-z]+").unwrap().to_string(), "/[a-z]+/");
        assert!(Matcher::predicate(|value| value.len() < 4).source().is_none());
        assert!(Matcher::regex("(").is_err());
    }
}
