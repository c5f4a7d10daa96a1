//! Route and resource descriptors, and the store that accumulates them.
//!
//! Decorators never talk to a router directly. Each application merges into
//! the [`ControllerMetadata`] kept for its controller type inside a
//! [`MetadataStore`]; discovery reads the result back once at startup.

mod descriptor;
mod store;

pub use descriptor::{
    ControllerMetadata, Matcher, MiddlewareHandle, MiddlewareRef, MiddlewareSpec, NamedMiddleware,
    ParamConstraint, ResourceDescriptor, ResourceMiddleware, RouteDescriptor, RouteMap, RouteTarget,
};
pub use store::{Decorate, MetadataStore};

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Stable identity of a controller type.
///
/// Equality and hashing only look at the `TypeId`; the type name is carried
/// along for log lines and error messages.
#[derive(Clone, Copy)]
pub struct ControllerId {
    type_id: TypeId,
    name: &'static str,
}

impl ControllerId {
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
        }
    }

    /// Fully qualified type name, e.g. `my_app::app::users_controller::UsersController`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path.
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

impl PartialEq for ControllerId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ControllerId {}

impl Hash for ControllerId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ControllerId").field(&self.name).finish()
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// HTTP verb a route answers to. `Any` matches every method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Any,
}

/// One of the conventional routes a resource expands to.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceAction {
    Index,
    Create,
    Store,
    Show,
    Edit,
    Update,
    Destroy,
}

/// The subset of resource actions a middleware applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceActions {
    /// `*`: every action the resource generates.
    All,
    Only(Vec<ResourceAction>),
}

impl ResourceActions {
    pub fn contains(&self, action: ResourceAction) -> bool {
        match self {
            ResourceActions::All => true,
            ResourceActions::Only(actions) => actions.contains(&action),
        }
    }
}

impl fmt::Display for ResourceActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceActions::All => f.write_str("*"),
            ResourceActions::Only(actions) => {
                let names: Vec<&str> = actions.iter().map(AsRef::as_ref).collect();
                f.write_str(&names.join(","))
            }
        }
    }
}

impl FromStr for ResourceActions {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim() == "*" {
            return Ok(ResourceActions::All);
        }
        s.split(',')
            .map(|action| action.trim().parse())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(ResourceActions::Only)
    }
}

impl From<ResourceAction> for ResourceActions {
    fn from(action: ResourceAction) -> Self {
        ResourceActions::Only(vec![action])
    }
}

impl From<Vec<ResourceAction>> for ResourceActions {
    fn from(actions: Vec<ResourceAction>) -> Self {
        ResourceActions::Only(actions)
    }
}

impl<const N: usize> From<[ResourceAction; N]> for ResourceActions {
    fn from(actions: [ResourceAction; N]) -> Self {
        ResourceActions::Only(actions.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    struct UsersController;
    struct PostsController;

    #[test]
    fn test_controller_id_identity() {
        let users = ControllerId::of::<UsersController>();
        assert_eq!(users, ControllerId::of::<UsersController>());
        assert_ne!(users, ControllerId::of::<PostsController>());
        assert_eq!(users.short_name(), "UsersController");
        assert!(users.name().ends_with("::UsersController"));
    }

    #[test]
    fn test_http_method_display_and_parse() {
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
        assert_eq!("patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert_eq!(HttpMethod::iter().count(), 6);
    }

    #[test]
    fn test_resource_actions_parse() {
        assert_eq!("*".parse::<ResourceActions>().unwrap(), ResourceActions::All);

        let actions: ResourceActions = "store, update,destroy".parse().unwrap();
        assert_eq!(
            actions,
            ResourceActions::Only(vec![
                ResourceAction::Store,
                ResourceAction::Update,
                ResourceAction::Destroy
            ])
        );
        assert!(actions.contains(ResourceAction::Update));
        assert!(!actions.contains(ResourceAction::Index));
        assert_eq!(actions.to_string(), "store,update,destroy");

        assert!("publish".parse::<ResourceActions>().is_err());
    }
}
