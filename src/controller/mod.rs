// Controllers describe their routes through decorators:
// - #[controller] on an impl block, with #[get], #[post], ... on its methods
// - or a hand-written `Controller` impl calling the decorator builders
//
// Either way the description lands in a `MetadataStore` when the controller
// is loaded, and is replayed into a host router by discovery.
use crate::metadata::Decorate;

/// A type whose routes are declared with decorators.
///
/// # Example
/// ```
/// use girouette::{Controller, Decorate, get, where_param};
///
/// pub struct UsersController;
///
/// impl Controller for UsersController {
///     fn decorate(controller: &mut Decorate<'_>) {
///         controller
///             .method("index", get("/users"))
///             .method("show", where_param("id", "^\\d+$"))
///             .method("show", get("/users/:id").name("users.show"));
///     }
/// }
/// ```
pub trait Controller: Send + Sync + 'static {
    /// Applies every decorator of this controller, in application order.
    fn decorate(controller: &mut Decorate<'_>);
}
