use proc_macro::TokenStream;

mod args;
mod controller;
mod http_methods;

/// Attribute macro turning an impl block into a discoverable controller
///
/// Implements `girouette::Controller` from the route attributes found in the
/// block, `girouette::host::axum::Endpoints` for every `async fn(&self, ..)`,
/// and registers the controller for startup discovery under the current
/// module path.
///
/// Method attributes apply bottom-up; resource attributes on the impl block
/// apply bottom-up after all methods.
///
/// # Example
/// ```ignore
/// #[controller]
/// #[resource("/posts", name = "blog.posts")]
/// #[resource_middleware([store, update, destroy], "auth")]
/// impl PostsController {
///     async fn index(&self) -> Json<Vec<Post>> { ... }
///
///     #[get("/posts/:id/comments", name = "posts.comments")]
///     #[where_param("id", regex = r"^\d+$")]
///     #[route_middleware(["auth", "throttle"])]
///     async fn comments(&self, #[param] id: u64) -> Json<Vec<Comment>> { ... }
///
///     async fn store(&self, #[body] post: NewPost) -> StatusCode { ... }
/// }
/// ```
#[proc_macro_attribute]
pub fn controller(attr: TokenStream, item: TokenStream) -> TokenStream {
    controller::controller_attribute(attr, item)
}

/// HTTP GET route: `#[get("/pattern")]` or `#[get("/pattern", name = "route.name")]`
#[proc_macro_attribute]
pub fn get(_attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::misplaced_attribute("get", item)
}

/// HTTP POST route
#[proc_macro_attribute]
pub fn post(_attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::misplaced_attribute("post", item)
}

/// HTTP PUT route
#[proc_macro_attribute]
pub fn put(_attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::misplaced_attribute("put", item)
}

/// HTTP PATCH route
#[proc_macro_attribute]
pub fn patch(_attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::misplaced_attribute("patch", item)
}

/// HTTP DELETE route
#[proc_macro_attribute]
pub fn delete(_attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::misplaced_attribute("delete", item)
}

/// Route matching every HTTP method
#[proc_macro_attribute]
pub fn any(_attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::misplaced_attribute("any", item)
}

/// Constrains a route parameter
///
/// `#[where_param("id", "^\\d+$")]`, `#[where_param("id", regex = "...")]`
/// (checked at compile time) or `#[where_param("id", matcher = expr)]` for
/// any `Into<Matcher>` expression.
#[proc_macro_attribute]
pub fn where_param(_attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::misplaced_attribute("where_param", item)
}

/// Appends middleware to a route: any `Into<MiddlewareSpec>` expression
#[proc_macro_attribute]
pub fn route_middleware(_attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::misplaced_attribute("route_middleware", item)
}

/// Declares the controller as a resource: `#[resource("/posts", name = "posts")]`
#[proc_macro_attribute]
pub fn resource(_attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::misplaced_attribute("resource", item)
}

/// Middleware for some resource actions: `#[resource_middleware("*", "auth")]`
/// or `#[resource_middleware([store, update], "auth")]`
#[proc_macro_attribute]
pub fn resource_middleware(_attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::misplaced_attribute("resource_middleware", item)
}

/// Parameter attribute for request body (JSON)
/// Wraps the parameter with axum::Json extractor
#[proc_macro_attribute]
pub fn body(_attr: TokenStream, item: TokenStream) -> TokenStream {
    // Pass-through, actual handling is done by #[controller]
    item
}

/// Parameter attribute for path parameters
/// Wraps the parameter with axum::extract::Path extractor
#[proc_macro_attribute]
pub fn param(_attr: TokenStream, item: TokenStream) -> TokenStream {
    // Pass-through, actual handling is done by #[controller]
    item
}

/// Parameter attribute for query string parameters
/// Wraps the parameter with axum::extract::Query extractor
#[proc_macro_attribute]
pub fn query(_attr: TokenStream, item: TokenStream) -> TokenStream {
    // Pass-through, actual handling is done by #[controller]
    item
}
