use ::axum::extract::Request;
use ::axum::handler::Handler;
use ::axum::response::Response;
use std::convert::Infallible;
use std::sync::Arc;
use tower::util::BoxCloneSyncService;

/// Type-erased handler for one controller method.
pub type Endpoint = BoxCloneSyncService<Request, Response, Infallible>;

/// Lookup of a controller's handlers by method name.
///
/// Generated by `#[controller]` for every `async fn(&self, ..)` in the
/// annotated impl block.
pub trait Endpoints: Send + Sync + 'static {
    fn endpoint(self: Arc<Self>, method: &str) -> Option<Endpoint>;
}

/// Erases an axum handler into an [`Endpoint`].
pub fn endpoint<H, T>(handler: H) -> Endpoint
where
    H: Handler<T, ()>,
    T: 'static,
{
    BoxCloneSyncService::new(handler.with_state(()))
}
