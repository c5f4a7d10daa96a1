//! Application startup hook.
//!
//! Discovers every `#[controller]` linked into the binary and registers it on
//! the host router in one pass.

use crate::discovery::{Discovery, DiscoveryConfig, DiscoveryReport, Manifest};
use crate::error::Result;
use crate::host::HostRouter;
use crate::metadata::MetadataStore;

/// Registers discovered controllers on a host router at startup.
///
/// # Example
///
/// ```rust,no_run
/// use girouette::RouterProvider;
/// use girouette::host::axum::AxumRouter;
///
/// let mut router = AxumRouter::new();
/// RouterProvider::new().start(&mut router).unwrap();
/// let app: axum::Router = router.into_router();
/// ```
#[derive(Clone, Debug, Default)]
pub struct RouterProvider {
    config: DiscoveryConfig,
}

impl RouterProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Collects the controller manifest and replays it into `router`.
    ///
    /// Each call uses a fresh metadata store, so starting twice registers
    /// everything twice.
    pub fn start<R: HostRouter + ?Sized>(&self, router: &mut R) -> Result<DiscoveryReport> {
        let manifest = Manifest::collect();
        let store = MetadataStore::new();
        tracing::info!("Starting router provider ({} controller modules)", manifest.len());

        self.start_with(&manifest, &store, router)
    }

    /// Like [`start`](Self::start) with an explicit manifest and store.
    pub fn start_with<R: HostRouter + ?Sized>(
        &self,
        manifest: &Manifest,
        store: &MetadataStore,
        router: &mut R,
    ) -> Result<DiscoveryReport> {
        Discovery::new(manifest, store)
            .config(self.config.clone())
            .register(router)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Controller;
    use crate::decorators::{get, resource};
    use crate::host::table::RouteTable;
    use crate::metadata::Decorate;

    struct HealthController;

    impl Controller for HealthController {
        fn decorate(controller: &mut Decorate<'_>) {
            controller.method("check", get("/health").name("health"));
        }
    }

    struct PostsController;

    impl Controller for PostsController {
        fn decorate(controller: &mut Decorate<'_>) {
            controller.class(resource("/posts"));
        }
    }

    #[test]
    fn test_start_with_manifest() {
        let manifest = Manifest::new()
            .controller::<HealthController>("svc::app::health_controller")
            .controller::<PostsController>("svc::app::blog::posts_controller");
        let store = MetadataStore::new();
        let mut table = RouteTable::new();

        let report = RouterProvider::new()
            .start_with(&manifest, &store, &mut table)
            .unwrap();
        assert_eq!(report.controllers, 2);
        assert_eq!(table.route_named("health").unwrap().pattern, "/health");
        assert_eq!(table.resources()[0].pattern, "/posts");
    }

    #[test]
    fn test_custom_config_is_used() {
        let manifest = Manifest::new().controller::<HealthController>("svc::app::health_controller");
        let store = MetadataStore::new();
        let mut table = RouteTable::new();

        let provider = RouterProvider::with_config(DiscoveryConfig::new().root("routes"));
        assert!(provider.start_with(&manifest, &store, &mut table).is_err());
        assert!(table.is_empty());
    }
}
