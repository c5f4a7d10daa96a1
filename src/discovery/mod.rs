//! Startup discovery: walk the controller tree and replay every descriptor
//! into a host router.
//!
//! ```text
//! root/                     read_dir
//!  ├── users_controller.rs  load -> decorators run -> routes + resource replayed
//!  ├── helpers.rs           skipped (naming convention)
//!  └── admin/               recursed
//!       └── reports_controller.rs
//! ```
//!
//! The walk is all-or-nothing: the first directory, module or host error
//! aborts it. Controllers without metadata are skipped silently.

mod fs;
mod manifest;

pub use fs::{DirEntry, EntryKind, FileSystem};
pub use manifest::{ControllerModule, Manifest, ModuleLoader, load};

use crate::error::{GirouetteError, Result};
use crate::host::{HandlerRef, HostRouter};
use crate::metadata::{ControllerId, MetadataStore, ResourceDescriptor, RouteDescriptor};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Where discovery starts and which files count as controllers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveryConfig {
    root: PathBuf,
    suffixes: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("app"),
            suffixes: vec!["_controller.rs".to_owned()],
        }
    }
}

impl DiscoveryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Adds a file-name suffix that marks a controller module.
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffixes.push(suffix.into());
        self
    }

    /// Replaces the controller file-name suffixes.
    pub fn suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    pub fn is_controller_file(&self, file_name: &str) -> bool {
        self.suffixes
            .iter()
            .any(|suffix| file_name.ends_with(suffix.as_str()))
    }
}

/// What a discovery pass registered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    pub controllers: usize,
    pub routes: usize,
    pub resources: usize,
}

/// One discovery pass over a controller tree.
///
/// # Example
/// ```
/// use girouette::{Controller, Decorate, Manifest, MetadataStore, get, resource};
/// use girouette::discovery::Discovery;
/// use girouette::host::table::RouteTable;
///
/// struct PostsController;
///
/// impl Controller for PostsController {
///     fn decorate(controller: &mut Decorate<'_>) {
///         controller
///             .method("feed", get("/posts/feed"))
///             .class(resource("/posts").name("blog.posts"));
///     }
/// }
///
/// let manifest = Manifest::new().controller::<PostsController>("blog::app::posts_controller");
/// let store = MetadataStore::new();
/// let mut table = RouteTable::new();
///
/// let report = Discovery::new(&manifest, &store).register(&mut table).unwrap();
/// assert_eq!((report.routes, report.resources), (1, 1));
/// ```
pub struct Discovery<'a, F: ?Sized, L: ?Sized> {
    config: DiscoveryConfig,
    fs: &'a F,
    loader: &'a L,
    store: &'a MetadataStore,
}

impl<'a> Discovery<'a, Manifest, Manifest> {
    pub fn new(manifest: &'a Manifest, store: &'a MetadataStore) -> Self {
        Self::with_parts(manifest, manifest, store)
    }
}

impl<'a, F, L> Discovery<'a, F, L>
where
    F: FileSystem + ?Sized,
    L: ModuleLoader + ?Sized,
{
    pub fn with_parts(fs: &'a F, loader: &'a L, store: &'a MetadataStore) -> Self {
        Self {
            config: DiscoveryConfig::default(),
            fs,
            loader,
            store,
        }
    }

    pub fn config(mut self, config: DiscoveryConfig) -> Self {
        self.config = config;
        self
    }

    /// Walks the configured root and registers everything found on `router`.
    pub fn register<R: HostRouter + ?Sized>(&self, router: &mut R) -> Result<DiscoveryReport> {
        tracing::info!("Discovering controllers in {}", self.config.root.display());

        let mut report = DiscoveryReport::default();
        self.walk(&self.config.root, router, &mut report)?;

        tracing::info!(
            "Discovery complete ({} controllers, {} routes, {} resources)",
            report.controllers,
            report.routes,
            report.resources
        );
        Ok(report)
    }

    fn walk<R: HostRouter + ?Sized>(
        &self,
        dir: &Path,
        router: &mut R,
        report: &mut DiscoveryReport,
    ) -> Result<()> {
        tracing::debug!("Scanning {}", dir.display());
        for entry in self.fs.read_dir(dir)? {
            let path = dir.join(&entry.name);
            match entry.kind {
                EntryKind::Directory => self.walk(&path, router, report)?,
                EntryKind::File if self.config.is_controller_file(&entry.name) => {
                    self.register_module(&path, router, report)?
                }
                EntryKind::File => tracing::trace!("Skipping {}", path.display()),
            }
        }
        Ok(())
    }

    fn register_module<R: HostRouter + ?Sized>(
        &self,
        path: &Path,
        router: &mut R,
        report: &mut DiscoveryReport,
    ) -> Result<()> {
        tracing::debug!("Loading {}", path.display());
        for controller in self.loader.load(path, self.store)? {
            report.controllers += 1;
            let Some(metadata) = self.store.get(&controller) else {
                continue;
            };
            for (method, route) in metadata.routes().iter() {
                register_route(router, controller, method, route)?;
                report.routes += 1;
            }
            if register_resource(router, controller, metadata.resource())? {
                report.resources += 1;
            }
        }
        Ok(())
    }
}

/// Replays one route descriptor: create, name, constraints, middleware.
pub fn register_route<R: HostRouter + ?Sized>(
    router: &mut R,
    controller: ControllerId,
    method: &str,
    descriptor: &RouteDescriptor,
) -> Result<()> {
    let target = descriptor
        .target()
        .ok_or_else(|| GirouetteError::IncompleteRoute {
            controller: controller.name(),
            method: method.to_owned(),
        })?;

    tracing::debug!(
        "Registering {} {} -> {}.{}",
        target.method,
        target.pattern,
        controller,
        method
    );
    let mut route = router.route(
        &target.pattern,
        &[target.method],
        HandlerRef::new(controller, method),
    )?;
    if let Some(name) = target.name.as_deref().filter(|name| !name.is_empty()) {
        route.name(name)?;
    }
    for constraint in descriptor.constraints() {
        route.constrain(&constraint.key, &constraint.matcher)?;
    }
    for middleware in descriptor.middleware() {
        route.use_middleware(middleware)?;
    }
    Ok(())
}

/// Replays the resource descriptor if it declares a pattern. Returns whether
/// a resource was registered.
pub fn register_resource<R: HostRouter + ?Sized>(
    router: &mut R,
    controller: ControllerId,
    descriptor: &ResourceDescriptor,
) -> Result<bool> {
    let Some(pattern) = descriptor.pattern().filter(|pattern| !pattern.is_empty()) else {
        return Ok(false);
    };

    tracing::debug!("Registering resource {} -> {}", pattern, controller);
    let mut resource = router.resource(pattern, controller)?;
    if let Some(name) = descriptor.name().filter(|name| !name.is_empty()) {
        resource.name(name)?;
    }
    for entry in descriptor.middleware() {
        resource.middleware(&entry.actions, &entry.middleware)?;
    }
    Ok(true)
}
