use super::fs::{DirEntry, EntryKind, FileSystem};
use crate::controller::Controller;
use crate::error::{GirouetteError, Result};
use crate::metadata::{ControllerId, MetadataStore};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// A controller module known at compile time.
///
/// `#[controller]` submits one of these for every annotated impl block.
#[derive(Clone, Copy, Debug)]
pub struct ControllerModule {
    pub module_path: &'static str,
    pub load: fn(&MetadataStore) -> ControllerId,
}

inventory::collect!(ControllerModule);

impl ControllerModule {
    pub const fn new(module_path: &'static str, load: fn(&MetadataStore) -> ControllerId) -> Self {
        Self { module_path, load }
    }

    /// Virtual source file of the module: `my_app::app::users_controller`
    /// lives in `app/users_controller.rs`.
    pub fn file_path(&self) -> PathBuf {
        module_file(self.module_path)
    }
}

fn module_file(module_path: &str) -> PathBuf {
    let segments: Vec<&str> = module_path.split("::").skip(1).collect();
    match segments.split_last() {
        Some((file, dirs)) => {
            let mut path: PathBuf = dirs.iter().collect();
            path.push(format!("{file}.rs"));
            path
        }
        None => PathBuf::from("lib.rs"),
    }
}

/// Loads `C` into `store`, running its decorators on first load.
pub fn load<C: Controller>(store: &MetadataStore) -> ControllerId {
    store.load::<C>()
}

/// Turns a module path into the controllers it defines.
pub trait ModuleLoader {
    fn load(&self, path: &Path, store: &MetadataStore) -> Result<Vec<ControllerId>>;
}

/// Statically known controller modules, laid out as a virtual source tree.
///
/// The manifest answers both directory listings and module loads, so
/// discovery can walk it exactly like a directory of controller files.
#[derive(Clone, Debug, Default)]
pub struct Manifest {
    modules: BTreeMap<PathBuf, Vec<ControllerModule>>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every module submitted by `#[controller]` in the final binary.
    pub fn collect() -> Self {
        inventory::iter::<ControllerModule>
            .into_iter()
            .fold(Self::new(), |manifest, module| manifest.with_module(*module))
    }

    pub fn with_module(mut self, module: ControllerModule) -> Self {
        self.modules
            .entry(module.file_path())
            .or_default()
            .push(module);
        self
    }

    pub fn module(
        self,
        module_path: &'static str,
        load: fn(&MetadataStore) -> ControllerId,
    ) -> Self {
        self.with_module(ControllerModule::new(module_path, load))
    }

    /// Registers `C` as defined in the module at `module_path`.
    pub fn controller<C: Controller>(self, module_path: &'static str) -> Self {
        self.module(module_path, load::<C>)
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.modules.keys().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn relative<'a>(path: &'a Path, dir: &Path) -> Option<&'a Path> {
    let is_root = dir
        .components()
        .all(|component| matches!(component, Component::CurDir));
    if is_root {
        Some(path)
    } else {
        path.strip_prefix(dir).ok()
    }
}

impl FileSystem for Manifest {
    fn read_dir(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        let mut entries: BTreeMap<String, EntryKind> = BTreeMap::new();
        for path in self.modules.keys() {
            let Some(rest) = relative(path, dir) else {
                continue;
            };
            let mut components = rest.components();
            let Some(first) = components.next() else {
                continue;
            };
            let name = first.as_os_str().to_string_lossy().into_owned();
            let kind = if components.next().is_some() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            entries.insert(name, kind);
        }

        if entries.is_empty() {
            return Err(GirouetteError::directory_not_found(dir));
        }
        Ok(entries
            .into_iter()
            .map(|(name, kind)| DirEntry { name, kind })
            .collect())
    }
}

impl ModuleLoader for Manifest {
    fn load(&self, path: &Path, store: &MetadataStore) -> Result<Vec<ControllerId>> {
        let modules = self
            .modules
            .get(path)
            .ok_or_else(|| GirouetteError::module_not_found(path))?;
        let mut controllers: Vec<ControllerId> =
            modules.iter().map(|module| (module.load)(store)).collect();
        controllers.sort_by_key(|id| id.name());
        controllers.dedup();
        Ok(controllers)
    }
}
