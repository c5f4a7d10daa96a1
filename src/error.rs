use crate::host::HostError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GirouetteError>;

#[derive(Debug, Error)]
pub enum GirouetteError {
    #[error("Directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Module not found: {}", path.display())]
    ModuleNotFound { path: PathBuf },

    #[error("Route {controller}.{method} was never given an HTTP method and pattern")]
    IncompleteRoute {
        controller: &'static str,
        method: String,
    },

    #[error("Host router rejected registration: {0}")]
    Host(#[from] HostError),
}

impl GirouetteError {
    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DirectoryNotFound { path: path.into() }
    }

    pub fn module_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ModuleNotFound { path: path.into() }
    }
}
