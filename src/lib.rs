//! # Girouette
//!
//! Decorator-style routing for Rust web applications.
//!
//! Controllers declare their routes next to their handlers. The declarations
//! are collected into a per-controller metadata store, and a single discovery
//! pass at startup replays them into the host router.
//!
//! ## Features
//!
//! - **Route decorators**: `#[get]`, `#[post]`, `#[put]`, `#[patch]`, `#[delete]`, `#[any]`
//! - **Parameter constraints**: `#[where_param]` with literal, regex or predicate matchers
//! - **Middleware**: per route with `#[route_middleware]`, per resource action with `#[resource_middleware]`
//! - **Resources**: `#[resource]` expands into the seven conventional CRUD actions
//! - **Discovery**: every `#[controller]` under `app/` is registered by [`RouterProvider::start`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! // src/app/users_controller.rs
//! use girouette::prelude::*;
//!
//! pub struct UsersController;
//!
//! #[controller]
//! impl UsersController {
//!     #[get("/users", name = "users.index")]
//!     async fn index(&self) -> Json<Vec<String>> {
//!         Json(vec!["ada".into()])
//!     }
//!
//!     #[get("/users/:id")]
//!     #[where_param("id", regex = r"^\d+$")]
//!     async fn show(&self, #[param] id: u64) -> String {
//!         format!("user {id}")
//!     }
//! }
//!
//! // src/main.rs
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut router = AxumRouter::new().controller(Arc::new(UsersController));
//!     RouterProvider::new().start(&mut router)?;
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, router.into_router()).await?;
//!     Ok(())
//! }
//! ```

pub mod controller;
pub mod decorators;
pub mod discovery;
pub mod error;
pub mod host;
pub mod metadata;
pub mod provider;

// Re-export core types
pub use controller::Controller;
pub use decorators::{
    any, delete, get, patch, post, put, resource, resource_middleware, route_middleware,
    where_param,
};
pub use discovery::{Discovery, DiscoveryConfig, DiscoveryReport, Manifest};
pub use error::{GirouetteError, Result};
pub use metadata::{
    ControllerId, Decorate, HttpMethod, Matcher, MetadataStore, MiddlewareRef, MiddlewareSpec,
    ResourceAction, ResourceActions,
};
pub use provider::RouterProvider;

// Re-export macros
pub use girouette_macro::{body, controller, param, query};

/// Attribute forms of the decorators, for use inside `#[controller]`.
///
/// They share their names with the builder functions at the crate root and
/// live in the macro namespace, so `use girouette::get;` brings in both.
pub use girouette_macro::{
    any, delete, get, patch, post, put, resource, resource_middleware, route_middleware,
    where_param,
};

// Re-export commonly used types from dependencies
pub use axum;
#[doc(hidden)]
pub use inventory;

/// Prelude module for convenient imports
///
/// ```
/// use girouette::prelude::*;
/// ```
pub mod prelude {
    pub use crate::controller::Controller;
    pub use crate::discovery::{Discovery, DiscoveryConfig, Manifest};
    pub use crate::error::GirouetteError;
    pub use crate::host::axum::{AxumMiddleware, AxumRouter, MiddlewareArgs};
    pub use crate::host::table::RouteTable;
    pub use crate::host::{HostError, HostRouter};
    pub use crate::metadata::{
        Decorate, HttpMethod, Matcher, MetadataStore, MiddlewareRef, ResourceAction,
        ResourceActions,
    };
    pub use crate::provider::RouterProvider;
    pub use crate::{
        any, body, controller, delete, get, param, patch, post, put, query, resource,
        resource_middleware, route_middleware, where_param,
    };
    pub use axum::{
        Json, Router,
        extract::{Path, Query, Request},
        http::StatusCode,
        middleware::Next,
        response::{IntoResponse, Response},
    };
    pub use std::sync::Arc;
}
