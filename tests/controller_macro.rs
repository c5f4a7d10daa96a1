use axum::body::{Body, to_bytes};
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use girouette::host::axum::AxumRouter;
use girouette::host::table::RouteTable;
use girouette::{
    ControllerId, HttpMethod, MetadataStore, ResourceAction, ResourceActions, RouterProvider,
};
use std::sync::Arc;
use tower::ServiceExt;

mod app {
    pub mod users_controller {
        use girouette::prelude::*;
        use serde::{Deserialize, Serialize};

        #[derive(Deserialize)]
        pub struct Paging {
            pub page: Option<u32>,
        }

        #[derive(Deserialize, Serialize)]
        pub struct NewUser {
            pub name: String,
        }

        pub struct UsersController;

        #[controller]
        impl UsersController {
            #[get("/users", name = "users.index")]
            async fn index(&self, #[query] paging: Paging) -> String {
                format!("page {}", paging.page.unwrap_or(1))
            }

            #[get("/users/:id", name = "users.show")]
            #[where_param("id", regex = r"^\d+$")]
            async fn show(&self, #[param] id: u64) -> String {
                format!("user {id}")
            }

            #[post("/users")]
            #[route_middleware("auth")]
            async fn store(&self, #[body] user: NewUser) -> (StatusCode, Json<NewUser>) {
                (StatusCode::CREATED, Json(user))
            }

            #[get("/legacy")]
            #[post("/legacy")]
            async fn legacy(&self) -> &'static str {
                "legacy"
            }
        }
    }

    pub mod admin {
        pub mod reports_controller {
            use girouette::prelude::*;

            pub struct ReportsController;

            #[controller]
            #[resource("/reports", name = "admin.reports")]
            #[resource_middleware([destroy], "auth")]
            impl ReportsController {
                async fn index(&self) -> &'static str {
                    "reports"
                }

                async fn show(&self, #[param] id: u32) -> String {
                    format!("report {id}")
                }

                async fn destroy(&self, #[param] _id: u32) -> StatusCode {
                    StatusCode::NO_CONTENT
                }
            }
        }
    }

    pub mod helpers {
        use girouette::prelude::*;

        pub struct HiddenController;

        #[controller]
        impl HiddenController {
            #[get("/hidden")]
            async fn hidden(&self) -> &'static str {
                "hidden"
            }
        }
    }
}

use app::admin::reports_controller::ReportsController;
use app::helpers::HiddenController;
use app::users_controller::UsersController;

async fn require_auth(request: Request, next: Next) -> Response {
    if request.headers().contains_key("authorization") {
        next.run(request).await
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

fn app() -> axum::Router {
    let mut router = AxumRouter::new()
        .controller(Arc::new(UsersController))
        .controller(Arc::new(ReportsController))
        .middleware("auth", require_auth);
    RouterProvider::new().start(&mut router).unwrap();
    router.into_router()
}

async fn send(request: Request) -> (StatusCode, String) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn request(method: &str, uri: &str) -> Request {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[test]
fn test_discovers_controllers_under_app() {
    let mut table = RouteTable::new();
    let report = RouterProvider::new().start(&mut table).unwrap();

    assert_eq!(report.controllers, 2);
    assert_eq!(report.resources, 1);

    let patterns: Vec<&str> = table.routes().iter().map(|r| r.pattern.as_str()).collect();
    assert_eq!(patterns, vec!["/users", "/users/:id", "/users", "/legacy"]);
    assert!(table.routes().iter().all(|r| r.pattern != "/hidden"));

    let resource = &table.resources()[0];
    assert_eq!(resource.pattern, "/reports");
    assert_eq!(resource.name.as_deref(), Some("admin.reports"));
    assert_eq!(
        resource.middleware[0].actions,
        ResourceActions::Only(vec![ResourceAction::Destroy])
    );
}

#[test]
fn test_attributes_apply_bottom_up() {
    let store = MetadataStore::new();
    let id = store.load::<UsersController>();
    let metadata = store.get(&id).unwrap();

    let show = metadata.routes().get("show").unwrap();
    assert_eq!(show.pattern(), Some("/users/:id"));
    assert_eq!(show.name(), Some("users.show"));
    assert_eq!(show.constraints()[0].key, "id");

    // The attribute nearest the fn is applied first and its verb sticks.
    let legacy = metadata.routes().get("legacy").unwrap();
    assert_eq!(legacy.method(), Some(HttpMethod::Post));

    assert!(!store.is_loaded(&ControllerId::of::<HiddenController>()));
}

#[tokio::test]
async fn test_generated_endpoints_extract_params() {
    let (status, body) = send(request("GET", "/users?page=3")).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "page 3"));

    let (status, body) = send(request("GET", "/users/42")).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "user 42"));

    let (status, _) = send(request("GET", "/users/ada")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_route_middleware_guards_store() {
    let (status, _) = send(
        Request::builder()
            .method("POST")
            .uri("/users")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"ada"}"#))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        Request::builder()
            .method("POST")
            .uri("/users")
            .header("content-type", "application/json")
            .header("authorization", "Bearer token")
            .body(Body::from(r#"{"name":"ada"}"#))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, r#"{"name":"ada"}"#);
}

#[tokio::test]
async fn test_resource_actions_and_middleware() {
    let (status, body) = send(request("GET", "/reports")).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "reports"));

    let (status, body) = send(request("GET", "/reports/7")).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "report 7"));

    let (status, _) = send(request("DELETE", "/reports/7")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(request("PUT", "/reports/7")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
