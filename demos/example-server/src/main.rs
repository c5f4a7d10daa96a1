use girouette::host::table::RouteTable;
use girouette::prelude::*;
use tower_http::trace::TraceLayer;

mod app;
mod store;

use app::admin::stats_controller::StatsController;
use app::posts_controller::PostsController;
use app::users_controller::UsersController;
use store::Repository;

async fn auth(request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("Bearer "));
    if authorized {
        next.run(request).await
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn audit(request: Request, next: Next) -> Response {
    let label = request
        .extensions()
        .get::<MiddlewareArgs>()
        .and_then(|MiddlewareArgs(args)| args.get("label"))
        .and_then(|label| label.as_str())
        .unwrap_or("unlabelled")
        .to_owned();
    let response = next.run(request).await;
    tracing::info!(route = %label, status = %response.status(), "audit");
    response
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    tracing::info!("🚀 Starting Example Server...");

    // 1. Print what discovery finds
    let mut table = RouteTable::new();
    RouterProvider::new().start(&mut table)?;
    tracing::info!("Routes:\n{}", table);

    // 2. Wire controllers and middleware into the axum host
    let users = Arc::new(Repository::new());
    let posts = Arc::new(Repository::new());

    let mut router = AxumRouter::new()
        .controller(Arc::new(UsersController::new(users.clone())))
        .controller(Arc::new(PostsController::new(posts.clone())))
        .controller(Arc::new(StatsController::new(users, posts)))
        .middleware("auth", auth)
        .middleware("audit", audit);

    // 3. Register every discovered controller
    let report = RouterProvider::new().start(&mut router)?;
    tracing::info!(
        "Registered {} routes and {} resources from {} controllers",
        report.routes,
        report.resources,
        report.controllers
    );

    let app = router.into_router().layer(TraceLayer::new_for_http());

    // 4. Start server with graceful shutdown
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("✅ Server running on http://127.0.0.1:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("🛑 Initiating graceful shutdown...");
        })
        .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}
