use crate::app::posts_controller::Post;
use crate::app::users_controller::User;
use crate::store::Repository;
use girouette::prelude::*;
use serde::Serialize;
use serde_json::json;

#[derive(Serialize)]
pub struct Stats {
    pub users: usize,
    pub posts: usize,
}

pub struct StatsController {
    users: Arc<Repository<User>>,
    posts: Arc<Repository<Post>>,
}

impl StatsController {
    pub fn new(users: Arc<Repository<User>>, posts: Arc<Repository<Post>>) -> Self {
        Self { users, posts }
    }
}

#[controller]
impl StatsController {
    #[get("/admin/stats", name = "admin.stats")]
    #[route_middleware(MiddlewareRef::named("audit").with_args(json!({ "label": "admin.stats" })))]
    #[route_middleware("auth")]
    async fn show(&self) -> Json<Stats> {
        Json(Stats {
            users: self.users.len().await,
            posts: self.posts.len().await,
        })
    }
}
