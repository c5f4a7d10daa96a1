use crate::store::Repository;
use girouette::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

pub struct UsersController {
    users: Arc<Repository<User>>,
}

impl UsersController {
    pub fn new(users: Arc<Repository<User>>) -> Self {
        Self { users }
    }
}

#[controller]
impl UsersController {
    #[get("/users", name = "users.index")]
    async fn index(&self) -> Json<Vec<User>> {
        Json(self.users.all().await)
    }

    #[get("/users/:id", name = "users.show")]
    #[where_param("id", regex = r"^\d+$")]
    async fn show(&self, #[param] id: u64) -> Result<Json<User>, StatusCode> {
        self.users.get(id).await.map(Json).ok_or(StatusCode::NOT_FOUND)
    }

    #[post("/users", name = "users.store")]
    #[route_middleware("auth")]
    async fn store(&self, #[body] input: NewUser) -> (StatusCode, Json<User>) {
        let user = self
            .users
            .insert_with(|id| User {
                id,
                name: input.name,
                email: input.email,
            })
            .await;
        tracing::info!(id = user.id, "User created");
        (StatusCode::CREATED, Json(user))
    }
}
