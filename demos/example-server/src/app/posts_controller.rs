use crate::store::Repository;
use girouette::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub author: String,
}

#[derive(Deserialize)]
pub struct PostInput {
    pub title: String,
    pub body: String,
    pub author: String,
}

#[derive(Deserialize)]
pub struct PostFilter {
    pub author: Option<String>,
}

pub struct PostsController {
    posts: Arc<Repository<Post>>,
}

impl PostsController {
    pub fn new(posts: Arc<Repository<Post>>) -> Self {
        Self { posts }
    }
}

/// `/posts` as a resource: index, store, show, update and destroy. Writes
/// require the `auth` middleware.
#[controller]
#[resource("/posts", name = "blog.posts")]
#[resource_middleware([store, update, destroy], "auth")]
impl PostsController {
    async fn index(&self, #[query] filter: PostFilter) -> Json<Vec<Post>> {
        let posts = self.posts.all().await;
        Json(match filter.author {
            Some(author) => posts.into_iter().filter(|post| post.author == author).collect(),
            None => posts,
        })
    }

    async fn store(&self, #[body] input: PostInput) -> (StatusCode, Json<Post>) {
        let post = self
            .posts
            .insert_with(|id| Post {
                id,
                title: input.title,
                body: input.body,
                author: input.author,
            })
            .await;
        (StatusCode::CREATED, Json(post))
    }

    async fn show(&self, #[param] id: u64) -> Result<Json<Post>, StatusCode> {
        self.posts.get(id).await.map(Json).ok_or(StatusCode::NOT_FOUND)
    }

    async fn update(&self, #[param] id: u64, #[body] input: PostInput) -> Result<Json<Post>, StatusCode> {
        let post = Post {
            id,
            title: input.title,
            body: input.body,
            author: input.author,
        };
        self.posts
            .replace(id, post)
            .await
            .map(Json)
            .ok_or(StatusCode::NOT_FOUND)
    }

    async fn destroy(&self, #[param] id: u64) -> StatusCode {
        match self.posts.remove(id).await {
            Some(_) => StatusCode::NO_CONTENT,
            None => StatusCode::NOT_FOUND,
        }
    }
}
