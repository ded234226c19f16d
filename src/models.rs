use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User row. Graph edges are stored redundantly on both endpoints and the
/// unread notification list lives inline, in delivery order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub verified: bool,
    pub following: Vec<Uuid>,
    pub followers: Vec<Uuid>,
    pub posts: Vec<Uuid>,
    pub unread_notifications: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Post row. `author_username` is a snapshot captured at creation time and
/// never re-resolved; the author's `verified` flag is joined live at read
/// time instead.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub author: Uuid,
    pub author_username: String,
    pub content: String,
    pub likes: Vec<Uuid>,
    pub comments: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Comment row, same snapshot semantics as Post.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub author: Uuid,
    pub author_username: String,
    pub post_id: Uuid,
    pub content: String,
    pub likes: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Post annotated for a specific viewer: live `author_verified`, derived
/// `liked` and `num_likes`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    pub id: Uuid,
    pub author: Uuid,
    pub author_username: String,
    pub content: String,
    pub comments: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub author_verified: bool,
    pub liked: bool,
    pub num_likes: i64,
}

/// Comment annotated for a specific viewer.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FeedComment {
    pub id: Uuid,
    pub author: Uuid,
    pub author_username: String,
    pub post_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author_verified: bool,
    pub liked: bool,
    pub num_likes: i64,
}

/// Public profile view, viewer-relative follow status attached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub verified: bool,
    pub posts: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub followers: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub is_following: bool,
}

impl Profile {
    pub fn from_user(user: User, viewer_id: Uuid) -> Self {
        let is_following = user.followers.contains(&viewer_id);
        Profile {
            id: user.id,
            username: user.username,
            email: user.email,
            verified: user.verified,
            posts: user.posts,
            following: user.following,
            followers: user.followers,
            created_at: user.created_at,
            is_following,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

/// Page-based pagination query (`?page=1&limit=10`).
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Translate page/limit into skip/limit, clamping to sane bounds.
    pub fn to_skip_limit(&self, default_limit: i64) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, 50);
        ((page - 1) * limit, limit)
    }
}
