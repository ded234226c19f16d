use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Post;

const POST_COLUMNS: &str = "id, author, author_username, content, likes, comments, created_at";

pub async fn insert(pool: &PgPool, post: &Post) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO posts (id, author, author_username, content, likes, comments, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(post.id)
    .bind(post.author)
    .bind(&post.author_username)
    .bind(&post.content)
    .bind(&post.likes)
    .bind(&post.comments)
    .bind(post.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Write the full like set back in one statement. Last write wins under a
/// concurrent double-toggle from the same viewer.
pub async fn set_likes(pool: &PgPool, id: Uuid, likes: &[Uuid]) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE posts SET likes = $2 WHERE id = $1")
        .bind(id)
        .bind(likes)
        .execute(pool)
        .await?;
    Ok(())
}

/// Append-only comment list maintenance.
pub async fn append_comment(
    pool: &PgPool,
    post_id: Uuid,
    comment_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE posts SET comments = array_append(comments, $2) WHERE id = $1")
        .bind(post_id)
        .bind(comment_id)
        .execute(pool)
        .await?;
    Ok(())
}
