use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Comment;

const COMMENT_COLUMNS: &str = "id, author, author_username, post_id, content, likes, created_at";

pub async fn insert(pool: &PgPool, comment: &Comment) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO comments (id, author, author_username, post_id, content, likes, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(comment.id)
    .bind(comment.author)
    .bind(&comment.author_username)
    .bind(comment.post_id)
    .bind(&comment.content)
    .bind(&comment.likes)
    .bind(comment.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Same last-write-wins semantics as the post like set.
pub async fn set_likes(pool: &PgPool, id: Uuid, likes: &[Uuid]) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE comments SET likes = $2 WHERE id = $1")
        .bind(id)
        .bind(likes)
        .execute(pool)
        .await?;
    Ok(())
}
