use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;

const USER_COLUMNS: &str = "id, username, email, password_hash, verified, \
     following, followers, posts, unread_notifications, created_at";

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
}

/// Usernames for a set of user ids, used by the following list endpoint.
pub async fn usernames_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await
}

/// Record a newly created post on its author's document.
pub async fn append_post(pool: &PgPool, user_id: Uuid, post_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET posts = array_append(posts, $2) WHERE id = $1")
        .bind(user_id)
        .bind(post_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// One side of the follow edge: `user_id` starts following `target_id`.
pub async fn append_following(
    pool: &PgPool,
    user_id: Uuid,
    target_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET following = array_append(following, $2) WHERE id = $1")
        .bind(user_id)
        .bind(target_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Other side of the follow edge: `user_id` gains follower `follower_id`.
pub async fn append_follower(
    pool: &PgPool,
    user_id: Uuid,
    follower_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET followers = array_append(followers, $2) WHERE id = $1")
        .bind(user_id)
        .bind(follower_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn remove_following(
    pool: &PgPool,
    user_id: Uuid,
    target_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET following = array_remove(following, $2) WHERE id = $1")
        .bind(user_id)
        .bind(target_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn remove_follower(
    pool: &PgPool,
    user_id: Uuid,
    follower_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET followers = array_remove(followers, $2) WHERE id = $1")
        .bind(user_id)
        .bind(follower_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Durable append to the unread list; insertion order is delivery order.
/// Returns false when the recipient row no longer exists.
pub async fn append_notification(
    pool: &PgPool,
    user_id: Uuid,
    text: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET unread_notifications = array_append(unread_notifications, $2) \
         WHERE id = $1",
    )
    .bind(user_id)
    .bind(text)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn clear_notifications(pool: &PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET unread_notifications = '{}' WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
