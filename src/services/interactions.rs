//! Like toggling on posts and comments.
//!
//! A toggle flips the viewer's membership in the entity's like set and
//! writes the full updated set back in a single statement. A like/unlike
//! pair from one viewer restores the original set; two truly concurrent
//! toggles from the same viewer race with last-write-wins semantics.

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{comment_repo, post_repo};
use crate::error::{AppError, Result};
use crate::models::{Comment, Post};

/// Flip membership of `viewer` in `likes`; returns the resulting state
/// (true = now liked).
fn toggle(likes: &mut Vec<Uuid>, viewer: Uuid) -> bool {
    if let Some(pos) = likes.iter().position(|id| *id == viewer) {
        likes.remove(pos);
        false
    } else {
        likes.push(viewer);
        true
    }
}

pub async fn toggle_post_like(
    pool: &PgPool,
    post_id: Uuid,
    viewer_id: Uuid,
) -> Result<(Post, bool)> {
    let mut post = post_repo::find_by_id(pool, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let liked = toggle(&mut post.likes, viewer_id);
    post_repo::set_likes(pool, post.id, &post.likes).await?;

    Ok((post, liked))
}

pub async fn toggle_comment_like(
    pool: &PgPool,
    comment_id: Uuid,
    viewer_id: Uuid,
) -> Result<(Comment, bool)> {
    let mut comment = comment_repo::find_by_id(pool, comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    let liked = toggle(&mut comment.likes, viewer_id);
    comment_repo::set_likes(pool, comment.id, &comment.likes).await?;

    Ok((comment, liked))
}
