//! Directed follow graph maintenance.
//!
//! An edge is stored redundantly on both endpoints and maintained by two
//! separate writes: the follower's `following` array first, then the
//! target's `followers` array. No transaction spans the two; a failure
//! between them leaves a one-sided edge (detectable, not auto-repaired).

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::user_repo;
use crate::error::{AppError, Result};
use crate::models::User;

/// Guard checks that don't require the target row.
fn ensure_distinct(user_id: Uuid, target_id: Uuid) -> Result<()> {
    if user_id == target_id {
        return Err(AppError::Conflict("Cannot follow yourself".to_string()));
    }
    Ok(())
}

/// Create the follow edge user -> target. Returns the follower record so
/// the caller can compose the fanout text.
pub async fn follow(pool: &PgPool, user_id: Uuid, target_id: Uuid) -> Result<User> {
    ensure_distinct(user_id, target_id)?;

    let user = user_repo::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    user_repo::find_by_id(pool, target_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user.following.contains(&target_id) {
        return Err(AppError::Conflict("Already following".to_string()));
    }

    // Follower-side write first; the mirror write only runs once it
    // succeeded.
    user_repo::append_following(pool, user_id, target_id).await?;
    user_repo::append_follower(pool, target_id, user_id).await?;

    Ok(user)
}

/// Remove the follow edge user -> target. Mirrors `follow`, no fanout.
pub async fn unfollow(pool: &PgPool, user_id: Uuid, target_id: Uuid) -> Result<User> {
    ensure_distinct(user_id, target_id)?;

    let user = user_repo::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    user_repo::find_by_id(pool, target_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !user.following.contains(&target_id) {
        return Err(AppError::Conflict("Not following".to_string()));
    }

    user_repo::remove_following(pool, user_id, target_id).await?;
    user_repo::remove_follower(pool, target_id, user_id).await?;

    Ok(user)
}
