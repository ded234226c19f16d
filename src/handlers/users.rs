//! User graph, profile, and notification-inbox endpoints.

use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::user_repo;
use crate::error::{AppError, Result};
use crate::middleware::jwt_auth::AuthUser;
use crate::models::{PageQuery, Profile};
use crate::services::feed::{self, FeedFilter};
use crate::services::follow;

const PROFILE_PAGE_SIZE: i64 = 10;

/// POST /users/follow/{id}
pub async fn follow_user(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let target_id = path.into_inner();
    let user = follow::follow(&state.db, auth.id, target_id).await?;

    let notifier = state.notifier.clone();
    let username = user.username.clone();
    tokio::spawn(async move {
        notifier.fan_out_follow(&username, target_id).await;
    });

    Ok(HttpResponse::Ok().json(json!({ "message": "Followed" })))
}

/// POST /users/unfollow/{id}
pub async fn unfollow_user(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let target_id = path.into_inner();
    follow::unfollow(&state.db, auth.id, target_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Unfollowed" })))
}

/// GET /users/following — usernames the caller follows.
pub async fn following_list(
    state: web::Data<AppState>,
    auth: AuthUser,
) -> Result<HttpResponse> {
    let user = user_repo::find_by_id(&state.db, auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let usernames = user_repo::usernames_by_ids(&state.db, &user.following).await?;

    Ok(HttpResponse::Ok().json(json!({ "following": usernames })))
}

/// GET /users/profile/{username}
pub async fn profile(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user = user_repo::find_by_username(&state.db, &path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let profile = Profile::from_user(user, auth.id);

    Ok(HttpResponse::Ok().json(json!({
        "user": profile,
        "message": "User found",
    })))
}

/// GET /users/posts/{username}?page — a user's own posts, newest first.
pub async fn user_posts(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let user = user_repo::find_by_username(&state.db, &path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let (skip, limit) = query.to_skip_limit(PROFILE_PAGE_SIZE);
    let filter = FeedFilter::Ids(user.posts);

    let posts = feed::fetch_posts(&state.db, &filter, auth.id, skip, limit).await?;
    let num_posts = feed::count_posts(&state.db, &filter).await?;

    Ok(HttpResponse::Ok().json(json!({
        "posts": posts,
        "numPosts": num_posts,
    })))
}

/// GET /users/unreadNotifications/{username}
///
/// Only the owner may read their inbox; the path username must match the
/// bearer identity.
pub async fn unread_notifications(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let username = path.into_inner();
    if username != auth.username {
        return Err(AppError::Unauthorized("Not your notifications".to_string()));
    }

    let user = user_repo::find_by_id(&state.db, auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(json!({
        "unreadNotifications": user.unread_notifications,
    })))
}

/// PATCH /users/notifications/{username} — mark all as read.
pub async fn clear_notifications(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let username = path.into_inner();
    if username != auth.username {
        return Err(AppError::Unauthorized("Not your notifications".to_string()));
    }

    user_repo::clear_notifications(&state.db, auth.id).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Notifications cleared" })))
}
