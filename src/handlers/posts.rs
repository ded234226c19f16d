//! Post and comment endpoints.
//!
//! Mutations follow one shape: validate, persist, respond, then spawn the
//! notification fanout so delivery work never sits on the response path.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::{comment_repo, post_repo, user_repo};
use crate::error::{AppError, Result};
use crate::middleware::jwt_auth::AuthUser;
use crate::models::{
    Comment, CreateCommentRequest, CreatePostRequest, FeedComment, PageQuery, Post,
};
use crate::services::feed::{self, FeedFilter};
use crate::services::interactions;
use crate::services::normalize::{normalize, ContentKind};
use crate::services::notifications::EntityKind;

const FEED_PAGE_SIZE: i64 = 10;
const COMMENT_PAGE_SIZE: i64 = 5;

/// POST /posts
pub async fn create_post(
    state: web::Data<AppState>,
    auth: AuthUser,
    body: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let content = normalize(&body.content, ContentKind::Post)?;

    // The username snapshot comes from the stored row, not the token
    // claim, which may predate a handle change.
    let author = user_repo::find_by_id(&state.db, auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let post = Post {
        id: Uuid::new_v4(),
        author: auth.id,
        author_username: author.username.clone(),
        content,
        likes: Vec::new(),
        comments: Vec::new(),
        created_at: Utc::now(),
    };

    post_repo::insert(&state.db, &post).await?;
    user_repo::append_post(&state.db, auth.id, post.id).await?;

    let notifier = state.notifier.clone();
    let fanout_content = post.content.clone();
    tokio::spawn(async move {
        notifier
            .fan_out_mentions(&fanout_content, auth.id, &auth.username, EntityKind::Post, &[])
            .await;
    });

    Ok(HttpResponse::Created().json(json!({
        "post": post,
        "message": "Post created",
    })))
}

/// POST /posts/like/{id}
pub async fn like_post(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();
    let (post, liked) = interactions::toggle_post_like(&state.db, post_id, auth.id).await?;

    if liked {
        let notifier = state.notifier.clone();
        let author = post.author;
        tokio::spawn(async move {
            notifier
                .fan_out_like(auth.id, &auth.username, author, EntityKind::Post)
                .await;
        });
    }

    let message = if liked { "Post liked" } else { "Post unliked" };
    Ok(HttpResponse::Ok().json(json!({
        "post": post,
        "liked": liked,
        "message": message,
    })))
}

/// POST /posts/comments/create/{id}
pub async fn create_comment(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();
    let content = normalize(&body.content, ContentKind::Comment)?;

    let post = post_repo::find_by_id(&state.db, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
    let author = user_repo::find_by_id(&state.db, auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let comment = Comment {
        id: Uuid::new_v4(),
        author: auth.id,
        author_username: author.username.clone(),
        post_id,
        content,
        likes: Vec::new(),
        created_at: Utc::now(),
    };

    comment_repo::insert(&state.db, &comment).await?;
    post_repo::append_comment(&state.db, post_id, comment.id).await?;

    let view = FeedComment {
        id: comment.id,
        author: comment.author,
        author_username: comment.author_username.clone(),
        post_id: comment.post_id,
        content: comment.content.clone(),
        created_at: comment.created_at,
        author_verified: author.verified,
        liked: false,
        num_likes: 0,
    };

    let notifier = state.notifier.clone();
    let post_author = post.author;
    let fanout_content = comment.content.clone();
    tokio::spawn(async move {
        notifier
            .fan_out_comment(auth.id, &auth.username, post_author)
            .await;
        notifier
            .fan_out_mentions(
                &fanout_content,
                auth.id,
                &auth.username,
                EntityKind::Comment,
                &[post_author],
            )
            .await;
    });

    Ok(HttpResponse::Created().json(json!({
        "comment": view,
        "message": "Comment created",
    })))
}

/// POST /posts/comments/like/{id}
pub async fn like_comment(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let comment_id = path.into_inner();
    let (comment, liked) =
        interactions::toggle_comment_like(&state.db, comment_id, auth.id).await?;

    if liked {
        let notifier = state.notifier.clone();
        let author = comment.author;
        tokio::spawn(async move {
            notifier
                .fan_out_like(auth.id, &auth.username, author, EntityKind::Comment)
                .await;
        });
    }

    let message = if liked { "Comment liked" } else { "Comment unliked" };
    Ok(HttpResponse::Ok().json(json!({
        "comment": comment,
        "liked": liked,
        "message": message,
    })))
}

/// GET /posts?page&limit — chronological feed of followed authors.
pub async fn following_feed(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let user = user_repo::find_by_id(&state.db, auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let (skip, limit) = query.to_skip_limit(FEED_PAGE_SIZE);
    let filter = FeedFilter::Following(user.following);

    let posts = feed::fetch_posts(&state.db, &filter, auth.id, skip, limit).await?;
    let num_posts = feed::count_posts(&state.db, &filter).await?;

    Ok(HttpResponse::Ok().json(json!({
        "posts": posts,
        "numPosts": num_posts,
    })))
}

/// GET /posts/hashtag/{tag}?page — ranked by likes, then recency.
pub async fn hashtag_feed(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let filter = FeedFilter::hashtag(&path.into_inner())?;
    let (skip, limit) = query.to_skip_limit(FEED_PAGE_SIZE);

    let posts = feed::fetch_posts(&state.db, &filter, auth.id, skip, limit).await?;
    let num_posts = feed::count_posts(&state.db, &filter).await?;

    Ok(HttpResponse::Ok().json(json!({
        "posts": posts,
        "numPosts": num_posts,
    })))
}

/// GET /posts/mention/{username}?page — ranked by likes, then recency.
pub async fn mention_feed(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let filter = FeedFilter::mention(&path.into_inner())?;
    let (skip, limit) = query.to_skip_limit(FEED_PAGE_SIZE);

    let posts = feed::fetch_posts(&state.db, &filter, auth.id, skip, limit).await?;
    let num_posts = feed::count_posts(&state.db, &filter).await?;

    Ok(HttpResponse::Ok().json(json!({
        "posts": posts,
        "numPosts": num_posts,
    })))
}

/// GET /posts/comments/{postId}?page — newest first.
pub async fn comment_feed(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();
    post_repo::find_by_id(&state.db, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let (skip, limit) = query.to_skip_limit(COMMENT_PAGE_SIZE);
    let comments = feed::fetch_comments(&state.db, post_id, auth.id, skip, limit).await?;
    let num_comments = feed::count_comments(&state.db, post_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "comments": comments,
        "numComments": num_comments,
    })))
}
