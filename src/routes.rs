//! Route configuration
//!
//! Centralized route setup; the post and user scopes sit behind the JWT
//! middleware, the WebSocket endpoint authenticates itself (query-param
//! token), and the health probe is public.

use actix_web::web;

use crate::handlers;
use crate::middleware::jwt_auth::JwtAuth;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health::health_check))
        .route("/ws", web::get().to(handlers::ws::notification_ws))
        .service(
            web::scope("/posts")
                .wrap(JwtAuth)
                .route("", web::post().to(handlers::posts::create_post))
                .route("", web::get().to(handlers::posts::following_feed))
                .route("/like/{id}", web::post().to(handlers::posts::like_post))
                .route(
                    "/comments/create/{id}",
                    web::post().to(handlers::posts::create_comment),
                )
                .route(
                    "/comments/like/{id}",
                    web::post().to(handlers::posts::like_comment),
                )
                .route(
                    "/comments/{post_id}",
                    web::get().to(handlers::posts::comment_feed),
                )
                .route(
                    "/hashtag/{tag}",
                    web::get().to(handlers::posts::hashtag_feed),
                )
                .route(
                    "/mention/{username}",
                    web::get().to(handlers::posts::mention_feed),
                ),
        )
        .service(
            web::scope("/users")
                .wrap(JwtAuth)
                .route("/follow/{id}", web::post().to(handlers::users::follow_user))
                .route(
                    "/unfollow/{id}",
                    web::post().to(handlers::users::unfollow_user),
                )
                .route(
                    "/following",
                    web::get().to(handlers::users::following_list),
                )
                .route(
                    "/profile/{username}",
                    web::get().to(handlers::users::profile),
                )
                .route(
                    "/posts/{username}",
                    web::get().to(handlers::users::user_posts),
                )
                .route(
                    "/unreadNotifications/{username}",
                    web::get().to(handlers::users::unread_notifications),
                )
                .route(
                    "/notifications/{username}",
                    web::patch().to(handlers::users::clear_notifications),
                ),
        );
}
