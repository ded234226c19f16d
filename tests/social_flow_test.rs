// End-to-end social flows against a real Postgres.
//
// Run with a disposable database:
//   DATABASE_URL=postgres://... cargo test -- --ignored

use actix_web::{test, web, App};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use pulse_service::app_state::AppState;
use pulse_service::config::{AppConfig, Config, DatabaseConfig};
use pulse_service::db::{self, post_repo, user_repo};
use pulse_service::error::AppError;
use pulse_service::models::{Post, User};
use pulse_service::services::feed::{self, FeedFilter};
use pulse_service::services::follow;
use pulse_service::services::interactions;
use pulse_service::routes::configure_routes;
use pulse_service::security::jwt;
use pulse_service::services::notifications::{EntityKind, Notifier};
use pulse_service::ws::ConnectionRegistry;

async fn setup_pool() -> PgPool {
    let cfg = DatabaseConfig {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for ignored tests"),
        max_connections: 5,
        min_connections: 1,
    };
    db::init_pool(&cfg).await.expect("failed to init pool")
}

async fn create_test_user(pool: &PgPool) -> User {
    let id = Uuid::new_v4();
    let username = format!("user_{}", id.simple());
    let user = User {
        id,
        username: username.clone(),
        email: format!("{username}@example.com"),
        password_hash: "test-hash".to_string(),
        verified: false,
        following: Vec::new(),
        followers: Vec::new(),
        posts: Vec::new(),
        unread_notifications: Vec::new(),
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, verified, following, followers, \
         posts, unread_notifications, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.verified)
    .bind(&user.following)
    .bind(&user.followers)
    .bind(&user.posts)
    .bind(&user.unread_notifications)
    .bind(user.created_at)
    .execute(pool)
    .await
    .expect("failed to insert test user");

    user
}

async fn create_test_post(pool: &PgPool, author: &User, content: &str) -> Post {
    let post = Post {
        id: Uuid::new_v4(),
        author: author.id,
        author_username: author.username.clone(),
        content: content.to_string(),
        likes: Vec::new(),
        comments: Vec::new(),
        created_at: Utc::now(),
    };
    post_repo::insert(pool, &post).await.expect("failed to insert post");
    user_repo::append_post(pool, author.id, post.id)
        .await
        .expect("failed to append post");
    post
}

fn notifier(pool: &PgPool) -> Notifier {
    Notifier::new(pool.clone(), ConnectionRegistry::new())
}

fn app_state(pool: &PgPool) -> AppState {
    let registry = ConnectionRegistry::new();
    AppState {
        db: pool.clone(),
        config: Arc::new(Config {
            app: AppConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL").unwrap(),
                max_connections: 5,
                min_connections: 1,
            },
            jwt_secret: "integration-test-secret".to_string(),
        }),
        registry: registry.clone(),
        notifier: Notifier::new(pool.clone(), registry),
    }
}

#[actix_web::test]
#[ignore] // Requires database
async fn test_like_toggle_pair_restores_state() {
    let pool = setup_pool().await;
    let author = create_test_user(&pool).await;
    let viewer = create_test_user(&pool).await;
    let post = create_test_post(&pool, &author, "a perfectly ordinary post").await;

    let (updated, liked) = interactions::toggle_post_like(&pool, post.id, viewer.id)
        .await
        .unwrap();
    assert!(liked);
    assert!(updated.likes.contains(&viewer.id));

    let (updated, liked) = interactions::toggle_post_like(&pool, post.id, viewer.id)
        .await
        .unwrap();
    assert!(!liked);
    assert!(updated.likes.is_empty());
}

#[actix_web::test]
#[ignore] // Requires database
async fn test_follow_twice_is_a_conflict() {
    let pool = setup_pool().await;
    let alice = create_test_user(&pool).await;
    let bob = create_test_user(&pool).await;

    follow::follow(&pool, alice.id, bob.id).await.unwrap();

    let err = follow::follow(&pool, alice.id, bob.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Both sides of the edge exist.
    let alice_row = user_repo::find_by_id(&pool, alice.id).await.unwrap().unwrap();
    let bob_row = user_repo::find_by_id(&pool, bob.id).await.unwrap().unwrap();
    assert!(alice_row.following.contains(&bob.id));
    assert!(bob_row.followers.contains(&alice.id));

    // Unfollow removes both sides; unfollowing again conflicts.
    follow::unfollow(&pool, alice.id, bob.id).await.unwrap();
    let err = follow::unfollow(&pool, alice.id, bob.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[actix_web::test]
#[ignore] // Requires database
async fn test_hashtag_feed_matches_whole_words_only() {
    let pool = setup_pool().await;
    let author = create_test_user(&pool).await;
    let viewer = create_test_user(&pool).await;

    let tag = format!("tag{}", Uuid::new_v4().simple());
    create_test_post(&pool, &author, &format!("counting down to #{tag} day")).await;
    create_test_post(&pool, &author, &format!("unrelated #{tag}pad content here")).await;

    let filter = FeedFilter::hashtag(&tag).unwrap();
    let posts = feed::fetch_posts(&pool, &filter, viewer.id, 0, 10).await.unwrap();

    assert_eq!(posts.len(), 1);
    assert!(posts[0].content.contains(&format!("#{tag} ")));
    assert_eq!(feed::count_posts(&pool, &filter).await.unwrap(), 1);
}

#[actix_web::test]
#[ignore] // Requires database
async fn test_feed_pages_are_disjoint_and_exhaustive() {
    let pool = setup_pool().await;
    let author = create_test_user(&pool).await;
    let viewer = create_test_user(&pool).await;

    for i in 0..15 {
        create_test_post(&pool, &author, &format!("numbered filler post {i}")).await;
    }

    let author_row = user_repo::find_by_id(&pool, author.id).await.unwrap().unwrap();
    let filter = FeedFilter::Ids(author_row.posts);

    let page1 = feed::fetch_posts(&pool, &filter, viewer.id, 0, 10).await.unwrap();
    let page2 = feed::fetch_posts(&pool, &filter, viewer.id, 10, 10).await.unwrap();

    assert_eq!(page1.len(), 10);
    assert_eq!(page2.len(), 5);
    assert_eq!(feed::count_posts(&pool, &filter).await.unwrap(), 15);

    for post in &page2 {
        assert!(page1.iter().all(|p| p.id != post.id));
    }
}

#[actix_web::test]
#[ignore] // Requires database
async fn test_feed_num_likes_tracks_like_set_at_query_time() {
    let pool = setup_pool().await;
    let author = create_test_user(&pool).await;
    let fan_a = create_test_user(&pool).await;
    let fan_b = create_test_user(&pool).await;

    let tag = format!("tag{}", Uuid::new_v4().simple());
    let hot =
        create_test_post(&pool, &author, &format!("everyone is talking about #{tag} now")).await;
    let cold = create_test_post(&pool, &author, &format!("a quieter take on #{tag} here")).await;

    interactions::toggle_post_like(&pool, hot.id, fan_a.id).await.unwrap();
    interactions::toggle_post_like(&pool, hot.id, fan_b.id).await.unwrap();
    interactions::toggle_post_like(&pool, cold.id, fan_a.id).await.unwrap();

    // Hashtag retrieval ranks by like count; counts and liked are derived
    // from the live like set, viewer-relative.
    let filter = FeedFilter::hashtag(&tag).unwrap();
    let posts = feed::fetch_posts(&pool, &filter, fan_a.id, 0, 10).await.unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, hot.id);
    assert_eq!(posts[0].num_likes, 2);
    assert!(posts[0].liked);
    assert_eq!(posts[1].id, cold.id);
    assert_eq!(posts[1].num_likes, 1);
    assert!(posts[1].liked);

    // An unlike is visible on the next query.
    interactions::toggle_post_like(&pool, hot.id, fan_b.id).await.unwrap();
    let posts = feed::fetch_posts(&pool, &filter, fan_b.id, 0, 10).await.unwrap();
    let hot_row = posts.iter().find(|p| p.id == hot.id).unwrap();
    assert_eq!(hot_row.num_likes, 1);
    assert!(!hot_row.liked);
}

#[actix_web::test]
#[ignore] // Requires database
async fn test_post_author_username_snapshots_the_stored_row() {
    let pool = setup_pool().await;
    let author = create_test_user(&pool).await;

    jwt::initialize_secret("integration-test-secret").unwrap();
    // The claim carries an outdated handle; the stored row wins.
    let token = jwt::generate_token(author.id, "stale_handle").unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&pool)))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/posts")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "content": "a perfectly ordinary post" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["post"]["authorUsername"], json!(author.username));
    assert_eq!(body["message"], json!("Post created"));
}

#[actix_web::test]
#[ignore] // Requires database
async fn test_self_like_produces_no_notification() {
    let pool = setup_pool().await;
    let author = create_test_user(&pool).await;

    notifier(&pool)
        .fan_out_like(author.id, &author.username, author.id, EntityKind::Post)
        .await;

    let row = user_repo::find_by_id(&pool, author.id).await.unwrap().unwrap();
    assert!(row.unread_notifications.is_empty());
}

#[actix_web::test]
#[ignore] // Requires database
async fn test_like_by_another_user_notifies_the_author() {
    let pool = setup_pool().await;
    let author = create_test_user(&pool).await;
    let fan = create_test_user(&pool).await;

    notifier(&pool)
        .fan_out_like(fan.id, &fan.username, author.id, EntityKind::Post)
        .await;

    let row = user_repo::find_by_id(&pool, author.id).await.unwrap().unwrap();
    assert_eq!(
        row.unread_notifications,
        vec![format!("@{} liked your post.", fan.username)]
    );
}

#[actix_web::test]
#[ignore] // Requires database
async fn test_mention_fanout_skips_actor_and_unknown_handles() {
    let pool = setup_pool().await;
    let author = create_test_user(&pool).await;
    let mentioned = create_test_user(&pool).await;

    let content = format!(
        "shout out to @{} and @{} and @nobody_by_this_name",
        mentioned.username, author.username
    );

    notifier(&pool)
        .fan_out_mentions(&content, author.id, &author.username, EntityKind::Post, &[])
        .await;

    let row = user_repo::find_by_id(&pool, mentioned.id).await.unwrap().unwrap();
    assert_eq!(
        row.unread_notifications,
        vec![format!("@{} mentioned you in a post.", author.username)]
    );

    // The author never hears about their own mention.
    let row = user_repo::find_by_id(&pool, author.id).await.unwrap().unwrap();
    assert!(row.unread_notifications.is_empty());
}

#[actix_web::test]
#[ignore] // Requires database
async fn test_comment_fanout_excludes_already_notified_author() {
    let pool = setup_pool().await;
    let post_author = create_test_user(&pool).await;
    let commenter = create_test_user(&pool).await;

    let n = notifier(&pool);
    n.fan_out_comment(commenter.id, &commenter.username, post_author.id)
        .await;

    // Mention of the post author inside the same comment is suppressed;
    // they already got the comment notification.
    let content = format!("replying to @{}", post_author.username);
    n.fan_out_mentions(
        &content,
        commenter.id,
        &commenter.username,
        EntityKind::Comment,
        &[post_author.id],
    )
    .await;

    let row = user_repo::find_by_id(&pool, post_author.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        row.unread_notifications,
        vec![format!("@{} commented on your post.", commenter.username)]
    );
}

#[actix_web::test]
#[ignore] // Requires database
async fn test_clearing_notifications_empties_the_unread_list() {
    let pool = setup_pool().await;
    let user = create_test_user(&pool).await;
    let fan = create_test_user(&pool).await;

    let n = notifier(&pool);
    n.fan_out_follow(&fan.username, user.id).await;
    n.fan_out_like(fan.id, &fan.username, user.id, EntityKind::Post)
        .await;

    let row = user_repo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(row.unread_notifications.len(), 2);
    // Delivery order is insertion order.
    assert!(row.unread_notifications[0].contains("started following you"));

    user_repo::clear_notifications(&pool, user.id).await.unwrap();
    let row = user_repo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert!(row.unread_notifications.is_empty());
}
