//! Feed composition.
//!
//! Every feed shape is one aggregation statement with a fixed stage order:
//! filter -> join the author's live `verified` flag -> derive the
//! viewer-relative `liked` and `num_likes` fields -> sort -> paginate.
//! A companion count query shares the filter. Nothing here mutates state.

use regex::Regex;
use sqlx::PgPool;
use std::sync::LazyLock;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{FeedComment, FeedPost};

/// Hashtags and handles arriving as path parameters are spliced into a
/// SQL regex; only word characters are admitted.
static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+$").expect("Invalid token regex"));

/// Filter predicate of a post feed. Construction validates any
/// caller-supplied token.
#[derive(Debug, Clone)]
pub enum FeedFilter {
    /// Posts authored by anyone in the viewer's following set.
    Following(Vec<Uuid>),
    /// Posts containing `#tag` as a whole word, case-insensitive.
    Hashtag(String),
    /// Posts containing `@handle` as a whole word, case-insensitive.
    Mention(String),
    /// Posts from an explicit id set (profile feed).
    Ids(Vec<Uuid>),
}

impl FeedFilter {
    pub fn hashtag(tag: &str) -> Result<Self> {
        if !TOKEN_REGEX.is_match(tag) {
            return Err(AppError::Validation("Invalid hashtag".to_string()));
        }
        Ok(FeedFilter::Hashtag(tag.to_string()))
    }

    pub fn mention(handle: &str) -> Result<Self> {
        if !TOKEN_REGEX.is_match(handle) {
            return Err(AppError::Validation("Invalid username".to_string()));
        }
        Ok(FeedFilter::Mention(handle.to_string()))
    }

    /// WHERE fragment with the filter's single bind at `$idx`.
    ///
    /// `\M` is the Postgres end-of-word boundary: `#launch\M` matches
    /// `#launch` but not `#launchpad`.
    fn where_clause(&self, idx: usize) -> String {
        match self {
            FeedFilter::Following(_) => format!("p.author = ANY(${idx})"),
            FeedFilter::Hashtag(_) => format!(r"p.content ~* ('#' || ${idx} || '\M')"),
            FeedFilter::Mention(_) => format!(r"p.content ~* ('@' || ${idx} || '\M')"),
            FeedFilter::Ids(_) => format!("p.id = ANY(${idx})"),
        }
    }

    /// Following and profile feeds are chronological; hashtag and mention
    /// retrieval ranks by like count, newest first among ties.
    fn order_clause(&self) -> &'static str {
        match self {
            FeedFilter::Following(_) | FeedFilter::Ids(_) => "p.created_at DESC",
            FeedFilter::Hashtag(_) | FeedFilter::Mention(_) => {
                "num_likes DESC, p.created_at DESC"
            }
        }
    }
}

const FEED_SELECT: &str = "SELECT p.id, p.author, p.author_username, p.content, p.comments, \
     p.created_at, u.verified AS author_verified, \
     $1 = ANY(p.likes) AS liked, \
     cardinality(p.likes)::bigint AS num_likes \
     FROM posts p JOIN users u ON u.id = p.author";

/// One page of posts, annotated for `viewer_id`.
pub async fn fetch_posts(
    pool: &PgPool,
    filter: &FeedFilter,
    viewer_id: Uuid,
    skip: i64,
    limit: i64,
) -> Result<Vec<FeedPost>> {
    let sql = format!(
        "{FEED_SELECT} WHERE {} ORDER BY {} OFFSET $3 LIMIT $4",
        filter.where_clause(2),
        filter.order_clause()
    );

    let query = sqlx::query_as::<_, FeedPost>(&sql).bind(viewer_id);
    let query = match filter {
        FeedFilter::Following(ids) | FeedFilter::Ids(ids) => query.bind(ids),
        FeedFilter::Hashtag(token) | FeedFilter::Mention(token) => query.bind(token),
    };

    Ok(query.bind(skip).bind(limit).fetch_all(pool).await?)
}

/// Total number of posts matching the filter, for client-side pagination.
pub async fn count_posts(pool: &PgPool, filter: &FeedFilter) -> Result<i64> {
    let sql = format!(
        "SELECT COUNT(*) FROM posts p WHERE {}",
        filter.where_clause(1)
    );

    let query = sqlx::query_scalar::<_, i64>(&sql);
    let query = match filter {
        FeedFilter::Following(ids) | FeedFilter::Ids(ids) => query.bind(ids),
        FeedFilter::Hashtag(token) | FeedFilter::Mention(token) => query.bind(token),
    };

    Ok(query.fetch_one(pool).await?)
}

/// One page of a post's comments, newest first, annotated for the viewer.
pub async fn fetch_comments(
    pool: &PgPool,
    post_id: Uuid,
    viewer_id: Uuid,
    skip: i64,
    limit: i64,
) -> Result<Vec<FeedComment>> {
    let comments = sqlx::query_as::<_, FeedComment>(
        "SELECT c.id, c.author, c.author_username, c.post_id, c.content, c.created_at, \
         u.verified AS author_verified, \
         $1 = ANY(c.likes) AS liked, \
         cardinality(c.likes)::bigint AS num_likes \
         FROM comments c JOIN users u ON u.id = c.author \
         WHERE c.post_id = $2 \
         ORDER BY c.created_at DESC OFFSET $3 LIMIT $4",
    )
    .bind(viewer_id)
    .bind(post_id)
    .bind(skip)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(comments)
}

/// Total number of comments under a post.
pub async fn count_comments(pool: &PgPool, post_id: Uuid) -> Result<i64> {
    Ok(
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(pool)
            .await?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashtag_token_validation() {
        assert!(FeedFilter::hashtag("launch").is_ok());
        assert!(FeedFilter::hashtag("launch_2024").is_ok());
        assert!(FeedFilter::hashtag("").is_err());
        assert!(FeedFilter::hashtag("a'; DROP TABLE posts; --").is_err());
        assert!(FeedFilter::hashtag("tag with spaces").is_err());
    }

    #[test]
    fn test_mention_token_validation() {
        assert!(FeedFilter::mention("alice").is_ok());
        assert!(FeedFilter::mention("al.ice").is_err());
    }

    #[test]
    fn test_chronological_feeds_sort_by_creation_time() {
        let following = FeedFilter::Following(vec![Uuid::new_v4()]);
        assert_eq!(following.order_clause(), "p.created_at DESC");

        let profile = FeedFilter::Ids(vec![Uuid::new_v4()]);
        assert_eq!(profile.order_clause(), "p.created_at DESC");
    }

    #[test]
    fn test_retrieval_feeds_rank_by_likes_then_recency() {
        let hashtag = FeedFilter::hashtag("launch").unwrap();
        assert_eq!(hashtag.order_clause(), "num_likes DESC, p.created_at DESC");

        let mention = FeedFilter::mention("alice").unwrap();
        assert_eq!(mention.order_clause(), "num_likes DESC, p.created_at DESC");
    }

    #[test]
    fn test_hashtag_filter_uses_word_boundary() {
        let filter = FeedFilter::hashtag("launch").unwrap();
        let clause = filter.where_clause(2);
        assert!(clause.contains(r"'\M'"));
        assert!(clause.contains("'#'"));
        assert!(clause.contains("~*"));
    }

    #[test]
    fn test_where_clause_placeholder_index() {
        let filter = FeedFilter::Following(vec![]);
        assert_eq!(filter.where_clause(2), "p.author = ANY($2)");
        assert_eq!(filter.where_clause(1), "p.author = ANY($1)");
    }
}
