//! Notification fanout.
//!
//! One logical event (like, comment, follow, mention) becomes one
//! notification string per derived recipient: durably appended to the
//! recipient's unread list, then pushed best-effort over the live channel.
//!
//! Fanout always runs in a task spawned after the HTTP response has been
//! produced; failures here are logged and never surfaced to the caller.

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::user_repo;
use crate::services::mentions::extract_mentions;
use crate::ws::ConnectionRegistry;

/// Which entity kind an event happened on; decides the notification
/// wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Post,
    Comment,
}

impl EntityKind {
    fn label(self) -> &'static str {
        match self {
            EntityKind::Post => "post",
            EntityKind::Comment => "comment",
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    pool: PgPool,
    registry: ConnectionRegistry,
}

impl Notifier {
    pub fn new(pool: PgPool, registry: ConnectionRegistry) -> Self {
        Self { pool, registry }
    }

    /// Deliver one notification: durable unread-list append first, then a
    /// best-effort live push to every attached connection.
    pub async fn notify(&self, recipient: Uuid, text: &str) -> Result<(), sqlx::Error> {
        let recorded = user_repo::append_notification(&self.pool, recipient, text).await?;
        if !recorded {
            tracing::warn!(recipient = %recipient, "notification recipient no longer exists");
            return Ok(());
        }

        let delivered = self.registry.push(recipient, text).await;
        tracing::debug!(
            recipient = %recipient,
            live_connections = delivered,
            "notification fanned out"
        );
        Ok(())
    }

    /// Fanout for a successful like. Self-likes never notify.
    pub async fn fan_out_like(
        &self,
        actor_id: Uuid,
        actor_username: &str,
        author_id: Uuid,
        kind: EntityKind,
    ) {
        if actor_id == author_id {
            return;
        }
        let text = format!("@{} liked your {}.", actor_username, kind.label());
        if let Err(e) = self.notify(author_id, &text).await {
            tracing::warn!(recipient = %author_id, "like fanout failed: {e}");
        }
    }

    /// Fanout for a new comment: the post author hears about it unless
    /// they wrote the comment themselves.
    pub async fn fan_out_comment(
        &self,
        actor_id: Uuid,
        actor_username: &str,
        post_author_id: Uuid,
    ) {
        if actor_id == post_author_id {
            return;
        }
        let text = format!("@{} commented on your post.", actor_username);
        if let Err(e) = self.notify(post_author_id, &text).await {
            tracing::warn!(recipient = %post_author_id, "comment fanout failed: {e}");
        }
    }

    /// Fanout for a new follow edge.
    pub async fn fan_out_follow(&self, actor_username: &str, target_id: Uuid) {
        let text = format!("@{} started following you.", actor_username);
        if let Err(e) = self.notify(target_id, &text).await {
            tracing::warn!(recipient = %target_id, "follow fanout failed: {e}");
        }
    }

    /// Notify every user mentioned in `content`.
    ///
    /// Unresolvable handles are skipped silently; the acting author never
    /// receives a self-mention; ids in `excluded` (e.g. a post author who
    /// already got a "commented on your post" notification) are skipped so
    /// each recipient sees at most one notification per logical event.
    pub async fn fan_out_mentions(
        &self,
        content: &str,
        actor_id: Uuid,
        actor_username: &str,
        source: EntityKind,
        excluded: &[Uuid],
    ) {
        for handle in extract_mentions(content) {
            let mentioned = match user_repo::find_by_username(&self.pool, &handle).await {
                Ok(Some(user)) => user,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(handle = %handle, "mention lookup failed: {e}");
                    continue;
                }
            };

            if mentioned.id == actor_id || excluded.contains(&mentioned.id) {
                continue;
            }

            let text = format!(
                "@{} mentioned you in a {}.",
                actor_username,
                source.label()
            );
            if let Err(e) = self.notify(mentioned.id, &text).await {
                tracing::warn!(recipient = %mentioned.id, "mention fanout failed: {e}");
            }
        }
    }
}
