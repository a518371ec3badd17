//! # Core Traits (Ports)
//!
//! Any store plugin must implement these traits to be used by the binary.

use crate::models::{
    Comment, CommentId, CommentRecord, NewComment, NewPost, NewUser, Post, PostId, PostRecord,
    User, UserId,
};
use async_trait::async_trait;

/// Data persistence contract for posts and comments.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepo: Send + Sync {
    // Feed reads
    async fn count_posts(&self) -> anyhow::Result<u64>;

    /// Posts in ascending id order with their authors.
    async fn list_posts(&self, limit: i64, offset: i64) -> anyhow::Result<Vec<PostRecord>>;

    /// Every comment of the given posts whose nesting level is below
    /// `max_levels` (top-level comments are level 0), authors included,
    /// in ascending id order. One round trip for the whole page.
    async fn comments_for_posts(
        &self,
        post_ids: &[PostId],
        max_levels: usize,
    ) -> anyhow::Result<Vec<CommentRecord>>;

    // Writes
    async fn create_post(&self, post: NewPost) -> anyhow::Result<Post>;
    async fn create_comment(&self, comment: NewComment) -> anyhow::Result<Comment>;

    /// Removes the post and, by cascade, all of its comments.
    async fn delete_post(&self, id: PostId) -> anyhow::Result<bool>;

    /// Removes the comment and, by cascade, its whole reply subtree.
    async fn delete_comment(&self, id: CommentId) -> anyhow::Result<bool>;
}

/// Identity provider contract. The feed only reads users through joins;
/// this port exists for seeding and lookups.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, id: UserId) -> anyhow::Result<Option<User>>;
    async fn list_users(&self) -> anyhow::Result<Vec<User>>;
    async fn create_user(&self, user: NewUser) -> anyhow::Result<User>;
}
