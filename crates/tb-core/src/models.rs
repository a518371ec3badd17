//! # Domain Models
//!
//! Rows as the relational store holds them, plus the derived shapes the feed
//! hands to the presentation layer. Identifiers are the store's
//! auto-increment keys, so ascending id is creation order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type PostId = i64;
pub type CommentId = i64;

/// An identity record. Read-only from the feed's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single comment row. `parent_id = None` means the comment hangs
/// directly off its post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub user_id: UserId,
    pub post_id: PostId,
    pub parent_id: Option<CommentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A post row with its author eager-loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub post: Post,
    pub user: User,
}

/// A comment row with its author eager-loaded. This is the flat input of
/// [`crate::tree::materialize`].
#[derive(Debug, Clone, PartialEq)]
pub struct CommentRecord {
    pub comment: Comment,
    pub user: User,
}

/// A comment with its author and its materialized replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentTree {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: User,
    pub replies: Vec<CommentTree>,
}

impl CommentTree {
    pub fn id(&self) -> CommentId {
        self.comment.id
    }

    /// Number of directly materialized replies. Replies cut off by the depth
    /// bound are not counted.
    pub fn reply_count(&self) -> usize {
        self.replies.len()
    }

    pub fn has_replies(&self) -> bool {
        !self.replies.is_empty()
    }
}

/// A post as the feed serves it: author plus top-level comment trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostWithRelations {
    #[serde(flatten)]
    pub post: Post,
    pub user: User,
    pub comments: Vec<CommentTree>,
}

impl PostWithRelations {
    pub fn id(&self) -> PostId {
        self.post.id
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub email_verified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub user_id: UserId,
}

/// Insert payload for a comment. Replies are built with [`NewComment::reply_to`]
/// so they always inherit the parent's post.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub user_id: UserId,
    pub post_id: PostId,
    pub parent_id: Option<CommentId>,
}

impl NewComment {
    pub fn top_level(post_id: PostId, user_id: UserId, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            user_id,
            post_id,
            parent_id: None,
        }
    }

    pub fn reply_to(parent: &Comment, user_id: UserId, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            user_id,
            post_id: parent.post_id,
            parent_id: Some(parent.id),
        }
    }
}
