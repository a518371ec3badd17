//! Builders for domain records used by tests across the workspace.
//! Compiled for this crate's tests and behind the `testing` feature.

use chrono::{DateTime, TimeZone, Utc};

use crate::models::{
    Comment, CommentId, CommentRecord, CommentTree, Post, PostId, PostRecord, User, UserId,
};

pub fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 17, 15, 20, 28)
        .single()
        .unwrap_or_default()
}

pub fn user(id: UserId) -> User {
    User {
        id,
        name: format!("user {id}"),
        email: format!("user{id}@example.com"),
        email_verified_at: None,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

pub fn post(id: PostId, user_id: UserId) -> PostRecord {
    PostRecord {
        post: Post {
            id,
            title: format!("post {id}"),
            content: format!("content of post {id}"),
            user_id,
            created_at: timestamp(),
            updated_at: timestamp(),
        },
        user: user(user_id),
    }
}

/// A comment row authored by user `id % 3 + 1`.
pub fn comment(id: CommentId, post_id: PostId, parent_id: Option<CommentId>) -> CommentRecord {
    let user_id = id % 3 + 1;
    CommentRecord {
        comment: Comment {
            id,
            content: format!("comment {id}"),
            user_id,
            post_id,
            parent_id,
            created_at: timestamp(),
            updated_at: timestamp(),
        },
        user: user(user_id),
    }
}

/// A materialized top-level node; the replies are re-parented onto it.
pub fn node(id: CommentId, post_id: PostId, mut replies: Vec<CommentTree>) -> CommentTree {
    for reply in &mut replies {
        reply.comment.parent_id = Some(id);
    }
    let record = comment(id, post_id, None);
    CommentTree {
        comment: record.comment,
        user: record.user,
        replies,
    }
}
