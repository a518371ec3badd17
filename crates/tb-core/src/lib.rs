//! threadboard/crates/tb-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Threadboard:
//! models, store ports, the comment tree materializer and the paginated feed.

pub mod error;
pub mod feed;
pub mod models;
pub mod pagination;
pub mod traits;
pub mod tree;

#[cfg(any(test, feature = "testing"))]
pub mod fixtures;

// Re-exporting for easier access in other crates
pub use error::*;
pub use feed::{FeedOptions, FeedService};
pub use models::*;
pub use pagination::{PageLink, PageMeta, PageRequest, PaginatedPage, PerPage, DEFAULT_PER_PAGE};
pub use traits::*;
pub use tree::{materialize, ReplyDepth, DEFAULT_REPLY_DEPTH};

#[cfg(test)]
mod tests {
    use super::fixtures::{node, post, user};
    use super::models::*;

    #[test]
    fn reply_copies_parent_post() {
        let parent = super::fixtures::comment(7, 3, None).comment;
        let reply = NewComment::reply_to(&parent, 2, "agreed");
        assert_eq!(reply.post_id, 3);
        assert_eq!(reply.parent_id, Some(7));
        assert_eq!(reply.user_id, 2);
    }

    #[test]
    fn post_with_relations_serializes_flat() {
        let record = post(1, 4);
        let item = PostWithRelations {
            post: record.post,
            user: user(4),
            comments: vec![node(10, 1, vec![node(11, 1, Vec::new())])],
        };

        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["title"], "post 1");
        assert_eq!(json["user"]["name"], "user 4");
        assert_eq!(json["comments"][0]["id"], 10);
        assert_eq!(json["comments"][0]["parent_id"], serde_json::Value::Null);
        assert_eq!(json["comments"][0]["replies"][0]["parent_id"], 10);
        assert_eq!(
            json["comments"][0]["replies"][0]["replies"],
            serde_json::json!([])
        );
    }
}
