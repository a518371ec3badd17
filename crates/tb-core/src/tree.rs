//! # Comment Tree Materializer
//!
//! Turns the flat, author-joined comment rows of one post into a forest of
//! [`CommentTree`] nodes.
//!
//! Rows are bucketed by `parent_id` into an index arena, then top-level rows
//! are attached recursively until the configured [`ReplyDepth`] is reached.
//! Nodes on the last level get an empty `replies` list even if the store holds
//! more children for them; truncation is silent. Rows whose parent is not part
//! of the input are dropped.
//!
//! Input order is kept at every level. The store returns rows in ascending id
//! order, which is creation order.

use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::models::{CommentId, CommentRecord, CommentTree, PostId};

/// Levels materialized by default: comments, their replies, and replies to
/// those replies.
pub const DEFAULT_REPLY_DEPTH: usize = 3;

/// How many nesting levels the feed eager-loads and materializes.
/// Top-level comments are the first level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyDepth(usize);

impl ReplyDepth {
    pub fn new(levels: usize) -> Result<Self> {
        if levels == 0 {
            return Err(AppError::Validation(
                "reply depth must include at least the top-level comments".to_string(),
            ));
        }
        Ok(Self(levels))
    }

    pub fn levels(self) -> usize {
        self.0
    }
}

impl Default for ReplyDepth {
    fn default() -> Self {
        Self(DEFAULT_REPLY_DEPTH)
    }
}

/// Builds the reply forest for a single post.
pub fn materialize(rows: Vec<CommentRecord>, depth: ReplyDepth) -> Vec<CommentTree> {
    let mut roots = Vec::new();
    let mut children: HashMap<CommentId, Vec<usize>> = HashMap::new();

    for (idx, row) in rows.iter().enumerate() {
        match row.comment.parent_id {
            None => roots.push(idx),
            Some(parent) => children.entry(parent).or_default().push(idx),
        }
    }

    let mut arena: Vec<Option<CommentRecord>> = rows.into_iter().map(Some).collect();

    roots
        .into_iter()
        .filter_map(|idx| attach(idx, 1, depth.levels(), &mut arena, &children))
        .collect()
}

/// Moves the row at `idx` out of the arena and hangs its children under it.
/// Taking the row guarantees each comment is placed at most once.
fn attach(
    idx: usize,
    level: usize,
    max_levels: usize,
    arena: &mut [Option<CommentRecord>],
    children: &HashMap<CommentId, Vec<usize>>,
) -> Option<CommentTree> {
    let record = arena[idx].take()?;

    let replies = match children.get(&record.comment.id) {
        Some(kids) if level < max_levels => kids
            .iter()
            .filter_map(|&kid| attach(kid, level + 1, max_levels, arena, children))
            .collect(),
        _ => Vec::new(),
    };

    Some(CommentTree {
        comment: record.comment,
        user: record.user,
        replies,
    })
}

/// Splits a multi-post result set into per-post row lists, keeping the
/// original order inside each list.
pub fn group_by_post(rows: Vec<CommentRecord>) -> HashMap<PostId, Vec<CommentRecord>> {
    let mut grouped: HashMap<PostId, Vec<CommentRecord>> = HashMap::new();
    for row in rows {
        grouped.entry(row.comment.post_id).or_default().push(row);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::comment;

    fn row(id: i64, post_id: i64, parent_id: Option<i64>) -> CommentRecord {
        comment(id, post_id, parent_id)
    }

    fn ids(nodes: &[CommentTree]) -> Vec<i64> {
        nodes.iter().map(CommentTree::id).collect()
    }

    #[test]
    fn one_thread_with_nested_reply() {
        // 1 ── 2 ── 4 ── 5 (beyond the bound)
        //   └─ 3
        let rows = vec![
            row(1, 1, None),
            row(2, 1, Some(1)),
            row(3, 1, Some(1)),
            row(4, 1, Some(2)),
            row(5, 1, Some(4)),
        ];

        let tree = materialize(rows, ReplyDepth::default());

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].reply_count(), 2);
        assert_eq!(tree[0].replies[0].reply_count(), 1);
        assert_eq!(tree[0].replies[1].reply_count(), 0);
        let nested = &tree[0].replies[0].replies[0];
        assert_eq!(nested.id(), 4);
        assert!(nested.replies.is_empty());
    }

    #[test]
    fn top_level_count_matches_parentless_rows() {
        let rows = vec![
            row(1, 1, None),
            row(2, 1, None),
            row(3, 1, Some(1)),
            row(4, 1, None),
            row(5, 1, Some(3)),
        ];
        let parentless = rows.iter().filter(|r| r.comment.is_top_level()).count();

        let tree = materialize(rows, ReplyDepth::default());

        assert_eq!(tree.len(), parentless);
        assert_eq!(ids(&tree), vec![1, 2, 4]);
    }

    #[test]
    fn replies_keep_input_order_at_every_level() {
        let rows = vec![
            row(10, 1, None),
            row(7, 1, Some(10)),
            row(3, 1, Some(10)),
            row(9, 1, Some(10)),
            row(2, 1, Some(3)),
            row(1, 1, Some(3)),
        ];

        let tree = materialize(rows, ReplyDepth::default());

        assert_eq!(ids(&tree[0].replies), vec![7, 3, 9]);
        assert_eq!(ids(&tree[0].replies[1].replies), vec![2, 1]);
    }

    #[test]
    fn reply_appears_only_under_its_parent() {
        let rows = vec![
            row(1, 1, None),
            row(2, 1, None),
            row(3, 1, Some(2)),
            row(4, 1, Some(1)),
        ];

        let tree = materialize(rows, ReplyDepth::default());

        assert_eq!(ids(&tree), vec![1, 2]);
        assert_eq!(ids(&tree[0].replies), vec![4]);
        assert_eq!(ids(&tree[1].replies), vec![3]);
    }

    #[test]
    fn rows_with_missing_parent_are_dropped() {
        let rows = vec![row(1, 1, None), row(2, 1, Some(99)), row(3, 1, Some(2))];

        let tree = materialize(rows, ReplyDepth::default());

        assert_eq!(ids(&tree), vec![1]);
        assert!(tree[0].replies.is_empty());
    }

    #[test]
    fn cycles_are_unreachable_and_dropped() {
        let rows = vec![row(1, 1, None), row(2, 1, Some(3)), row(3, 1, Some(2))];

        let tree = materialize(rows, ReplyDepth::default());

        assert_eq!(ids(&tree), vec![1]);
    }

    #[test]
    fn single_level_depth_keeps_only_top_level() {
        let rows = vec![row(1, 1, None), row(2, 1, Some(1)), row(3, 1, None)];

        let tree = materialize(rows, ReplyDepth::new(1).unwrap());

        assert_eq!(ids(&tree), vec![1, 3]);
        assert!(tree.iter().all(|node| node.replies.is_empty()));
    }

    #[test]
    fn zero_depth_is_rejected() {
        assert!(matches!(ReplyDepth::new(0), Err(AppError::Validation(_))));
    }

    #[test]
    fn empty_input_yields_empty_forest() {
        assert!(materialize(Vec::new(), ReplyDepth::default()).is_empty());
    }

    #[test]
    fn group_by_post_keeps_row_order() {
        let rows = vec![
            row(1, 1, None),
            row(2, 2, None),
            row(3, 1, Some(1)),
            row(4, 2, Some(2)),
            row(5, 1, None),
        ];

        let grouped = group_by_post(rows);

        let first: Vec<i64> = grouped[&1].iter().map(|r| r.comment.id).collect();
        let second: Vec<i64> = grouped[&2].iter().map(|r| r.comment.id).collect();
        assert_eq!(first, vec![1, 3, 5]);
        assert_eq!(second, vec![2, 4]);
    }
}
