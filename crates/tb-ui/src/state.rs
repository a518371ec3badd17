//! # View State
//!
//! Client-held state of the feed: which sections are expanded, and the
//! posts accumulated over successive page loads.
//!
//! Expanding or collapsing never fetches anything; every level the feed
//! materialized is already in hand. Only loading another page does, and
//! [`FeedState`] tags each load with a request token so a late or repeated
//! response cannot corrupt the accumulated list.

use std::collections::{BTreeSet, HashSet};

use tb_core::{CommentId, CommentTree, PageMeta, PaginatedPage, PostId};

/// Expand/collapse flags. Everything starts collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    comments: HashSet<PostId>,
    replies: HashSet<CommentId>,
}

impl ExpansionState {
    pub fn comments_visible(&self, post: PostId) -> bool {
        self.comments.contains(&post)
    }

    /// Flips the comment section of one post and returns the new flag.
    pub fn toggle_comments(&mut self, post: PostId) -> bool {
        flip(&mut self.comments, post)
    }

    pub fn replies_visible(&self, comment: CommentId) -> bool {
        self.replies.contains(&comment)
    }

    /// Flips the replies of one comment and returns the new flag. A comment
    /// without replies has no toggle, so this leaves it collapsed.
    pub fn toggle_replies(&mut self, node: &CommentTree) -> bool {
        if !node.has_replies() {
            return false;
        }
        flip(&mut self.replies, node.id())
    }
}

fn flip(set: &mut HashSet<i64>, id: i64) -> bool {
    if set.remove(&id) {
        false
    } else {
        set.insert(id);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// A page load in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageFetch {
    pub token: RequestToken,
    pub page: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Items appended and metadata replaced.
    Merged { added: usize },
    /// A newer fetch was issued after this one, or the response answers a
    /// different page than the one requested. The response was discarded.
    Stale,
    /// The page is already part of the list; nothing changed.
    Duplicate,
}

/// Items of every merged page, in load order, plus the metadata of the most
/// recent merge. The metadata is never an aggregate.
#[derive(Debug, Clone)]
pub struct FeedState<T> {
    items: Vec<T>,
    meta: Option<PageMeta>,
    merged_pages: BTreeSet<u64>,
    last_issued: u64,
}

impl<T> Default for FeedState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            meta: None,
            merged_pages: BTreeSet::new(),
            last_issued: 0,
        }
    }
}

impl<T> FeedState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// State seeded with the page that came with the initial render.
    pub fn from_page(page: PaginatedPage<T>) -> Self {
        let mut state = Self::new();
        let fetch = state.begin_fetch(page.meta.current_page);
        state.apply(fetch, page);
        state
    }

    /// Issues a new request token. Any fetch issued earlier becomes stale.
    pub fn begin_fetch(&mut self, page: u64) -> PageFetch {
        self.last_issued += 1;
        PageFetch {
            token: RequestToken(self.last_issued),
            page,
        }
    }

    pub fn apply(&mut self, fetch: PageFetch, response: PaginatedPage<T>) -> MergeOutcome {
        let page = response.meta.current_page;
        if fetch.token != RequestToken(self.last_issued) || fetch.page != page {
            return MergeOutcome::Stale;
        }
        if !self.merged_pages.insert(page) {
            return MergeOutcome::Duplicate;
        }

        let added = response.items.len();
        self.items.extend(response.items);
        self.meta = Some(response.meta);
        MergeOutcome::Merged { added }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn meta(&self) -> Option<&PageMeta> {
        self.meta.as_ref()
    }

    /// The page to request next, or `None` once the last page is merged.
    pub fn next_page(&self) -> Option<u64> {
        match &self.meta {
            None => Some(1),
            Some(meta) if meta.has_more_pages() => Some(meta.current_page + 1),
            Some(_) => None,
        }
    }
}
