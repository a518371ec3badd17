//! # Feed Service
//!
//! Coordinates one page of the post feed: counts posts, loads the page's
//! posts with their authors, eager-loads every comment of those posts in a
//! single depth-bounded query, and materializes one comment forest per post.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::models::{PostId, PostWithRelations};
use crate::pagination::{PageMeta, PageRequest, PaginatedPage, PerPage};
use crate::traits::PostRepo;
use crate::tree::{group_by_post, materialize, ReplyDepth};

/// Knobs of the feed. `path` is the route the page links point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOptions {
    pub per_page: PerPage,
    pub reply_depth: ReplyDepth,
    pub path: String,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            per_page: PerPage::default(),
            reply_depth: ReplyDepth::default(),
            path: "/".to_string(),
        }
    }
}

pub struct FeedService {
    repo: Arc<dyn PostRepo>,
    options: FeedOptions,
}

impl FeedService {
    pub fn new(repo: Arc<dyn PostRepo>, options: FeedOptions) -> Self {
        Self { repo, options }
    }

    pub fn options(&self) -> &FeedOptions {
        &self.options
    }

    /// Builds the requested page. A page past the last one comes back empty
    /// without touching the post or comment tables.
    #[tracing::instrument(skip_all, fields(page = request.page()))]
    pub async fn page(&self, request: PageRequest) -> Result<PaginatedPage<PostWithRelations>> {
        let total = self.repo.count_posts().await?;
        let meta = PageMeta::compute(request, self.options.per_page, total, &self.options.path);

        if meta.from.is_none() {
            debug!(total, last_page = meta.last_page, "page holds no posts");
            return Ok(PaginatedPage::new(Vec::new(), meta));
        }

        let limit = to_sql_int(self.options.per_page.get())?;
        let offset = to_sql_int(request.offset(self.options.per_page))?;
        let posts = self.repo.list_posts(limit, offset).await?;

        let post_ids: Vec<PostId> = posts.iter().map(|record| record.post.id).collect();
        let depth = self.options.reply_depth;
        let rows = if post_ids.is_empty() {
            Vec::new()
        } else {
            self.repo
                .comments_for_posts(&post_ids, depth.levels())
                .await?
        };
        let comment_rows = rows.len();
        let mut by_post = group_by_post(rows);

        let items: Vec<PostWithRelations> = posts
            .into_iter()
            .map(|record| {
                let flat = by_post.remove(&record.post.id).unwrap_or_default();
                PostWithRelations {
                    post: record.post,
                    user: record.user,
                    comments: materialize(flat, depth),
                }
            })
            .collect();

        info!(
            posts = items.len(),
            comment_rows,
            total,
            "feed page assembled"
        );
        Ok(PaginatedPage::new(items, meta))
    }
}

fn to_sql_int(value: u64) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| AppError::Validation(format!("{value} is out of range for a page query")))
}
