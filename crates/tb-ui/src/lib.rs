//! # tb-ui
//!
//! Server-rendered views of the feed. Comment threads are rendered bottom-up
//! in Rust: each [`CommentView`] carries the already-rendered HTML of its
//! replies, so the templates themselves never recurse.

use askama::Template;
use chrono::{DateTime, Utc};
use tb_core::{CommentTree, PageLink, PaginatedPage, PostWithRelations, User};

mod state;
mod style;

pub use state::{ExpansionState, FeedState, MergeOutcome, PageFetch, RequestToken};
pub use style::DepthStyle;

#[derive(Template)]
#[template(path = "posts.html")]
pub struct PostsPage {
    pub title: String,
    pub cards: Vec<PostCard>,
    pub links: Vec<LinkView>,
    pub summary: String,
    /// Shown when the page has no cards.
    pub empty_message: String,
}

pub struct PostCard {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: String,
    pub initial: String,
    pub posted_on: String,
    pub comment_count: usize,
    pub comments_open: bool,
    pub comments_html: String,
}

#[derive(Template)]
#[template(path = "comment.html")]
pub struct CommentView {
    pub id: i64,
    pub author: String,
    pub initial: String,
    pub posted_on: String,
    pub content: String,
    pub style: DepthStyle,
    pub depth: usize,
    pub reply_count: usize,
    pub reply_label: String,
    pub replies_open: bool,
    pub replies_html: String,
}

/// A pagination link flattened for the template. Disabled links (gaps and
/// the previous/next ends) have no target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkView {
    pub href: String,
    pub label: String,
    pub active: bool,
    pub enabled: bool,
}

impl From<&PageLink> for LinkView {
    fn from(link: &PageLink) -> Self {
        Self {
            href: link.url.clone().unwrap_or_default(),
            label: link.label.clone(),
            active: link.active,
            enabled: link.url.is_some(),
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomePage {
    pub title: String,
    pub feed_path: String,
}

/// Renders one page of the feed with the given sections expanded.
pub fn render_feed(
    page: &PaginatedPage<PostWithRelations>,
    expansion: &ExpansionState,
) -> askama::Result<String> {
    let cards = page
        .items
        .iter()
        .map(|item| post_card(item, expansion))
        .collect::<askama::Result<Vec<_>>>()?;

    let meta = &page.meta;
    let summary = match (meta.from, meta.to) {
        (Some(from), Some(to)) => format!("Showing {from} to {to} of {} posts", meta.total),
        _ => String::new(),
    };
    let empty_message = if meta.total > 0 {
        "No posts on this page."
    } else {
        "No posts yet."
    };

    PostsPage {
        title: "Posts".to_string(),
        cards,
        links: meta.links.iter().map(LinkView::from).collect(),
        summary,
        empty_message: empty_message.to_string(),
    }
    .render()
}

pub fn render_home(feed_path: &str) -> askama::Result<String> {
    HomePage {
        title: "Home".to_string(),
        feed_path: feed_path.to_string(),
    }
    .render()
}

fn post_card(item: &PostWithRelations, expansion: &ExpansionState) -> askama::Result<PostCard> {
    Ok(PostCard {
        id: item.post.id,
        title: item.post.title.clone(),
        content: item.post.content.clone(),
        author: item.user.name.clone(),
        initial: initial(&item.user),
        posted_on: posted_on(item.post.created_at),
        comment_count: item.comments.len(),
        comments_open: expansion.comments_visible(item.id()),
        comments_html: render_comments(&item.comments, 0, expansion)?,
    })
}

/// Renders a list of sibling comments at `depth`, replies included.
pub fn render_comments(
    nodes: &[CommentTree],
    depth: usize,
    expansion: &ExpansionState,
) -> askama::Result<String> {
    let mut html = String::new();
    for node in nodes {
        let replies_html = render_comments(&node.replies, depth + 1, expansion)?;
        let view = CommentView {
            id: node.id(),
            author: node.user.name.clone(),
            initial: initial(&node.user),
            posted_on: posted_on(node.comment.created_at),
            content: node.comment.content.clone(),
            style: DepthStyle::for_depth(depth),
            depth,
            reply_count: node.reply_count(),
            reply_label: reply_label(node.reply_count()),
            replies_open: expansion.replies_visible(node.id()),
            replies_html,
        };
        html.push_str(&view.render()?);
    }
    Ok(html)
}

fn initial(user: &User) -> String {
    user.name
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}

fn posted_on(at: DateTime<Utc>) -> String {
    at.format("%-m/%-d/%Y").to_string()
}

fn reply_label(count: usize) -> String {
    if count == 1 {
        "1 reply".to_string()
    } else {
        format!("{count} replies")
    }
}
