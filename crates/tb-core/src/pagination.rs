//! # Pagination
//!
//! Page arithmetic and the page envelope handed to the presentation layer.
//!
//! Policies:
//! * pages are 1-indexed; page 0 or a negative page is a validation error;
//! * an empty collection still has one (empty) page, so `last_page >= 1`;
//! * a page past `last_page` is not clamped, it comes back empty with
//!   `from`/`to` unset and the real `last_page`/`total`.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Posts per page when nothing else is configured.
pub const DEFAULT_PER_PAGE: u64 = 5;

/// Pages shown on each side of the current one before the link list is
/// collapsed with `...` gaps.
const ON_EACH_SIDE: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerPage(u64);

impl PerPage {
    pub fn new(size: u64) -> Result<Self> {
        if size == 0 {
            return Err(AppError::Validation("per-page size must be at least 1".to_string()));
        }
        Ok(Self(size))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl Default for PerPage {
    fn default() -> Self {
        Self(DEFAULT_PER_PAGE)
    }
}

/// A validated, 1-indexed page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest(u64);

impl PageRequest {
    pub fn new(page: i64) -> Result<Self> {
        if page < 1 {
            return Err(AppError::Validation(format!(
                "page must be a positive integer, got {page}"
            )));
        }
        Ok(Self(page as u64))
    }

    pub fn first() -> Self {
        Self(1)
    }

    pub fn page(self) -> u64 {
        self.0
    }

    /// Number of items that precede this page.
    pub fn offset(self, per_page: PerPage) -> u64 {
        (self.0 - 1).saturating_mul(per_page.get())
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// One entry of the pagination control: a page number, a gap, or the
/// previous/next arrows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub url: Option<String>,
    pub label: String,
    pub active: bool,
}

/// Everything about a page except its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: u64,
    pub first_page_url: String,
    pub from: Option<u64>,
    pub last_page: u64,
    pub last_page_url: String,
    pub links: Vec<PageLink>,
    pub next_page_url: Option<String>,
    pub path: String,
    pub per_page: u64,
    pub prev_page_url: Option<String>,
    pub to: Option<u64>,
    pub total: u64,
}

impl PageMeta {
    pub fn compute(request: PageRequest, per_page: PerPage, total: u64, path: &str) -> Self {
        let current = request.page();
        let size = per_page.get();
        let last_page = total.div_ceil(size).max(1);

        let (from, to) = if total > 0 && current <= last_page {
            let from = request.offset(per_page) + 1;
            (Some(from), Some((from + size - 1).min(total)))
        } else {
            (None, None)
        };

        let url = |page: u64| page_url(path, page);
        let prev_page_url = (current > 1).then(|| url(current - 1));
        let next_page_url = (current < last_page).then(|| url(current + 1));

        let mut links = Vec::new();
        links.push(PageLink {
            url: prev_page_url.clone(),
            label: "« Previous".to_string(),
            active: false,
        });
        for element in url_window(current, last_page) {
            match element {
                Window::Pages(range) => links.extend(range.map(|page| PageLink {
                    url: Some(url(page)),
                    label: page.to_string(),
                    active: page == current,
                })),
                Window::Gap => links.push(PageLink {
                    url: None,
                    label: "...".to_string(),
                    active: false,
                }),
            }
        }
        links.push(PageLink {
            url: next_page_url.clone(),
            label: "Next »".to_string(),
            active: false,
        });

        Self {
            current_page: current,
            first_page_url: url(1),
            from,
            last_page,
            last_page_url: url(last_page),
            links,
            next_page_url,
            path: path.to_string(),
            per_page: size,
            prev_page_url,
            to,
            total,
        }
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page
    }
}

pub fn page_url(path: &str, page: u64) -> String {
    format!("{path}?page={page}")
}

enum Window {
    Pages(RangeInclusive<u64>),
    Gap,
}

/// Which page numbers get a link. Small collections list every page;
/// larger ones keep the first two, the last two, and a slider around the
/// current page.
fn url_window(current: u64, last_page: u64) -> Vec<Window> {
    if last_page < ON_EACH_SIDE * 2 + 8 {
        return vec![Window::Pages(1..=last_page)];
    }

    let window = ON_EACH_SIDE + 4;
    let start = 1..=2;
    let finish = last_page - 1..=last_page;

    if current <= window {
        vec![
            Window::Pages(1..=window + ON_EACH_SIDE),
            Window::Gap,
            Window::Pages(finish),
        ]
    } else if current > last_page - window {
        vec![
            Window::Pages(start),
            Window::Gap,
            Window::Pages(last_page - (window + ON_EACH_SIDE - 1)..=last_page),
        ]
    } else {
        vec![
            Window::Pages(start),
            Window::Gap,
            Window::Pages(current - ON_EACH_SIDE..=current + ON_EACH_SIDE),
            Window::Gap,
            Window::Pages(finish),
        ]
    }
}

/// A page of items plus its metadata. Serialized flat, with the items under
/// `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedPage<T> {
    #[serde(rename = "data")]
    pub items: Vec<T>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

impl<T> PaginatedPage<T> {
    pub fn new(items: Vec<T>, meta: PageMeta) -> Self {
        Self { items, meta }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
