//! Page arithmetic for post feeds.
//!
//! A feed is an ordered collection (newest first) cut into fixed-size pages
//! numbered from 1. Requested numbers outside the valid range are clamped:
//! zero or garbage means the first page, anything past the end means the
//! last page. An empty feed has zero pages and still renders page 1.

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A page number as asked for by the reader, before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest(usize);

impl PageRequest {
    pub fn first() -> Self {
        Self(1)
    }

    pub fn last() -> Self {
        Self(usize::MAX)
    }

    pub fn new(number: usize) -> Self {
        Self(number.max(1))
    }

    /// Interpret the raw `page` query value.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("last") => Self::last(),
            Some(value) => value.parse().map(Self::new).unwrap_or_default(),
            None => Self::first(),
        }
    }

    pub fn number(self) -> usize {
        self.0
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// Where a resolved page sits inside its feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub number: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl PageWindow {
    pub fn resolve(total_items: usize, page_size: usize, request: PageRequest) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_items.div_ceil(page_size);
        let number = request.number().min(total_pages.max(1));
        Self {
            number,
            page_size,
            total_items,
            total_pages,
        }
    }

    pub fn offset(&self) -> usize {
        (self.number - 1) * self.page_size
    }

    pub fn limit(&self) -> usize {
        self.page_size
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub window: PageWindow,
}

impl<T> Page<T> {
    /// Wrap items already fetched for `window`.
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        debug_assert!(items.len() <= window.page_size);
        Self { items, window }
    }

    /// Cut the requested page out of a complete, already ordered collection.
    pub fn paginate(all: Vec<T>, page_size: usize, request: PageRequest) -> Self {
        let window = PageWindow::resolve(all.len(), page_size, request);
        let items = all
            .into_iter()
            .skip(window.offset())
            .take(window.limit())
            .collect();
        Self { items, window }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            window: self.window,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn number(&self) -> usize {
        self.window.number
    }

    pub fn total_items(&self) -> usize {
        self.window.total_items
    }

    pub fn total_pages(&self) -> usize {
        self.window.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.window.has_previous()
    }

    pub fn has_next(&self) -> bool {
        self.window.has_next()
    }

    pub fn previous_page_number(&self) -> usize {
        self.window.number.saturating_sub(1).max(1)
    }

    pub fn next_page_number(&self) -> usize {
        (self.window.number + 1).min(self.window.total_pages.max(1))
    }
}
