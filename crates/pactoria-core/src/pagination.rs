//! Page requests and paged results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Requested page, 1-based. `size` is clamped by [`PageRequest::clamped`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    #[must_use]
    pub const fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// Page at least 1, size within `[1, max_size]`.
    #[must_use]
    pub fn clamped(page: Option<u32>, size: Option<u32>, default_size: u32, max_size: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            size: size.unwrap_or(default_size).clamp(1, max_size.max(1)),
        }
    }

    #[must_use]
    pub const fn offset(self) -> u64 {
        (self.page.saturating_sub(1) as u64) * self.size as u64
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
    pub pages: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        let pages = if total == 0 {
            0
        } else {
            u32::try_from(total.div_ceil(u64::from(request.size))).unwrap_or(u32::MAX)
        };
        Self {
            items,
            total,
            page: request.page,
            size: request.size,
            pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
            pages: self.pages,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_page_and_size() {
        let req = PageRequest::clamped(Some(0), Some(1000), 20, 100);
        assert_eq!(req, PageRequest::new(1, 100));
        let req = PageRequest::clamped(None, Some(0), 20, 100);
        assert_eq!(req.size, 1);
        let req = PageRequest::clamped(None, None, 20, 100);
        assert_eq!(req, PageRequest::new(1, 20));
    }

    #[test]
    fn offset_and_pages() {
        let req = PageRequest::new(3, 10);
        assert_eq!(req.offset(), 20);
        let page: Page<u8> = Page::new(vec![1, 2], 21, req);
        assert_eq!(page.pages, 3);
        let empty: Page<u8> = Page::new(vec![], 0, req);
        assert_eq!(empty.pages, 0);
    }
}
