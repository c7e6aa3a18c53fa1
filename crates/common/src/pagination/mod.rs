//! Page request/response types shared by services and handlers

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Zero-based page request, deserializable from `?page=&size=`
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct PageRequest {
    #[serde(default)]
    pub page: u64,

    #[serde(default = "default_size")]
    pub size: u64,
}

fn default_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u64, size: u64) -> Self {
        Self { page, size }
    }

    /// Page size clamped to 1..=MAX_PAGE_SIZE
    pub fn size(&self) -> u64 {
        self.size.clamp(1, MAX_PAGE_SIZE)
    }

    /// Page index capped so the row offset fits a signed 64-bit SQL `OFFSET`
    pub fn page(&self) -> u64 {
        self.page.min(i64::MAX as u64 / self.size())
    }

    pub fn offset(&self) -> u64 {
        self.page() * self.size()
    }
}

/// One page of results plus totals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        let size = request.size();
        Self {
            content,
            page: request.page(),
            size,
            total_elements,
            total_pages: total_elements.div_ceil(size),
        }
    }

    pub fn empty(request: &PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    pub fn is_last(&self) -> bool {
        self.page + 1 >= self.total_pages
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_clamping() {
        assert_eq!(PageRequest::new(0, 0).size(), 1);
        assert_eq!(PageRequest::new(0, 500).size(), MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(3, 25).offset(), 75);
    }

    #[test]
    fn test_huge_page_is_capped() {
        let req: PageRequest = serde_json::from_str(r#"{"page": 18446744073709551615, "size": 100}"#).unwrap();
        assert_eq!(req.page(), i64::MAX as u64 / 100);
        assert!(req.offset() <= i64::MAX as u64);

        let page = Page::<i32>::empty(&req);
        assert_eq!(page.page, req.page());
        assert!(page.is_last());
    }

    #[test]
    fn test_defaults_from_query() {
        let req: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req, PageRequest::default());

        let req: PageRequest = serde_json::from_str(r#"{"page": 2}"#).unwrap();
        assert_eq!(req.page, 2);
        assert_eq!(req.size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_total_pages() {
        let req = PageRequest::new(0, 20);
        assert_eq!(Page::new(vec![1; 20], &req, 41).total_pages, 3);
        assert_eq!(Page::<i32>::empty(&req).total_pages, 0);
        assert!(Page::<i32>::empty(&req).is_last());

        let page = Page::new(vec![1, 2], &PageRequest::new(1, 2), 4);
        assert!(page.is_last());
    }

    #[test]
    fn test_map_preserves_totals() {
        let page = Page::new(vec![1, 2, 3], &PageRequest::new(0, 3), 7).map(|n| n * 10);
        assert_eq!(page.content, vec![10, 20, 30]);
        assert_eq!(page.total_elements, 7);
        assert_eq!(page.total_pages, 3);
    }
}
