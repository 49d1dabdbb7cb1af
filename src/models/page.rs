// Pagination request and page envelope

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Zero-based page number and page size, size clamped to [1, 100]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
}

impl PageRequest {
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page,
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// From raw query parameters. Negative values are treated as their lower bound.
    pub fn from_params(page: Option<i64>, size: Option<i64>) -> Self {
        let page = page.unwrap_or(0).max(0) as u64;
        let size = size.map(|s| s.max(1) as u64).unwrap_or(DEFAULT_PAGE_SIZE);
        Self::new(page, size)
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
    pub first: bool,
    pub last: bool,
}

impl<T> PagedResponse<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let total_pages = total_elements.div_ceil(request.size);
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages,
            first: request.page == 0,
            last: request.page + 1 >= total_pages,
        }
    }

    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResponse<U> {
        let content = self.content.into_iter().map(f).collect();
        PagedResponse {
            content,
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            first: self.first,
            last: self.last,
        }
    }

    /// Same paging metadata around different content
    pub fn with_content<U>(self, content: Vec<U>) -> PagedResponse<U> {
        PagedResponse {
            content,
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            first: self.first,
            last: self.last,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_flags() {
        let first = PagedResponse::new(vec![0; 10], PageRequest::new(0, 10), 25);
        assert_eq!(first.total_pages, 3);
        assert!(first.first);
        assert!(!first.last);

        let last = PagedResponse::new(vec![0; 5], PageRequest::new(2, 10), 25);
        assert!(!last.first);
        assert!(last.last);

        let empty: PagedResponse<i32> = PagedResponse::empty(PageRequest::default());
        assert_eq!(empty.total_pages, 0);
        assert!(empty.first && empty.last);
    }

    #[test]
    fn test_size_is_clamped() {
        assert_eq!(PageRequest::new(0, 0).size, 1);
        assert_eq!(PageRequest::new(0, 1000).size, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::from_params(None, None), PageRequest::new(0, 10));
        assert_eq!(PageRequest::from_params(Some(-3), Some(-1)), PageRequest::new(0, 1));
        assert_eq!(PageRequest::new(3, 20).offset(), 60);
    }

    #[test]
    fn test_serializes_camel_case() {
        let page = PagedResponse::new(vec!["a"], PageRequest::new(0, 10), 1);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalElements"], 1);
        assert_eq!(json["totalPages"], 1);
        assert_eq!(json["last"], true);
    }
}
