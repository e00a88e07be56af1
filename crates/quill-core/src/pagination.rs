//! Pagination policy shared by every listing.
//!
//! Out-of-range page numbers never fail: they are clamped to the nearest
//! valid page. The same [`PageWindow`] arithmetic backs the in-memory
//! [`paginate`] and the database adapters' count + offset/limit queries.

use serde::Serialize;

/// Number of posts shown per listing page.
pub const PAGE_SIZE: u64 = 10;

/// A requested page: the raw page number (if any) and the page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: Option<i64>,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(number: Option<i64>) -> Self {
        Self {
            number,
            per_page: PAGE_SIZE,
        }
    }

    /// Parse the `page` query parameter. Anything that is not an integer
    /// is treated as absent.
    pub fn from_query(raw: Option<&str>) -> Self {
        Self::new(raw.and_then(|s| s.trim().parse().ok()))
    }

    pub fn with_per_page(mut self, per_page: u64) -> Self {
        self.per_page = per_page;
        self
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None)
    }
}

/// The resolved page: which slice of a `total`-sized sequence gets served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub per_page: u64,
    pub total: u64,
}

impl PageWindow {
    pub fn resolve(total: u64, request: PageRequest) -> Self {
        let per_page = request.per_page.max(1);
        let num_pages = total.div_ceil(per_page);
        let last = num_pages.max(1);

        let number = match request.number {
            Some(n) if n > 1 => (n as u64).min(last),
            _ => 1,
        };

        Self {
            number,
            num_pages,
            per_page,
            total,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.per_page
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

/// One page of results plus the metadata templates need for navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<u64>,
    pub previous_page_number: Option<u64>,
}

impl<T> Page<T> {
    pub fn from_window(window: PageWindow, items: Vec<T>) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            total: window.total,
            has_next: window.has_next(),
            has_previous: window.has_previous(),
            next_page_number: window.has_next().then(|| window.number + 1),
            previous_page_number: window.has_previous().then(|| window.number - 1),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Swap in a new item list while keeping the page metadata.
    pub fn with_items<U>(self, items: Vec<U>) -> Page<U> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
            has_next: self.has_next,
            has_previous: self.has_previous,
            next_page_number: self.next_page_number,
            previous_page_number: self.previous_page_number,
        }
    }

    /// Transform the items while keeping the page metadata.
    pub fn map<U>(mut self, f: impl FnMut(T) -> U) -> Page<U> {
        let items = std::mem::take(&mut self.items).into_iter().map(f).collect();
        self.with_items(items)
    }
}

/// Slice an already ordered sequence into the requested page.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let window = PageWindow::resolve(items.len() as u64, request);
    let slice = items
        .into_iter()
        .skip(window.offset() as usize)
        .take(window.per_page as usize)
        .collect();

    Page::from_window(window, slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: u32) -> Vec<u32> {
        (0..n).collect()
    }

    #[test]
    fn test_defaults_to_first_page() {
        let page = paginate(numbers(14), PageRequest::new(None));

        assert_eq!(page.number, 1);
        assert_eq!(page.items, (0..10).collect::<Vec<_>>());
        assert_eq!(page.num_pages, 2);
        assert!(page.has_next);
        assert!(!page.has_previous);
        assert_eq!(page.next_page_number, Some(2));
        assert_eq!(page.previous_page_number, None);
    }

    #[test]
    fn test_second_page_holds_remainder() {
        let page = paginate(numbers(14), PageRequest::new(Some(2)));

        assert_eq!(page.number, 2);
        assert_eq!(page.items, vec![10, 11, 12, 13]);
        assert!(!page.has_next);
        assert!(page.has_previous);
    }

    #[test]
    fn test_clamps_out_of_range_requests() {
        let high = paginate(numbers(25), PageRequest::new(Some(99)));
        assert_eq!(high.number, 3);
        assert_eq!(high.items, vec![20, 21, 22, 23, 24]);

        let low = paginate(numbers(25), PageRequest::new(Some(-4)));
        assert_eq!(low.number, 1);

        let zero = paginate(numbers(25), PageRequest::new(Some(0)));
        assert_eq!(zero.number, 1);
    }

    #[test]
    fn test_empty_sequence() {
        let page = paginate(Vec::<u32>::new(), PageRequest::new(Some(3)));

        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 0);
        assert!(page.is_empty());
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn test_pages_partition_the_sequence() {
        for total in [0u32, 1, 9, 10, 11, 20, 37] {
            let first = paginate(numbers(total), PageRequest::default());
            assert_eq!(first.num_pages, (total as u64).div_ceil(PAGE_SIZE));

            let mut seen = Vec::new();
            for n in 1..=first.num_pages {
                let page = paginate(numbers(total), PageRequest::new(Some(n as i64)));
                assert!(page.len() as u64 <= PAGE_SIZE);
                seen.extend(page.items);
            }
            assert_eq!(seen, numbers(total), "total = {total}");
        }
    }

    #[test]
    fn test_query_parsing_is_lenient() {
        assert_eq!(PageRequest::from_query(Some("2")).number, Some(2));
        assert_eq!(PageRequest::from_query(Some(" 3 ")).number, Some(3));
        assert_eq!(PageRequest::from_query(Some("abc")).number, None);
        assert_eq!(PageRequest::from_query(None).number, None);
        assert_eq!(PageRequest::from_query(Some("2")).per_page, PAGE_SIZE);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = paginate(numbers(12), PageRequest::new(Some(2))).map(|n| n * 10);
        assert_eq!(page.items, vec![100, 110]);
        assert_eq!(page.number, 2);
        assert_eq!(page.total, 12);
    }
}
