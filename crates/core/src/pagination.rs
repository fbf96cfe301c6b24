//! Offset pagination for list/search endpoints.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

crate::string_enum! {
    pub enum SortDirection {
        Asc => "asc",
        Desc => "desc",
    }
}

impl SortDirection {
    /// Orient an ascending comparison.
    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub const DEFAULT_PER_PAGE: u32 = 15;

    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    fn offset(&self) -> usize {
        (self.page as usize - 1) * self.per_page as usize
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PER_PAGE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
    pub last_page: u32,
}

impl<T> Page<T> {
    /// Slice an already filtered and sorted collection.
    pub fn paginate(all: Vec<T>, req: PageRequest) -> Self {
        let req = PageRequest::new(req.page, req.per_page);
        let total = all.len();
        let last_page = total.div_ceil(req.per_page as usize).max(1) as u32;
        let items = all
            .into_iter()
            .skip(req.offset())
            .take(req.per_page as usize)
            .collect();

        Self {
            items,
            total,
            page: req.page,
            per_page: req.per_page,
            last_page,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            last_page: self.last_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_slices_requested_page() {
        let page = Page::paginate((1..=35).collect::<Vec<_>>(), PageRequest::new(3, 15));
        assert_eq!(page.items, (31..=35).collect::<Vec<_>>());
        assert_eq!(page.total, 35);
        assert_eq!(page.last_page, 3);
    }

    #[test]
    fn empty_collection_has_one_empty_page() {
        let page = Page::<u8>::paginate(vec![], PageRequest::default());
        assert!(page.items.is_empty());
        assert_eq!(page.last_page, 1);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = Page::paginate(vec![1, 2, 3], PageRequest::new(9, 2));
        assert!(page.items.is_empty());
        assert_eq!(page.last_page, 2);
    }
}
