use crate::{
    config::PaginationConfig,
    data::student::{Student, StudentFilter},
    error::RosterResult,
    store::{StudentStore, Window},
};
use std::num::NonZeroU64;

/// One page of a listing, plus what is needed to navigate away from it. Page numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub total_pages: u64,
    pub total_items: u64,
}

impl<T> Page<T> {
    pub const fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub const fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub const fn next_page_number(&self) -> Option<u64> {
        if self.has_next() {
            Some(self.number + 1)
        } else {
            None
        }
    }

    pub const fn previous_page_number(&self) -> Option<u64> {
        if self.has_previous() {
            Some(self.number - 1)
        } else {
            None
        }
    }
}

/// An empty listing still has one (empty) page.
pub fn total_pages(total_items: u64, page_size: NonZeroU64) -> u64 {
    total_items.div_ceil(page_size.get()).max(1)
}

pub fn clamp_page(requested: i64, total_pages: u64) -> u64 {
    requested.max(1).unsigned_abs().min(total_pages.max(1))
}

/// Anything that isn't a whole number (or is absent) asks for the first page.
pub fn parse_page_number(raw: Option<&str>) -> i64 {
    raw.and_then(|raw| raw.trim().parse().ok()).unwrap_or(1)
}

#[derive(Debug, Clone, Copy)]
pub struct StudentQuery {
    page_size: NonZeroU64,
}

impl StudentQuery {
    pub const fn new(config: PaginationConfig) -> Self {
        Self {
            page_size: config.page_size,
        }
    }

    pub async fn fetch_page(
        &self,
        store: &dyn StudentStore,
        filter: &StudentFilter,
        requested_page: i64,
    ) -> RosterResult<Page<Student>> {
        let total_items = store.count(filter).await?;
        let total_pages = total_pages(total_items, self.page_size);
        let number = clamp_page(requested_page, total_pages);

        let window = Window {
            offset: (number - 1) * self.page_size.get(),
            limit: self.page_size.get(),
        };
        let items = store.list(filter, Some(window)).await?;

        Ok(Page {
            items,
            number,
            total_pages,
            total_items,
        })
    }
}
