//! List state for the records table: current page, page size, total count,
//! and the search filter, plus the arithmetic the table footer is built from.
//!
//! Loads are split into `begin_load` / `complete_load` so that every fetch
//! carries a token; only the response for the most recently issued token is
//! applied, which makes overlapping page clicks and search edits safe.

use shared::{
    domain::HumanBeing,
    protocol::{ListQuery, PageResponse},
};
use tracing::{debug, warn};

use crate::{ClientResult, RecordApi, DEFAULT_PAGE_SIZE};

/// Width of the numbered page-button strip.
pub const PAGE_WINDOW: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub page: u32,
    pub size: u32,
    pub total: u64,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            total: 0,
        }
    }
}

impl PaginationState {
    pub fn total_pages(&self) -> u32 {
        if self.size == 0 {
            return 0;
        }
        let pages = self.total.div_ceil(u64::from(self.size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page.saturating_add(1) < self.total_pages()
    }

    /// Footer controls are only worth drawing when there is somewhere to go.
    pub fn shows_controls(&self) -> bool {
        self.total_pages() > 1
    }

    pub fn page_window(&self) -> Vec<u32> {
        page_window(self.page, self.total_pages())
    }

    /// 1-based inclusive range of the rows on the current page, for the
    /// "Showing A to B of N results" line.
    pub fn visible_range(&self) -> Option<(u64, u64)> {
        if self.total == 0 || self.size == 0 {
            return None;
        }
        let size = u64::from(self.size);
        let first = u64::from(self.page) * size + 1;
        if first > self.total {
            return None;
        }
        let last = (u64::from(self.page) + 1).saturating_mul(size).min(self.total);
        Some((first, last))
    }

    pub fn empty_hint(&self) -> &'static str {
        if self.total == 0 {
            "Start by creating your first human being"
        } else {
            "Try adjusting your search criteria"
        }
    }
}

/// Page indices to show as buttons: all of them when there are at most
/// five, otherwise five consecutive pages centred on `current` and clamped
/// to `[0, total_pages - 1]`.
pub fn page_window(current: u32, total_pages: u32) -> Vec<u32> {
    let width = PAGE_WINDOW.min(total_pages);
    let start = if total_pages <= PAGE_WINDOW || current <= 2 {
        0
    } else if current >= total_pages - 3 {
        total_pages - PAGE_WINDOW
    } else {
        current - 2
    };
    (start..start + width).collect()
}

/// Issued by [`ListController::begin_load`]; hand it back together with the
/// backend response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    token: u64,
    pub query: ListQuery,
}

impl LoadTicket {
    pub fn token(&self) -> u64 {
        self.token
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load was issued after this one; the response was dropped.
    Stale,
    Failed(String),
}

#[derive(Debug, Default)]
pub struct ListController {
    records: Vec<HumanBeing>,
    pagination: PaginationState,
    search: String,
    loading: bool,
    latest_token: u64,
    last_error: Option<String>,
}

impl ListController {
    pub fn new(page_size: u32) -> Self {
        Self {
            pagination: PaginationState {
                size: page_size.max(1),
                ..PaginationState::default()
            },
            ..Self::default()
        }
    }

    pub fn records(&self) -> &[HumanBeing] {
        &self.records
    }

    pub fn pagination(&self) -> PaginationState {
        self.pagination
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Starts a fetch of `page` using the current size and search term.
    pub fn begin_load(&mut self, page: u32) -> LoadTicket {
        self.latest_token += 1;
        self.loading = true;
        LoadTicket {
            token: self.latest_token,
            query: ListQuery::new(page, self.pagination.size, &self.search),
        }
    }

    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: ClientResult<PageResponse<HumanBeing>>,
    ) -> LoadOutcome {
        if ticket.token != self.latest_token {
            debug!(
                token = ticket.token,
                latest = self.latest_token,
                "discarding stale page response"
            );
            return LoadOutcome::Stale;
        }
        self.loading = false;

        match result {
            Ok(page) => {
                self.records = page.content;
                self.pagination.page = page.number;
                self.pagination.total = page.total_elements;
                self.last_error = None;
                LoadOutcome::Applied
            }
            Err(err) => {
                let message = err.user_message();
                warn!(page = ticket.query.page, error = %message, "failed to load records");
                self.last_error = Some(message.clone());
                LoadOutcome::Failed(message)
            }
        }
    }

    pub async fn load(&mut self, api: &dyn RecordApi, page: u32) -> LoadOutcome {
        let ticket = self.begin_load(page);
        let result = api.list(&ticket.query).await;
        self.complete_load(ticket, result)
    }

    pub async fn reload(&mut self, api: &dyn RecordApi) -> LoadOutcome {
        self.load(api, self.pagination.page).await
    }

    /// Replaces the search term. A changed term always restarts from the
    /// first page; an unchanged one issues nothing.
    pub fn set_search(&mut self, term: impl Into<String>) -> Option<LoadTicket> {
        let term = term.into();
        if term == self.search {
            return None;
        }
        self.search = term;
        Some(self.begin_load(0))
    }

    pub fn set_page_size(&mut self, size: u32) -> Option<LoadTicket> {
        let size = size.max(1);
        if size == self.pagination.size {
            return None;
        }
        self.pagination.size = size;
        Some(self.begin_load(0))
    }

    pub fn next_page(&mut self) -> Option<LoadTicket> {
        let page = self.pagination.page + 1;
        self.pagination.has_next().then(|| self.begin_load(page))
    }

    pub fn previous_page(&mut self) -> Option<LoadTicket> {
        let page = self.pagination.page.checked_sub(1)?;
        Some(self.begin_load(page))
    }
}

#[cfg(test)]
#[path = "tests/pagination_tests.rs"]
mod tests;
