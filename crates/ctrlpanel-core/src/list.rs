//! Generic paginated, sortable, filterable list controller.
//!
//! # Design
//! - One controller per list screen, parameterised by its [`ListSource`].
//! - Every trigger (page, size, sort, apply/clear filters, refresh) issues a
//!   fetch tagged with a [`FetchTicket`]; only the newest ticket may change
//!   content or clear `loading`, so an older response arriving late is dropped.
//! - Failures keep the previous content visible and record `last_error` until
//!   it is dismissed.

use std::collections::BTreeMap;

use async_trait::async_trait;
use ctrlpanel_api_models::{EntityId, PageEnvelope};
use thiserror::Error;

use crate::error::{ApiError, ErrorInfo};
use crate::query::{DEFAULT_PAGE_SIZE, ListQuery, PAGE_SIZES, Sort, is_valid_page_size};
use crate::resource::ResourceKind;

/// Backend operations a list screen needs.
#[async_trait]
pub trait ListSource: Send + Sync {
    /// Row type.
    type Item: Clone + Send + Sync;

    /// Resource listed by this source.
    fn kind(&self) -> ResourceKind;

    /// Filter fields accepted by [`ListSource::fetch_page`].
    fn filter_fields(&self) -> &'static [&'static str];

    /// Fetch one page.
    async fn fetch_page(&self, query: &ListQuery) -> Result<PageEnvelope<Self::Item>, ApiError>;

    /// Delete one item.
    async fn remove(&self, id: EntityId) -> Result<(), ApiError>;
}

/// Invalid list parameters rejected before any request is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListError {
    /// Page size outside [`PAGE_SIZES`].
    #[error("page size {size} is not one of {PAGE_SIZES:?}")]
    InvalidPageSize {
        /// Rejected size.
        size: u32,
    },
    /// Filter field the resource does not support.
    #[error("{kind:?} lists cannot be filtered by '{field}'")]
    UnknownFilter {
        /// Listed resource.
        kind: ResourceKind,
        /// Rejected field.
        field: String,
    },
}

/// Identifies one issued fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    id: u64,
    query: ListQuery,
}

impl FetchTicket {
    /// Query the fetch was issued with.
    #[must_use]
    pub const fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Monotonic request id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }
}

/// What a completed fetch did to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Content and page count were replaced.
    Applied,
    /// The fetch failed; `last_error` is set and content is unchanged.
    Failed,
    /// A newer fetch was issued meanwhile; the response was discarded.
    Stale,
}

/// Result of a delete issued through the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Deleted and refreshed at the same page.
    Deleted,
    /// Deleted; the page became empty so the controller moved back one page.
    DeletedAndRetreated,
    /// The delete went through but reloading the list failed; `last_error`
    /// is set and the rows shown may still include the deleted item.
    DeletedRefreshFailed,
    /// The delete failed; `last_error` is set.
    Failed,
}

/// State and operations of one list screen.
#[derive(Debug)]
pub struct ListController<S: ListSource> {
    source: S,
    page: u32,
    size: u32,
    sort: Sort,
    staged: BTreeMap<String, String>,
    applied: BTreeMap<String, String>,
    content: Vec<S::Item>,
    total_pages: u32,
    loading: bool,
    last_error: Option<ErrorInfo>,
    issued: u64,
}

impl<S: ListSource> ListController<S> {
    /// Controller at page 0 with the default size and the given sort.
    /// Nothing is fetched until the first trigger.
    #[must_use]
    pub fn new(source: S, sort: Sort) -> Self {
        Self {
            source,
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort,
            staged: BTreeMap::new(),
            applied: BTreeMap::new(),
            content: Vec::new(),
            total_pages: 0,
            loading: false,
            last_error: None,
            issued: 0,
        }
    }

    /// Start at `page` instead of page 0 (no fetch). A page past the end is
    /// moved to the last page by the first fetch.
    #[must_use]
    pub const fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Start with `size` items per page (no fetch).
    ///
    /// # Errors
    ///
    /// Returns [`ListError::InvalidPageSize`] for sizes outside [`PAGE_SIZES`].
    pub fn with_size(mut self, size: u32) -> Result<Self, ListError> {
        if !is_valid_page_size(size) {
            return Err(ListError::InvalidPageSize { size });
        }
        self.size = size;
        Ok(self)
    }

    /// Start with an applied filter (no fetch).
    ///
    /// # Errors
    ///
    /// Returns [`ListError::UnknownFilter`] when the source does not support
    /// `field`.
    pub fn with_filter(
        mut self,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, ListError> {
        let field = field.into();
        self.check_filter(&field)?;
        let value = value.into();
        self.staged.insert(field.clone(), value.clone());
        self.applied.insert(field, value);
        Ok(self)
    }

    /// Listed resource.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.source.kind()
    }

    /// Underlying source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Current page index.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Current page size.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Active sort key.
    #[must_use]
    pub const fn sort(&self) -> &Sort {
        &self.sort
    }

    /// Filter values as typed but not yet applied.
    #[must_use]
    pub const fn staged_filters(&self) -> &BTreeMap<String, String> {
        &self.staged
    }

    /// Filter values sent with every fetch.
    #[must_use]
    pub const fn applied_filters(&self) -> &BTreeMap<String, String> {
        &self.applied
    }

    /// Rows of the last successful fetch.
    #[must_use]
    pub fn content(&self) -> &[S::Item] {
        &self.content
    }

    /// Page count of the last successful fetch.
    #[must_use]
    pub const fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Whether a fetch is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Error of the last failed operation, until dismissed.
    #[must_use]
    pub const fn last_error(&self) -> Option<&ErrorInfo> {
        self.last_error.as_ref()
    }

    /// Clear `last_error`.
    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// Parameters the next fetch will use.
    #[must_use]
    pub fn query(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            size: self.size,
            sort: Some(self.sort.clone()),
            filters: self.applied.clone(),
        }
    }

    /// The current page is past the end: empty while not on the first page.
    #[must_use]
    pub fn needs_retreat(&self) -> bool {
        self.content.is_empty() && self.page > 0
    }

    /// Go to page `page` and fetch. When the backend reports fewer pages, the
    /// controller settles on the last one.
    pub async fn set_page(&mut self, page: u32) -> FetchOutcome {
        self.page = page;
        self.fetch().await
    }

    /// Change the page size, reset to page 0 and fetch.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::InvalidPageSize`] for sizes outside [`PAGE_SIZES`];
    /// nothing changes and nothing is fetched.
    pub async fn set_size(&mut self, size: u32) -> Result<FetchOutcome, ListError> {
        if !is_valid_page_size(size) {
            return Err(ListError::InvalidPageSize { size });
        }
        self.size = size;
        self.page = 0;
        Ok(self.fetch().await)
    }

    /// Header click on `field`: flip direction on the active key, otherwise
    /// select `field` ascending. Fetches.
    pub async fn toggle_sort(&mut self, field: &str) -> FetchOutcome {
        self.sort = self.sort.toggled(field);
        self.fetch().await
    }

    /// Stage a filter value without fetching. An empty value unsets it.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::UnknownFilter`] when the source does not support
    /// `field`.
    pub fn set_filter(&mut self, field: &str, value: impl Into<String>) -> Result<(), ListError> {
        self.check_filter(field)?;
        self.staged.insert(field.to_string(), value.into());
        Ok(())
    }

    /// Apply staged filters, reset to page 0 and fetch.
    pub async fn apply_filters(&mut self) -> FetchOutcome {
        self.applied = self
            .staged
            .iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        self.page = 0;
        self.fetch().await
    }

    /// Empty every filter, reset to page 0 and fetch.
    pub async fn clear_filters(&mut self) -> FetchOutcome {
        self.staged.clear();
        self.applied.clear();
        self.page = 0;
        self.fetch().await
    }

    /// Fetch again with the current parameters.
    pub async fn refresh(&mut self) -> FetchOutcome {
        self.fetch().await
    }

    /// Delete `id`, refresh the same page, and step back one page when the
    /// deletion emptied it. A failed reload after a successful delete is
    /// reported as [`DeleteOutcome::DeletedRefreshFailed`].
    pub async fn delete(&mut self, id: EntityId) -> DeleteOutcome {
        if let Err(err) = self.source.remove(id).await {
            tracing::warn!(kind = ?self.kind(), id, error = %err, "delete failed");
            self.last_error = Some(err.info(&format!(
                "Error deleting {}",
                self.kind().item_label()
            )));
            return DeleteOutcome::Failed;
        }
        tracing::info!(kind = ?self.kind(), id, "deleted");

        let before = self.page;
        if self.refresh().await == FetchOutcome::Failed {
            return DeleteOutcome::DeletedRefreshFailed;
        }
        if self.page < before {
            return DeleteOutcome::DeletedAndRetreated;
        }
        if self.needs_retreat() {
            self.page -= 1;
            if self.fetch().await == FetchOutcome::Failed {
                return DeleteOutcome::DeletedRefreshFailed;
            }
            return DeleteOutcome::DeletedAndRetreated;
        }
        DeleteOutcome::Deleted
    }

    /// Issue a fetch: mark loading and capture the current query.
    ///
    /// Pair with [`ListController::complete_fetch`] when the request is driven
    /// outside the controller.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        self.loading = true;
        FetchTicket {
            id: self.issued,
            query: self.query(),
        }
    }

    /// Record the response of a fetch issued with [`ListController::begin_fetch`].
    pub fn complete_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: Result<PageEnvelope<S::Item>, ApiError>,
    ) -> FetchOutcome {
        if ticket.id != self.issued {
            tracing::debug!(
                ticket = ticket.id,
                newest = self.issued,
                "discarding superseded list response"
            );
            return FetchOutcome::Stale;
        }
        self.loading = false;
        match result {
            Ok(page) => {
                self.content = page.content;
                self.total_pages = page.total_pages;
                FetchOutcome::Applied
            }
            Err(err) => {
                tracing::warn!(kind = ?self.kind(), error = %err, "list fetch failed");
                self.last_error = Some(err.info(&format!("Error loading {}", self.kind().label())));
                FetchOutcome::Failed
            }
        }
    }

    /// Fetch the current page; a page at or past the reported page count is
    /// replaced by the last page and fetched once more.
    async fn fetch(&mut self) -> FetchOutcome {
        let outcome = self.fetch_current().await;
        if outcome == FetchOutcome::Applied
            && self.total_pages > 0
            && self.page >= self.total_pages
        {
            tracing::debug!(
                page = self.page,
                total_pages = self.total_pages,
                "page past the end, moving to the last page"
            );
            self.page = self.total_pages - 1;
            return self.fetch_current().await;
        }
        outcome
    }

    async fn fetch_current(&mut self) -> FetchOutcome {
        let ticket = self.begin_fetch();
        let result = self.source.fetch_page(ticket.query()).await;
        self.complete_fetch(&ticket, result)
    }

    fn check_filter(&self, field: &str) -> Result<(), ListError> {
        if self.source.filter_fields().contains(&field) {
            Ok(())
        } else {
            Err(ListError::UnknownFilter {
                kind: self.source.kind(),
                field: field.to_string(),
            })
        }
    }
}
