//! In-memory list backend for controller tests.
//!
//! Paginates and deletes like the real endpoints but ignores sort and filter
//! values; it records every query so tests can assert on them instead.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use ctrlpanel_api_models::{Controller, EntityId, ErrorBody, Event, EventType, PageEnvelope};
use ctrlpanel_core::resource::EVENT_FILTER_FIELDS;
use ctrlpanel_core::{ApiError, ListQuery, ListSource, ResourceKind};

/// Fake resource collection implementing [`ListSource`].
#[derive(Debug)]
pub struct InMemoryResource<T> {
    kind: ResourceKind,
    filter_fields: &'static [&'static str],
    id_of: fn(&T) -> EntityId,
    items: Mutex<Vec<T>>,
    queries: Mutex<Vec<ListQuery>>,
    failures: Mutex<VecDeque<ApiError>>,
    fetch_failures: Mutex<VecDeque<ApiError>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Clone + Send + Sync> InMemoryResource<T> {
    /// Collection of `kind` holding `items`.
    #[must_use]
    pub fn new(
        kind: ResourceKind,
        filter_fields: &'static [&'static str],
        items: Vec<T>,
        id_of: fn(&T) -> EntityId,
    ) -> Self {
        Self {
            kind,
            filter_fields,
            id_of,
            items: Mutex::new(items),
            queries: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            fetch_failures: Mutex::new(VecDeque::new()),
        }
    }

    /// Number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every query received so far, oldest first.
    #[must_use]
    pub fn queries(&self) -> Vec<ListQuery> {
        lock(&self.queries).clone()
    }

    /// Most recent query.
    #[must_use]
    pub fn last_query(&self) -> Option<ListQuery> {
        lock(&self.queries).last().cloned()
    }

    /// Make the next call (fetch or remove) fail with `error`.
    pub fn fail_next(&self, error: ApiError) {
        lock(&self.failures).push_back(error);
    }

    /// Make the next call fail with a 500 carrying `body`.
    pub fn fail_next_with_body(&self, body: ErrorBody) {
        self.fail_next(ApiError::Server {
            status: 500,
            body: Some(body),
        });
    }

    /// Make the next page fetch fail with `error`; removes are unaffected.
    pub fn fail_next_fetch(&self, error: ApiError) {
        lock(&self.fetch_failures).push_back(error);
    }

    fn take_failure(&self) -> Option<ApiError> {
        lock(&self.failures).pop_front()
    }
}

impl InMemoryResource<Controller> {
    /// Controllers collection.
    #[must_use]
    pub fn controllers(items: Vec<Controller>) -> Self {
        Self::new(ResourceKind::Controllers, &[], items, |item| item.id)
    }
}

impl InMemoryResource<EventType> {
    /// Event types collection.
    #[must_use]
    pub fn event_types(items: Vec<EventType>) -> Self {
        Self::new(ResourceKind::EventTypes, &[], items, |item| item.id)
    }
}

impl InMemoryResource<Event> {
    /// Events collection accepting the event filter fields.
    #[must_use]
    pub fn events(items: Vec<Event>) -> Self {
        Self::new(ResourceKind::Events, &EVENT_FILTER_FIELDS, items, |item| {
            item.id
        })
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> ListSource for InMemoryResource<T> {
    type Item = T;

    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn filter_fields(&self) -> &'static [&'static str] {
        self.filter_fields
    }

    async fn fetch_page(&self, query: &ListQuery) -> Result<PageEnvelope<T>, ApiError> {
        lock(&self.queries).push(query.clone());
        if let Some(error) = self
            .take_failure()
            .or_else(|| lock(&self.fetch_failures).pop_front())
        {
            return Err(error);
        }
        let items = lock(&self.items);
        let size = query.size.max(1) as usize;
        let total = items.len();
        let content = items
            .iter()
            .skip(query.page as usize * size)
            .take(size)
            .cloned()
            .collect();
        Ok(PageEnvelope {
            content,
            total_pages: u32::try_from(total.div_ceil(size)).unwrap_or(u32::MAX),
            total_elements: Some(total as u64),
            number: Some(query.page),
            size: Some(query.size),
        })
    }

    async fn remove(&self, id: EntityId) -> Result<(), ApiError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        let mut items = lock(&self.items);
        let before = items.len();
        items.retain(|item| (self.id_of)(item) != id);
        if items.len() == before {
            return Err(ApiError::NotFound { body: None });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::controllers;

    #[tokio::test]
    async fn pages_are_sliced_by_size() {
        let source = InMemoryResource::controllers(controllers(11));
        let mut query = ListQuery::first_page(10);
        let first = source.fetch_page(&query).await.expect("page 0");
        assert_eq!(first.content.len(), 10);
        assert_eq!(first.total_pages, 2);

        query.page = 1;
        let second = source.fetch_page(&query).await.expect("page 1");
        assert_eq!(second.content.len(), 1);
        assert_eq!(source.queries().len(), 2);
    }

    #[tokio::test]
    async fn removing_unknown_id_is_not_found() {
        let source = InMemoryResource::controllers(controllers(1));
        assert!(matches!(
            source.remove(9).await,
            Err(ApiError::NotFound { .. })
        ));
        source.remove(1).await.expect("remove");
        assert!(source.is_empty());
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_once() {
        let source = InMemoryResource::controllers(controllers(1));
        source.fail_next(ApiError::Server {
            status: 503,
            body: None,
        });
        assert!(source.fetch_page(&ListQuery::default()).await.is_err());
        assert!(source.fetch_page(&ListQuery::default()).await.is_ok());
    }

    #[tokio::test]
    async fn fetch_failures_skip_removes() {
        let source = InMemoryResource::controllers(controllers(2));
        source.fail_next_fetch(ApiError::Server {
            status: 503,
            body: None,
        });
        source.remove(1).await.expect("remove");
        assert!(source.fetch_page(&ListQuery::default()).await.is_err());
        assert_eq!(source.len(), 1);
    }
}
