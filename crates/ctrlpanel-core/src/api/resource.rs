//! Per-resource CRUD wrappers plus the resource-specific extra endpoints.

use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;

use async_trait::async_trait;
use ctrlpanel_api_models::{EntityId, Event, PageEnvelope};
use reqwest::Method;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::list::ListSource;
use crate::query::ListQuery;
use crate::resource::{EventTypes, Events, Resource, ResourceKind};

/// Typed client for one resource collection.
pub struct ResourceClient<R: Resource> {
    api: ApiClient,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self::new(self.api.clone())
    }
}

impl<R: Resource> Debug for ResourceClient<R> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ResourceClient")
            .field("resource", &R::KIND)
            .field("base_url", &self.api.base_url().as_str())
            .finish()
    }
}

impl<R: Resource> ResourceClient<R> {
    pub(crate) const fn new(api: ApiClient) -> Self {
        Self {
            api,
            _resource: PhantomData,
        }
    }

    /// Resource this client addresses.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        R::KIND
    }

    pub(crate) const fn api(&self) -> &ApiClient {
        &self.api
    }

    fn item_path(id: EntityId) -> String {
        format!("{}/{id}", R::KIND.collection())
    }

    /// Fetch one page.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the request fails or is rejected.
    pub async fn list(&self, query: &ListQuery) -> Result<PageEnvelope<R::Item>, ApiError> {
        let path = R::KIND.collection();
        let mut url = self.api.endpoint(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.query_pairs() {
                pairs.append_pair(&key, &value);
            }
        }
        let builder = self.api.request(Method::GET, url);
        self.api.send_json(path, builder).await
    }

    /// Fetch one entity.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] when the entity does not exist, or any
    /// other [`ApiError`] on failure.
    pub async fn get(&self, id: EntityId) -> Result<R::Item, ApiError> {
        let path = Self::item_path(id);
        let url = self.api.endpoint(&path)?;
        let builder = self.api.request(Method::GET, url);
        self.api.send_json(&path, builder).await
    }

    /// Create an entity. The response body is not interpreted.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the backend rejects the draft.
    pub async fn create(&self, draft: &R::Draft) -> Result<(), ApiError> {
        let path = R::KIND.collection();
        let url = self.api.endpoint(path)?;
        let builder = self.api.request(Method::POST, url).json(draft);
        self.api.send(path, builder).await.map(drop)
    }

    /// Replace an entity.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the backend rejects the draft.
    pub async fn update(&self, id: EntityId, draft: &R::Draft) -> Result<(), ApiError> {
        let path = Self::item_path(id);
        let url = self.api.endpoint(&path)?;
        let builder = self.api.request(Method::PUT, url).json(draft);
        self.api.send(&path, builder).await.map(drop)
    }

    /// Delete an entity.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the delete fails.
    pub async fn delete(&self, id: EntityId) -> Result<(), ApiError> {
        let path = Self::item_path(id);
        let url = self.api.endpoint(&path)?;
        let builder = self.api.request(Method::DELETE, url);
        self.api.send(&path, builder).await.map(drop)
    }
}

impl ResourceClient<EventTypes> {
    /// Ask the backend to seed its default event types.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the request fails.
    pub async fn generate(&self) -> Result<(), ApiError> {
        let path = "event-types/generate";
        let url = self.api.endpoint(path)?;
        let builder = self.api.request(Method::GET, url);
        self.api.send(path, builder).await.map(drop)
    }
}

impl ResourceClient<Events> {
    /// Events recorded between `start` and `end` (datetime-local strings).
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the request fails.
    pub async fn statistics(&self, start: &str, end: &str) -> Result<Vec<Event>, ApiError> {
        let path = "events/statistics";
        let mut url = self.api.endpoint(path)?;
        url.query_pairs_mut()
            .append_pair("startDate", start)
            .append_pair("endDate", end);
        let builder = self.api.request(Method::GET, url);
        self.api.send_json(path, builder).await
    }
}

#[async_trait]
impl<R: Resource> ListSource for ResourceClient<R> {
    type Item = R::Item;

    fn kind(&self) -> ResourceKind {
        R::KIND
    }

    fn filter_fields(&self) -> &'static [&'static str] {
        R::filter_fields()
    }

    async fn fetch_page(&self, query: &ListQuery) -> Result<PageEnvelope<Self::Item>, ApiError> {
        self.list(query).await
    }

    async fn remove(&self, id: EntityId) -> Result<(), ApiError> {
        self.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Sort;
    use ctrlpanel_api_models::{ControllerDraft, EventDraft};
    use httpmock::prelude::*;
    use reqwest::Client;
    use serde_json::json;

    fn client_for(server: &MockServer) -> ApiClient {
        let base = format!("{}/api/v1", server.base_url())
            .parse()
            .expect("valid URL");
        ApiClient::new(base, Client::new())
    }

    #[tokio::test]
    async fn list_sends_paging_sort_and_filters() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/events")
                .query_param("page", "2")
                .query_param("size", "20")
                .query_param("sortBy", "eventType.eventCode,desc")
                .query_param("controllerSerialNumber", "SN-7");
            then.status(200)
                .json_body(json!({"content": [], "totalPages": 3}));
        });

        let mut query = ListQuery::first_page(20);
        query.page = 2;
        query.sort = Some(Sort::desc("eventType.eventCode"));
        query
            .filters
            .insert("controllerSerialNumber".into(), "SN-7".into());
        let page = client_for(&server)
            .events()
            .list(&query)
            .await
            .expect("page");

        mock.assert();
        assert_eq!(page.total_pages, 3);
        assert!(page.content.is_empty());
    }

    #[tokio::test]
    async fn create_and_update_post_and_put_drafts() {
        let server = MockServer::start_async().await;
        let create = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/controllers")
                .json_body(json!({"serialNumber": "SN-1", "guid": "g-1"}));
            then.status(201);
        });
        let update = server.mock(|when, then| {
            when.method(PUT)
                .path("/api/v1/events/9")
                .json_body(json!({
                    "eventType": 2,
                    "controller": "g-1",
                    "eventTime": "2024-01-05 10:30",
                    "comment": null
                }));
            then.status(200).json_body(json!({"ignored": true}));
        });

        let client = client_for(&server);
        client
            .controllers()
            .create(&ControllerDraft {
                serial_number: "SN-1".into(),
                guid: Some("g-1".into()),
                vehicle_number: None,
            })
            .await
            .expect("create");
        client
            .events()
            .update(
                9,
                &EventDraft {
                    event_type: 2,
                    controller: "g-1".into(),
                    event_time: "2024-01-05 10:30".into(),
                    comment: None,
                },
            )
            .await
            .expect("update");

        create.assert();
        update.assert();
    }

    #[tokio::test]
    async fn delete_missing_entity_is_not_found() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(DELETE).path("/api/v1/event-types/4");
            then.status(404)
                .json_body(json!({"code": "NOT_FOUND", "message": "no such event type"}));
        });

        let err = client_for(&server)
            .event_types()
            .delete(4)
            .await
            .expect_err("missing");
        assert!(matches!(err, ApiError::NotFound { body: Some(_) }));
        assert_eq!(err.info("fallback").code, "NOT_FOUND");
    }

    #[tokio::test]
    async fn generate_and_statistics_hit_extra_endpoints() {
        let server = MockServer::start_async().await;
        let generate = server.mock(|when, then| {
            when.method(GET).path("/api/v1/event-types/generate");
            then.status(200);
        });
        let stats = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/events/statistics")
                .query_param("startDate", "2024-01-01T00:00")
                .query_param("endDate", "2024-01-31T23:59");
            then.status(200).json_body(json!([]));
        });

        let client = client_for(&server);
        client.event_types().generate().await.expect("generate");
        let events = client
            .events()
            .statistics("2024-01-01T00:00", "2024-01-31T23:59")
            .await
            .expect("statistics");

        generate.assert();
        stats.assert();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_classified() {
        let client = ApiClient::new(
            "http://127.0.0.1:9/api/v1".parse().expect("valid URL"),
            Client::new(),
        );
        let err = client
            .controllers()
            .get(1)
            .await
            .expect_err("nothing listens on the discard port");
        assert_eq!(err.kind(), crate::error::ErrorKind::Transport);
    }
}
