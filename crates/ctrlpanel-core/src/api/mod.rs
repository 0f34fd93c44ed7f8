//! HTTP client for the control panel backend.
//!
//! # Design
//! - One [`ApiClient`] per backend; it owns the `reqwest::Client`, the base URL
//!   and the [`SessionSlot`] the session store publishes into.
//! - Credentials are injected per request from the slot, never through a
//!   process-wide default header.
//! - Non-success responses are classified into [`ApiError`] at this layer so
//!   callers only see the taxonomy.

mod auth;
mod resource;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::resource::{Controllers, EventTypes, Events, Resource};
use crate::session::SessionSlot;

pub use auth::AuthClient;
pub use resource::ResourceClient;

/// Backend base URL used when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";

/// Request identifier header attached to every call.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

/// Construction parameters for [`ApiClient::from_config`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL including the `/api/v1` prefix.
    pub base_url: Url,
    /// Optional per-request timeout; CRUD calls have none by default.
    pub timeout: Option<Duration>,
    /// Optional request identifier sent as `x-request-id`.
    pub request_id: Option<String>,
}

/// Shared HTTP client bound to one backend and one session slot.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    session: SessionSlot,
}

impl ApiClient {
    /// Wrap an existing `reqwest::Client`.
    #[must_use]
    pub fn new(base_url: Url, http: Client) -> Self {
        Self {
            http,
            base_url: normalise_base(base_url),
            session: SessionSlot::new(),
        }
    }

    /// Build the HTTP client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidHeader`] when the request id is not a valid
    /// header value, or [`ApiError::Client`] when the client cannot be built.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        if let Some(request_id) = &config.request_id {
            let value = HeaderValue::from_str(request_id).map_err(|_| ApiError::InvalidHeader {
                name: HEADER_REQUEST_ID,
            })?;
            default_headers.insert(HEADER_REQUEST_ID, value);
        }

        let mut builder = Client::builder().default_headers(default_headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|source| ApiError::Client { source })?;
        Ok(Self::new(config.base_url.clone(), http))
    }

    /// Base URL with a trailing slash.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Session slot the client reads credentials from.
    #[must_use]
    pub const fn session(&self) -> &SessionSlot {
        &self.session
    }

    /// Typed wrapper for one resource.
    #[must_use]
    pub fn resource<R: Resource>(&self) -> ResourceClient<R> {
        ResourceClient::new(self.clone())
    }

    /// Controllers endpoints.
    #[must_use]
    pub fn controllers(&self) -> ResourceClient<Controllers> {
        self.resource()
    }

    /// Event type endpoints.
    #[must_use]
    pub fn event_types(&self) -> ResourceClient<EventTypes> {
        self.resource()
    }

    /// Event endpoints.
    #[must_use]
    pub fn events(&self) -> ResourceClient<Events> {
        self.resource()
    }

    /// Authentication and health endpoints.
    #[must_use]
    pub fn auth(&self) -> AuthClient {
        AuthClient::new(self.clone())
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!(%method, path = url.path(), "backend request");
        let builder = self.http.request(method, url);
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub(crate) async fn send(
        &self,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(classify_problem(response).await)
        }
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.send(path, builder).await?;
        response.json::<T>().await.map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

/// Classify a non-success HTTP response.
pub(crate) async fn classify_problem(response: Response) -> ApiError {
    let status = response.status();
    let bytes = response.bytes().await.unwrap_or_default();
    let error = ApiError::from_status(status, &bytes);
    tracing::debug!(status = status.as_u16(), error = %error, "backend rejected request");
    error
}

fn normalise_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> ApiClient {
        let base = format!("{}/api/v1", server.base_url())
            .parse()
            .expect("valid URL");
        ApiClient::new(base, Client::new())
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let client = ApiClient::new(
            DEFAULT_API_URL.parse().expect("valid URL"),
            Client::new(),
        );
        assert_eq!(client.base_url().path(), "/api/v1/");
        let endpoint = client.endpoint("/controllers/5").expect("endpoint");
        assert_eq!(endpoint.path(), "/api/v1/controllers/5");
    }

    #[test]
    fn from_config_rejects_invalid_request_id() {
        let config = ApiConfig {
            base_url: DEFAULT_API_URL.parse().expect("valid URL"),
            timeout: None,
            request_id: Some("bad\nid".to_string()),
        };
        assert!(matches!(
            ApiClient::from_config(&config),
            Err(ApiError::InvalidHeader { .. })
        ));
    }

    #[tokio::test]
    async fn bearer_token_is_read_per_request() {
        let server = MockServer::start_async().await;
        let anonymous = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/health")
                .header_missing("authorization");
            then.status(200);
        });
        let client = client_for(&server);
        client.auth().health().await.expect("anonymous health");
        anonymous.assert();

        let authed = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/controllers/1")
                .header("authorization", "Bearer abc");
            then.status(200).json_body(serde_json::json!({
                "id": 1,
                "serialNumber": "SN-1",
                "guid": null
            }));
        });
        client.session().publish(SessionState::Authenticated {
            token: "abc".to_string(),
        });
        let controller = client.controllers().get(1).await.expect("controller");
        assert_eq!(controller.serial_number, "SN-1");
        authed.assert();
    }
}
