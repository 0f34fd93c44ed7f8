//! Authentication and health endpoints.

use ctrlpanel_api_models::{Credentials, TokenResponse};
use reqwest::Method;

use crate::api::ApiClient;
use crate::error::ApiError;

/// Client for `/auth`, `/registration`, `/logout` and `/health`.
#[derive(Clone, Debug)]
pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    pub(crate) const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Underlying API client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the backend refuses the credentials or the
    /// request fails.
    pub async fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let path = "auth";
        let url = self.api.endpoint(path)?;
        let builder = self.api.request(Method::POST, url).json(credentials);
        let response: TokenResponse = self.api.send_json(path, builder).await?;
        Ok(response.token)
    }

    /// Register a new account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when registration is refused or fails.
    pub async fn register(&self, credentials: &Credentials) -> Result<(), ApiError> {
        let path = "registration";
        let url = self.api.endpoint(path)?;
        let builder = self.api.request(Method::POST, url).json(credentials);
        self.api.send(path, builder).await.map(drop)
    }

    /// Invalidate the current token on the backend.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the request fails.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let path = "logout";
        let url = self.api.endpoint(path)?;
        let builder = self.api.request(Method::POST, url);
        self.api.send(path, builder).await.map(drop)
    }

    /// Backend liveness check.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a non-success status.
    pub async fn health(&self) -> Result<(), ApiError> {
        let path = "health";
        let url = self.api.endpoint(path)?;
        let builder = self.api.request(Method::GET, url);
        self.api.send(path, builder).await.map(drop)
    }
}
