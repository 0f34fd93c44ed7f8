//! One-shot backend health probe.

use std::time::Duration;

use crate::api::AuthClient;

/// Upper bound on the probe; CRUD calls carry no default timeout.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// The backend answered with a success status.
    Healthy,
    /// The backend failed, timed out or was unreachable.
    Unavailable {
        /// Short human-readable cause.
        reason: String,
    },
}

impl HealthStatus {
    /// Whether the probe succeeded.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Probe `/health` once with [`HEALTH_TIMEOUT`].
pub async fn probe(auth: &AuthClient) -> HealthStatus {
    probe_with_timeout(auth, HEALTH_TIMEOUT).await
}

/// Probe `/health` once, giving up after `timeout`. Never retried.
pub async fn probe_with_timeout(auth: &AuthClient, timeout: Duration) -> HealthStatus {
    let status = match tokio::time::timeout(timeout, auth.health()).await {
        Ok(Ok(())) => HealthStatus::Healthy,
        Ok(Err(err)) => HealthStatus::Unavailable {
            reason: err.to_string(),
        },
        Err(_) => HealthStatus::Unavailable {
            reason: format!("no answer within {}s", timeout.as_secs()),
        },
    };
    match &status {
        HealthStatus::Healthy => tracing::debug!("backend healthy"),
        HealthStatus::Unavailable { reason } => {
            tracing::warn!(%reason, "backend health check failed");
        }
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use httpmock::prelude::*;
    use reqwest::Client;

    fn auth_for(base: &str) -> AuthClient {
        ApiClient::new(base.parse().expect("valid URL"), Client::new()).auth()
    }

    #[tokio::test]
    async fn success_status_is_healthy() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/v1/health");
            then.status(200);
        });
        let status = probe(&auth_for(&format!("{}/api/v1", server.base_url()))).await;
        mock.assert();
        assert!(status.is_healthy());
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/health");
            then.status(503);
        });
        let status = probe(&auth_for(&format!("{}/api/v1", server.base_url()))).await;
        assert!(matches!(status, HealthStatus::Unavailable { .. }));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/health");
            then.status(200).delay(Duration::from_millis(500));
        });
        let status = probe_with_timeout(
            &auth_for(&format!("{}/api/v1", server.base_url())),
            Duration::from_millis(50),
        )
        .await;
        assert!(matches!(status, HealthStatus::Unavailable { .. }));
    }
}
