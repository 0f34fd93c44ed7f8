use anyhow::anyhow;
use ctrlpanel_core::{HealthStatus, probe};

use crate::cli::OutputFormat;
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{SERVER_ERROR_BANNER, print_json};

pub(crate) async fn handle_health(ctx: &AppContext) -> CliResult<()> {
    let status = probe(&ctx.api.auth()).await;
    match ctx.output {
        OutputFormat::Json => {
            let reason = match &status {
                HealthStatus::Healthy => None,
                HealthStatus::Unavailable { reason } => Some(reason.as_str()),
            };
            print_json(&serde_json::json!({
                "healthy": status.is_healthy(),
                "reason": reason,
            }))?;
        }
        OutputFormat::Table => {
            if status.is_healthy() {
                println!("backend healthy");
            }
        }
    }
    match status {
        HealthStatus::Healthy => Ok(()),
        HealthStatus::Unavailable { reason } => {
            eprintln!("{SERVER_ERROR_BANNER}");
            Err(CliError::failure(anyhow!("backend unavailable: {reason}")))
        }
    }
}

/// Startup banner; silent when healthy.
pub(crate) fn announce(status: &HealthStatus) {
    if !status.is_healthy() {
        eprintln!("{SERVER_ERROR_BANNER}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_context;
    use httpmock::prelude::*;
    use tempfile::tempdir;

    fn context(server: &MockServer, dir: &tempfile::TempDir) -> AppContext {
        test_context(server, dir, OutputFormat::Table)
    }

    #[tokio::test]
    async fn healthy_backend_succeeds() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/v1/health");
            then.status(200);
        });
        let dir = tempdir().expect("tempdir");
        handle_health(&context(&server, &dir))
            .await
            .expect("healthy");
        mock.assert();
    }

    #[tokio::test]
    async fn failing_backend_is_an_operational_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/health");
            then.status(503);
        });
        let dir = tempdir().expect("tempdir");
        let err = handle_health(&context(&server, &dir))
            .await
            .expect_err("unhealthy");
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().starts_with("backend unavailable"));
    }
}
