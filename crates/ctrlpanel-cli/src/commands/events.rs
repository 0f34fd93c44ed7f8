use ctrlpanel_core::{EventTypes, FetchOutcome, ListController, Resource, group_by_day};

use crate::cli::StatsArgs;
use crate::client::{AppContext, CliError, CliResult};
use crate::commands::resources::list_failure;
use crate::output::{notice, render_list, render_stats};

/// Seed the default event types, then show the event type list.
pub(crate) async fn handle_generate(ctx: &AppContext) -> CliResult<()> {
    let client = ctx.api.event_types();
    client
        .generate()
        .await
        .map_err(|err| CliError::api(err, "Error generating event types"))?;
    notice(ctx.output, "Generated default event types");

    let mut list = ListController::new(client, EventTypes::default_sort());
    if list.refresh().await == FetchOutcome::Failed {
        return Err(list_failure(&list));
    }
    render_list(&list, ctx.output)
}

/// Events per day in `[start, end]`.
pub(crate) async fn handle_stats(ctx: &AppContext, args: StatsArgs) -> CliResult<()> {
    let start = args.start.trim();
    let end = args.end.trim();
    if start.is_empty() || end.is_empty() {
        return Err(CliError::validation("start and end are required"));
    }
    if start > end {
        return Err(CliError::validation("start must not be after end"));
    }
    let events = ctx
        .api
        .events()
        .statistics(start, end)
        .await
        .map_err(|err| CliError::api(err, "Error loading statistics"))?;
    tracing::debug!(count = events.len(), start, end, "statistics loaded");
    render_stats(&group_by_day(&events), ctx.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{DEFAULT_STATS_END, DEFAULT_STATS_START, OutputFormat};
    use crate::commands::test_context;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn stats_args(start: &str, end: &str) -> StatsArgs {
        StatsArgs {
            start: start.into(),
            end: end.into(),
        }
    }

    #[tokio::test]
    async fn stats_query_the_requested_window() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/events/statistics")
                .query_param("startDate", DEFAULT_STATS_START)
                .query_param("endDate", DEFAULT_STATS_END);
            then.status(200).json_body(json!([{
                "id": 1,
                "eventType": {"id": 1, "eventCode": "E01"},
                "controller": {"id": 1, "serialNumber": "SN-1"},
                "eventTime": "2024-01-03T08:00:00"
            }]));
        });
        let dir = tempdir().expect("tempdir");
        let ctx = test_context(&server, &dir, OutputFormat::Json);

        handle_stats(&ctx, stats_args(DEFAULT_STATS_START, DEFAULT_STATS_END))
            .await
            .expect("stats");
        mock.assert();
    }

    #[tokio::test]
    async fn reversed_window_is_rejected_locally() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/v1/events/statistics");
            then.status(200).json_body(json!([]));
        });
        let dir = tempdir().expect("tempdir");
        let ctx = test_context(&server, &dir, OutputFormat::Table);

        let err = handle_stats(&ctx, stats_args("2024-02-01T00:00", "2024-01-01T00:00"))
            .await
            .expect_err("reversed");
        assert_eq!(err.exit_code(), 2);
        mock.assert_calls(0);
    }

    #[tokio::test]
    async fn generate_then_lists_event_types() {
        let server = MockServer::start_async().await;
        let generate = server.mock(|when, then| {
            when.method(GET).path("/api/v1/event-types/generate");
            then.status(200);
        });
        let list = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/event-types")
                .query_param("sortBy", "eventCode,asc");
            then.status(200).json_body(json!({
                "content": [{"id": 1, "eventCode": "E01"}],
                "totalPages": 1
            }));
        });
        let dir = tempdir().expect("tempdir");
        let ctx = test_context(&server, &dir, OutputFormat::Table);

        handle_generate(&ctx).await.expect("generated");
        generate.assert();
        list.assert();
    }
}
