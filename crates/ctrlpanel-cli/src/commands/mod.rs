pub(crate) mod auth;
pub(crate) mod browse;
pub(crate) mod events;
pub(crate) mod health;
pub(crate) mod home;
pub(crate) mod prompt;
pub(crate) mod resources;

#[cfg(test)]
pub(crate) fn test_context(
    server: &httpmock::MockServer,
    dir: &tempfile::TempDir,
    output: crate::cli::OutputFormat,
) -> crate::client::AppContext {
    let base = format!("{}/api/v1", server.base_url())
        .parse()
        .expect("valid URL");
    crate::client::AppContext::for_tests(
        ctrlpanel_core::ApiClient::new(base, reqwest::Client::new()),
        dir.path().join("session.json"),
        output,
    )
}
