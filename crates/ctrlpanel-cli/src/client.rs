//! Application context and the CLI error type.

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use anyhow::anyhow;
use ctrlpanel_core::{
    ApiClient, ApiConfig, ApiError, FileTokenStore, FormError, ListError, SessionError,
    SessionStore,
};

use crate::cli::{Cli, OutputFormat};

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    /// Backend failure shown as `[code] message`, keeping the source chain.
    pub(crate) fn api(error: ApiError, fallback: &str) -> Self {
        let info = error.info(fallback);
        Self::Failure(anyhow::Error::new(error).context(info.to_string()))
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ListError> for CliError {
    fn from(error: ListError) -> Self {
        Self::validation(error.to_string())
    }
}

impl From<FormError> for CliError {
    fn from(error: FormError) -> Self {
        match error {
            FormError::Backend(info) => Self::failure(anyhow!(info.to_string())),
            other => Self::validation(other.to_string()),
        }
    }
}

impl From<SessionError> for CliError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::MissingCredentials => {
                Self::validation("username and password are required")
            }
            SessionError::InvalidCredentials => {
                Self::validation("Invalid username or password.")
            }
            SessionError::RegistrationRejected(source) => {
                Self::api(source, "Registration failed. Please try again.")
            }
            other => Self::failure(other),
        }
    }
}

/// Application context passed to command handlers.
pub(crate) struct AppContext {
    pub(crate) api: ApiClient,
    pub(crate) session: SessionStore<FileTokenStore>,
    pub(crate) output: OutputFormat,
}

impl AppContext {
    /// Build the API client and restore any persisted session.
    pub(crate) fn from_cli(cli: &Cli, trace_id: &str) -> CliResult<Self> {
        let config = ApiConfig {
            base_url: cli.api_url.clone(),
            timeout: cli.timeout.map(Duration::from_secs),
            request_id: Some(trace_id.to_string()),
        };
        let api = ApiClient::from_config(&config)
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;
        let session_file = cli.session_file.clone().unwrap_or_else(default_session_file);
        tracing::debug!(path = %session_file.display(), "using session file");
        let session = SessionStore::open(api.auth(), FileTokenStore::new(session_file))?;
        Ok(Self {
            api,
            session,
            output: cli.output,
        })
    }

    /// Context over an explicit client and session file.
    #[cfg(test)]
    pub(crate) fn for_tests(
        api: ApiClient,
        session_file: std::path::PathBuf,
        output: OutputFormat,
    ) -> Self {
        let session = SessionStore::open(api.auth(), FileTokenStore::new(session_file))
            .expect("open session");
        Self {
            api,
            session,
            output,
        }
    }
}

/// `$XDG_CONFIG_HOME/ctrlpanel/session.json`, falling back to
/// `$HOME/.config/ctrlpanel/session.json`, then the working directory.
pub(crate) fn default_session_file() -> std::path::PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|value| !value.is_empty())
        .map(std::path::PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME")
                .filter(|value| !value.is_empty())
                .map(|home| std::path::PathBuf::from(home).join(".config"))
        })
        .unwrap_or_default();
    base.join("ctrlpanel").join("session.json")
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<url::Url, String> {
    input
        .parse::<url::Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctrlpanel_core::ErrorInfo;

    #[test]
    fn exit_codes_split_validation_from_failure() {
        assert_eq!(CliError::validation("bad").exit_code(), 2);
        assert_eq!(CliError::failure(anyhow!("boom")).exit_code(), 3);
    }

    #[test]
    fn backend_form_errors_keep_code_and_message() {
        let err = CliError::from(FormError::Backend(ErrorInfo::new(
            "DUPLICATE_GUID",
            "guid taken",
        )));
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.display_message(), "[DUPLICATE_GUID] guid taken");
    }

    #[test]
    fn local_form_errors_are_validation() {
        let err = CliError::from(FormError::MissingField {
            field: "serialNumber".into(),
        });
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.display_message(), "serialNumber is required");
    }

    #[test]
    fn api_errors_prefer_backend_body() {
        let err = CliError::api(
            ApiError::Server {
                status: 500,
                body: None,
            },
            "Error loading events",
        );
        assert!(
            err.display_message()
                .starts_with("[Unknown Error] Error loading events")
        );
    }

    #[test]
    fn parse_url_rejects_garbage() {
        assert!(parse_url("http://localhost:8080/api/v1").is_ok());
        assert!(parse_url("not a url").is_err());
    }
}
