use std::io::{self, IsTerminal};

use anyhow::anyhow;
use ctrlpanel_core::LogoutOutcome;

use crate::cli::{LoginArgs, RegisterArgs};
use crate::client::{AppContext, CliError, CliResult};

pub(crate) async fn handle_login(ctx: &AppContext, args: LoginArgs) -> CliResult<()> {
    let password = resolve_password(args.password.as_deref(), "Password: ")?;
    ctx.session.login(&args.username, &password).await?;
    println!("Logged in as {}", args.username.trim());
    Ok(())
}

pub(crate) async fn handle_logout(ctx: &AppContext) {
    match ctx.session.logout().await {
        LogoutOutcome::Acknowledged => println!("Logged out"),
        LogoutOutcome::LocalOnly => {
            println!("Logged out locally; the server did not confirm the logout");
        }
    }
}

pub(crate) async fn handle_register(ctx: &AppContext, args: RegisterArgs) -> CliResult<()> {
    let password = resolve_new_password(&args)?;
    ctx.session.register(&args.username, &password).await?;
    println!("Account created. Log in with `ctrlpanel login --username {}`", args.username.trim());
    Ok(())
}

fn resolve_password(flag: Option<&str>, prompt: &str) -> CliResult<String> {
    if let Some(value) = flag {
        return Ok(value.to_string());
    }
    if io::stdin().is_terminal() {
        rpassword::prompt_password(prompt)
            .map_err(|err| CliError::failure(anyhow!("failed to read password from stdin: {err}")))
    } else {
        Err(CliError::validation(
            "password required; supply via --password when running non-interactively",
        ))
    }
}

/// Password plus confirmation; both must match before anything is sent.
pub(crate) fn resolve_new_password(args: &RegisterArgs) -> CliResult<String> {
    let password = resolve_password(args.password.as_deref(), "Password: ")?;
    let confirmation = match (&args.password, &args.confirm_password) {
        (_, Some(confirm)) => confirm.clone(),
        (Some(password), None) => password.clone(),
        (None, None) => resolve_password(None, "Confirm password: ")?,
    };
    if password != confirmation {
        return Err(CliError::validation("Passwords do not match."));
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::commands::test_context;
    use ctrlpanel_core::SessionState;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn register_args(password: &str, confirm: Option<&str>) -> RegisterArgs {
        RegisterArgs {
            username: "operator".into(),
            password: Some(password.into()),
            confirm_password: confirm.map(str::to_string),
        }
    }

    #[test]
    fn mismatched_confirmation_is_rejected() {
        let err = resolve_new_password(&register_args("secret", Some("secreT")))
            .expect_err("mismatch");
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.display_message(), "Passwords do not match.");
        assert_eq!(
            resolve_new_password(&register_args("secret", Some("secret"))).expect("match"),
            "secret"
        );
    }

    #[tokio::test]
    async fn mismatched_registration_never_reaches_backend() {
        let server = MockServer::start_async().await;
        let registration = server.mock(|when, then| {
            when.method(POST).path("/api/v1/registration");
            then.status(201);
        });
        let dir = tempdir().expect("tempdir");
        let ctx = test_context(&server, &dir, OutputFormat::Table);

        let err = handle_register(&ctx, register_args("a", Some("b")))
            .await
            .expect_err("mismatch");
        assert_eq!(err.exit_code(), 2);
        registration.assert_calls(0);
    }

    #[tokio::test]
    async fn rejected_registration_reports_backend_message() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v1/registration");
            then.status(400)
                .json_body(json!({"code": "USER_EXISTS", "message": "Username is taken"}));
        });
        let dir = tempdir().expect("tempdir");
        let ctx = test_context(&server, &dir, OutputFormat::Table);

        let err = handle_register(&ctx, register_args("secret", None))
            .await
            .expect_err("rejected");
        assert_eq!(err.exit_code(), 3);
        assert!(
            err.display_message()
                .starts_with("[USER_EXISTS] Username is taken")
        );
    }

    #[tokio::test]
    async fn login_then_logout_round_trips_session_file() {
        let server = MockServer::start_async().await;
        let login = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/auth")
                .json_body(json!({"username": "operator", "password": "secret"}));
            then.status(200).json_body(json!({"token": "tkn-9"}));
        });
        server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/logout")
                .header("authorization", "Bearer tkn-9");
            then.status(200);
        });
        let dir = tempdir().expect("tempdir");
        let ctx = test_context(&server, &dir, OutputFormat::Table);

        handle_login(
            &ctx,
            LoginArgs {
                username: "operator".into(),
                password: Some("secret".into()),
            },
        )
        .await
        .expect("login");
        login.assert();
        assert!(ctx.session.state().is_authenticated());
        assert!(dir.path().join("session.json").exists());

        handle_logout(&ctx).await;
        assert_eq!(ctx.session.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn refused_credentials_are_a_validation_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v1/auth");
            then.status(401);
        });
        let dir = tempdir().expect("tempdir");
        let ctx = test_context(&server, &dir, OutputFormat::Table);

        let err = handle_login(
            &ctx,
            LoginArgs {
                username: "operator".into(),
                password: Some("wrong".into()),
            },
        )
        .await
        .expect_err("refused");
        assert_eq!(err.display_message(), "Invalid username or password.");
    }
}
