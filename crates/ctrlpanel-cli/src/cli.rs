//! Argument parsing, logging setup and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ctrlpanel_api_models::EntityId;
use ctrlpanel_core::{
    ApiClient, Controllers, DEFAULT_API_URL, DEFAULT_PAGE_SIZE, EventTypes, Events, ResourceKind,
    Sort,
};
use ctrlpanel_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, command_span, init_logging};
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use crate::client::{AppContext, CliResult, parse_url};
use crate::commands::{auth, browse, events, health, home, resources};

/// Default statistics window, as offered by the statistics screen.
pub(crate) const DEFAULT_STATS_START: &str = "2024-01-01T00:00";
pub(crate) const DEFAULT_STATS_END: &str = "2024-01-31T23:59";

/// Parses CLI arguments, executes the requested command alongside the
/// startup health probe, and returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    install_logging(&cli);

    let command_name = command_label(&cli.command);
    let trace_id = Uuid::new_v4().to_string();
    tracing::debug!(command = command_name, trace_id = %trace_id, "dispatching command");

    let ctx = match AppContext::from_cli(&cli, &trace_id) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            return err.exit_code();
        }
    };

    let probe = wants_startup_probe(&cli).then(|| spawn_startup_probe(&ctx.api));
    let result = dispatch(cli.command, &ctx)
        .instrument(command_span(command_name, &trace_id))
        .await;
    if let Some(handle) = probe
        && let Err(err) = handle.await
    {
        tracing::debug!(error = %err, "health probe task ended abnormally");
    }

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

fn install_logging(cli: &Cli) {
    let level = cli.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL);
    let format = cli
        .log_format
        .as_deref()
        .map_or_else(LogFormat::infer, LogFormat::from_name);
    let config = LoggingConfig {
        level,
        format,
        ..LoggingConfig::default()
    };
    if let Err(err) = init_logging(&config) {
        eprintln!("warning: logging disabled: {err}");
    }
}

const fn wants_startup_probe(cli: &Cli) -> bool {
    !cli.skip_health && !matches!(cli.command, Command::Health)
}

/// Run the probe on its own task so a blocked command cannot delay the banner.
fn spawn_startup_probe(api: &ApiClient) -> tokio::task::JoinHandle<()> {
    let auth = api.auth();
    tokio::spawn(async move {
        let status = ctrlpanel_core::probe(&auth).await;
        health::announce(&status);
    })
}

pub(crate) async fn dispatch(command: Command, ctx: &AppContext) -> CliResult<()> {
    match command {
        Command::Home => {
            home::handle_home(ctx);
            Ok(())
        }
        Command::Health => health::handle_health(ctx).await,
        Command::Login(args) => auth::handle_login(ctx, args).await,
        Command::Logout => {
            auth::handle_logout(ctx).await;
            Ok(())
        }
        Command::Register(args) => auth::handle_register(ctx, args).await,
        Command::Controllers(command) => resources::dispatch::<Controllers>(ctx, command).await,
        Command::EventTypes(EventTypeCommand::Crud(command)) => {
            resources::dispatch::<EventTypes>(ctx, command).await
        }
        Command::EventTypes(EventTypeCommand::Generate) => {
            events::handle_generate(ctx).await
        }
        Command::Events(EventCommand::Crud(command)) => {
            resources::dispatch::<Events>(ctx, command).await
        }
        Command::Events(EventCommand::Stats(args)) => events::handle_stats(ctx, args).await,
        Command::Browse(args) => browse::handle_browse(ctx, args).await,
    }
}

#[derive(Parser)]
#[command(
    name = "ctrlpanel",
    version,
    about = "Manage controllers, event types and events"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "CTRLPANEL_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    #[arg(
        long,
        global = true,
        env = "CTRLPANEL_SESSION_FILE",
        help = "Session file [default: $XDG_CONFIG_HOME/ctrlpanel/session.json]"
    )]
    pub(crate) session_file: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "CTRLPANEL_HTTP_TIMEOUT_SECS",
        help = "Per-request timeout in seconds; unlimited when unset"
    )]
    pub(crate) timeout: Option<u64>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[arg(long, global = true, env = "CTRLPANEL_LOG_FORMAT")]
    pub(crate) log_format: Option<String>,
    #[arg(
        long,
        global = true,
        env = "CTRLPANEL_LOG_LEVEL",
        help = "Log filter when RUST_LOG is unset [default: warn]"
    )]
    pub(crate) log_level: Option<String>,
    #[arg(long, global = true, help = "Do not probe backend health at startup")]
    pub(crate) skip_health: bool,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Landing screen: navigation and the deletion warning.
    Home,
    /// Probe backend health.
    Health,
    /// Log in and persist the session token.
    Login(LoginArgs),
    /// Log out; local state is cleared even if the backend call fails.
    Logout,
    /// Register a new account.
    Register(RegisterArgs),
    /// Manage controllers.
    #[command(subcommand)]
    Controllers(ResourceCommand),
    /// Manage event types.
    #[command(subcommand)]
    EventTypes(EventTypeCommand),
    /// Manage events.
    #[command(subcommand)]
    Events(EventCommand),
    /// Interactive paginated list.
    Browse(BrowseArgs),
}

#[derive(Subcommand, Debug)]
pub(crate) enum ResourceCommand {
    /// List one page.
    Ls(ListArgs),
    /// Show one entity.
    Get(GetArgs),
    /// Create an entity.
    Add(FieldArgs),
    /// Update an entity.
    Edit(EditArgs),
    /// Delete an entity.
    Rm(RemoveArgs),
}

#[derive(Subcommand, Debug)]
pub(crate) enum EventTypeCommand {
    #[command(flatten)]
    Crud(ResourceCommand),
    /// Seed the backend's default event types.
    Generate,
}

#[derive(Subcommand, Debug)]
pub(crate) enum EventCommand {
    #[command(flatten)]
    Crud(ResourceCommand),
    /// Events per day between two local timestamps.
    Stats(StatsArgs),
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ListArgs {
    #[arg(long, default_value_t = 0)]
    pub(crate) page: u32,
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, help = "One of 1, 10, 20, 50, 100")]
    pub(crate) size: u32,
    #[arg(long, help = "Sort key as field[,asc|desc]")]
    pub(crate) sort: Option<Sort>,
    #[arg(
        long = "filter",
        value_parser = parse_assignment,
        help = "Filter as field=value (events only); repeatable"
    )]
    pub(crate) filters: Vec<(String, String)>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct GetArgs {
    pub(crate) id: EntityId,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct FieldArgs {
    #[arg(
        long = "set",
        value_parser = parse_assignment,
        help = "Field value as name=value; repeatable"
    )]
    pub(crate) fields: Vec<(String, String)>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct EditArgs {
    pub(crate) id: EntityId,
    #[command(flatten)]
    pub(crate) fields: FieldArgs,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct RemoveArgs {
    pub(crate) id: EntityId,
    #[arg(long, help = "Skip the confirmation prompt")]
    pub(crate) yes: bool,
    #[arg(long, default_value_t = 0, help = "Page to show after deleting")]
    pub(crate) page: u32,
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub(crate) size: u32,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct StatsArgs {
    #[arg(long, default_value = DEFAULT_STATS_START)]
    pub(crate) start: String,
    #[arg(long, default_value = DEFAULT_STATS_END)]
    pub(crate) end: String,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct LoginArgs {
    #[arg(long, env = "CTRLPANEL_USERNAME")]
    pub(crate) username: String,
    #[arg(long, env = "CTRLPANEL_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct RegisterArgs {
    #[arg(long)]
    pub(crate) username: String,
    #[arg(long, hide_env_values = true, env = "CTRLPANEL_PASSWORD")]
    pub(crate) password: Option<String>,
    #[arg(long, help = "Must match --password when both are given")]
    pub(crate) confirm_password: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct BrowseArgs {
    #[arg(value_enum)]
    pub(crate) resource: BrowseTarget,
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub(crate) size: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum BrowseTarget {
    Controllers,
    EventTypes,
    Events,
}

impl BrowseTarget {
    pub(crate) const fn kind(self) -> ResourceKind {
        match self {
            Self::Controllers => ResourceKind::Controllers,
            Self::EventTypes => ResourceKind::EventTypes,
            Self::Events => ResourceKind::Events,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

/// Parse `name=value`; the value may be empty.
pub(crate) fn parse_assignment(input: &str) -> Result<(String, String), String> {
    let (name, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{input}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{input}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Home => "home",
        Command::Health => "health",
        Command::Login(_) => "login",
        Command::Logout => "logout",
        Command::Register(_) => "register",
        Command::Controllers(command)
        | Command::EventTypes(EventTypeCommand::Crud(command))
        | Command::Events(EventCommand::Crud(command)) => match command {
            ResourceCommand::Ls(_) => "ls",
            ResourceCommand::Get(_) => "get",
            ResourceCommand::Add(_) => "add",
            ResourceCommand::Edit(_) => "edit",
            ResourceCommand::Rm(_) => "rm",
        },
        Command::EventTypes(EventTypeCommand::Generate) => "event_types_generate",
        Command::Events(EventCommand::Stats(_)) => "events_stats",
        Command::Browse(_) => "browse",
    }
}
