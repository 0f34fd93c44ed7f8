//! Interactive list screen driven by one-letter commands.

use ctrlpanel_api_models::EntityId;
use ctrlpanel_core::{
    Controllers, DeleteOutcome, EventTypes, Events, FetchOutcome, ListController, ListSource,
    Resource,
};
use tokio::io::AsyncBufRead;

use crate::cli::{BrowseArgs, BrowseTarget, OutputFormat};
use crate::client::{AppContext, CliResult};
use crate::commands::prompt::Console;
use crate::output::{CASCADE_WARNING, TableRow, render_list};

const HELP: &str = "\
n / p          next / previous page
g <page>       go to page (1-based)
s <field>      sort by field; again to flip direction
z <size>       page size (1, 10, 20, 50, 100)
f <field>=<v>  stage a filter (empty value unsets it)
a              apply staged filters
c              clear filters
r              refresh
d <id>         delete
x              dismiss the error
q              quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BrowseCommand {
    Next,
    Previous,
    Goto(u32),
    Sort(String),
    Size(u32),
    Filter(String, String),
    Apply,
    Clear,
    Refresh,
    Delete(EntityId),
    Dismiss,
    Help,
    Quit,
}

impl BrowseCommand {
    pub(crate) fn parse(line: &str) -> Result<Self, String> {
        let (verb, rest) = line
            .trim()
            .split_once(char::is_whitespace)
            .map_or((line.trim(), ""), |(verb, rest)| (verb, rest.trim()));
        let command = match verb {
            "n" => Self::Next,
            "p" => Self::Previous,
            "g" => {
                let page: u32 = number(rest, "page")?;
                Self::Goto(page.checked_sub(1).ok_or("pages start at 1")?)
            }
            "s" if !rest.is_empty() => Self::Sort(rest.to_string()),
            "z" => Self::Size(number(rest, "size")?),
            "f" => {
                let (field, value) = rest
                    .split_once('=')
                    .ok_or_else(|| format!("expected field=value, got '{rest}'"))?;
                Self::Filter(field.trim().to_string(), value.to_string())
            }
            "a" => Self::Apply,
            "c" => Self::Clear,
            "r" => Self::Refresh,
            "d" => Self::Delete(number(rest, "id")?),
            "x" => Self::Dismiss,
            "h" | "?" => Self::Help,
            "q" => Self::Quit,
            "s" => return Err("usage: s <field>".to_string()),
            other => return Err(format!("unknown command '{other}'; h for help")),
        };
        Ok(command)
    }
}

fn number<T: std::str::FromStr>(input: &str, what: &str) -> Result<T, String> {
    input
        .parse()
        .map_err(|_| format!("expected a {what}, got '{input}'"))
}

pub(crate) async fn handle_browse(ctx: &AppContext, args: BrowseArgs) -> CliResult<()> {
    let mut console = Console::stdin();
    tracing::debug!(kind = ?args.resource.kind(), size = args.size, "opening browser");
    match args.resource {
        BrowseTarget::Controllers => open::<Controllers, _>(ctx, args, &mut console).await,
        BrowseTarget::EventTypes => open::<EventTypes, _>(ctx, args, &mut console).await,
        BrowseTarget::Events => open::<Events, _>(ctx, args, &mut console).await,
    }
}

async fn open<R, In>(ctx: &AppContext, args: BrowseArgs, console: &mut Console<In>) -> CliResult<()>
where
    R: Resource,
    R::Item: TableRow,
    In: AsyncBufRead + Unpin,
{
    let mut list =
        ListController::new(ctx.api.resource::<R>(), R::default_sort()).with_size(args.size)?;
    run(&mut list, console, ctx.output).await
}

/// Fetch the first page, then read commands until `q` or end of input.
pub(crate) async fn run<S, In>(
    list: &mut ListController<S>,
    console: &mut Console<In>,
    format: OutputFormat,
) -> CliResult<()>
where
    S: ListSource,
    S::Item: TableRow,
    In: AsyncBufRead + Unpin,
{
    list.refresh().await;
    show(list, format)?;

    while let Some(line) = console.ask(&format!("{}> ", list.kind().collection())).await? {
        if line.is_empty() {
            continue;
        }
        let command = match BrowseCommand::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        tracing::debug!(?command, "browse command");
        match command {
            BrowseCommand::Quit => break,
            BrowseCommand::Help => println!("{HELP}"),
            BrowseCommand::Dismiss => {
                list.dismiss_error();
                show(list, format)?;
            }
            BrowseCommand::Filter(field, value) => match list.set_filter(&field, value) {
                Ok(()) => println!("staged {field}; a to apply"),
                Err(err) => println!("{err}"),
            },
            BrowseCommand::Delete(id) => {
                if list.kind().cascades_to_events() {
                    println!("{CASCADE_WARNING}");
                }
                let question = format!("Delete {} {id}?", list.kind().item_label());
                if console.confirm(&question).await? {
                    match list.delete(id).await {
                        DeleteOutcome::Failed => tracing::debug!(id, "delete failed"),
                        DeleteOutcome::DeletedRefreshFailed => {
                            println!("deleted {id}; the list could not be reloaded (r to retry)");
                        }
                        DeleteOutcome::Deleted | DeleteOutcome::DeletedAndRetreated => {}
                    }
                    show(list, format)?;
                }
            }
            other => {
                if let Err(message) = navigate(list, other).await {
                    println!("{message}");
                } else {
                    show(list, format)?;
                }
            }
        }
    }
    Ok(())
}

async fn navigate<S>(list: &mut ListController<S>, command: BrowseCommand) -> Result<FetchOutcome, String>
where
    S: ListSource,
    S::Item: TableRow,
{
    let outcome = match command {
        BrowseCommand::Next => {
            let next = list.page() + 1;
            if next >= list.total_pages() {
                return Err("already on the last page".to_string());
            }
            list.set_page(next).await
        }
        BrowseCommand::Previous => {
            let previous = list.page().checked_sub(1).ok_or("already on the first page")?;
            list.set_page(previous).await
        }
        BrowseCommand::Goto(page) => {
            if list.total_pages() > 0 && page >= list.total_pages() {
                return Err(format!(
                    "no page {}; the list has {}",
                    page + 1,
                    list.total_pages()
                ));
            }
            list.set_page(page).await
        }
        BrowseCommand::Sort(field) => {
            if !<S::Item as TableRow>::columns().iter().any(|c| c.sort_field == field) {
                return Err(format!("cannot sort by '{field}'"));
            }
            list.toggle_sort(&field).await
        }
        BrowseCommand::Size(size) => list.set_size(size).await.map_err(|err| err.to_string())?,
        BrowseCommand::Apply => list.apply_filters().await,
        BrowseCommand::Clear => list.clear_filters().await,
        BrowseCommand::Refresh => list.refresh().await,
        other => return Err(format!("'{other:?}' is not a navigation command")),
    };
    Ok(outcome)
}

fn show<S>(list: &ListController<S>, format: OutputFormat) -> CliResult<()>
where
    S: ListSource,
    S::Item: TableRow,
{
    render_list(list, format)?;
    if let Some(error) = list.last_error() {
        println!("error: {error} (x to dismiss)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_context;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn commands_parse() {
        assert_eq!(BrowseCommand::parse("n"), Ok(BrowseCommand::Next));
        assert_eq!(BrowseCommand::parse(" g 3 "), Ok(BrowseCommand::Goto(2)));
        assert_eq!(
            BrowseCommand::parse("s eventType.eventCode"),
            Ok(BrowseCommand::Sort("eventType.eventCode".into()))
        );
        assert_eq!(
            BrowseCommand::parse("f comment=door open"),
            Ok(BrowseCommand::Filter("comment".into(), "door open".into()))
        );
        assert_eq!(BrowseCommand::parse("d 12"), Ok(BrowseCommand::Delete(12)));
        assert!(BrowseCommand::parse("g 0").is_err());
        assert!(BrowseCommand::parse("z many").is_err());
        assert!(BrowseCommand::parse("s").is_err());
        assert!(BrowseCommand::parse("w").is_err());
    }

    #[tokio::test]
    async fn scripted_session_pages_sorts_and_quits() {
        let server = MockServer::start_async().await;
        let first = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/controllers")
                .query_param("page", "0")
                .query_param("sortBy", "serialNumber,asc");
            then.status(200).json_body(json!({
                "content": [{"id": 1, "serialNumber": "SN-1"}],
                "totalPages": 2
            }));
        });
        let second = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/controllers")
                .query_param("page", "1")
                .query_param("sortBy", "serialNumber,asc");
            then.status(200).json_body(json!({
                "content": [{"id": 2, "serialNumber": "SN-2"}],
                "totalPages": 2
            }));
        });
        let flipped = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/controllers")
                .query_param("page", "1")
                .query_param("sortBy", "serialNumber,desc");
            then.status(200).json_body(json!({
                "content": [{"id": 1, "serialNumber": "SN-1"}],
                "totalPages": 2
            }));
        });
        let dir = tempdir().expect("tempdir");
        let ctx = test_context(&server, &dir, OutputFormat::Table);
        let mut list = ListController::new(ctx.api.controllers(), Controllers::default_sort());
        let mut console = Console::new(&b"n\nn\nbogus\ns serialNumber\nq\nn\n"[..]);

        run(&mut list, &mut console, OutputFormat::Table)
            .await
            .expect("session");
        first.assert();
        second.assert();
        flipped.assert();
        assert_eq!(list.page(), 1);
        assert_eq!(list.sort().to_string(), "serialNumber,desc");
    }

    #[tokio::test]
    async fn goto_past_the_last_page_sends_nothing() {
        let server = MockServer::start_async().await;
        let first = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/controllers")
                .query_param("page", "0");
            then.status(200).json_body(json!({
                "content": [{"id": 1, "serialNumber": "SN-1"}],
                "totalPages": 2
            }));
        });
        let beyond = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/controllers")
                .query_param("page", "4");
            then.status(200)
                .json_body(json!({"content": [], "totalPages": 2}));
        });
        let last = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/controllers")
                .query_param("page", "1");
            then.status(200).json_body(json!({
                "content": [{"id": 2, "serialNumber": "SN-2"}],
                "totalPages": 2
            }));
        });
        let dir = tempdir().expect("tempdir");
        let ctx = test_context(&server, &dir, OutputFormat::Table);
        let mut list = ListController::new(ctx.api.controllers(), Controllers::default_sort());
        let mut console = Console::new(&b"g 5
g 2
q
"[..]);

        run(&mut list, &mut console, OutputFormat::Table)
            .await
            .expect("session");
        first.assert();
        beyond.assert_calls(0);
        last.assert();
        assert_eq!(list.page(), 1);
    }
}
