//! `ls`, `get`, `add`, `edit` and `rm` for every resource.

use anyhow::anyhow;
use ctrlpanel_api_models::EntityId;
use ctrlpanel_core::{
    DeleteOutcome, ErrorInfo, FetchOutcome, FieldKind, FormController, FormError, FormResource,
    ListController, ListSource, ResourceClient,
};
use tokio::io::AsyncBufRead;

use crate::cli::{EditArgs, FieldArgs, ListArgs, RemoveArgs, ResourceCommand};
use crate::client::{AppContext, CliError, CliResult};
use crate::commands::prompt::Console;
use crate::output::{CASCADE_WARNING, TableRow, notice, render_item, render_list};

pub(crate) async fn dispatch<R>(ctx: &AppContext, command: ResourceCommand) -> CliResult<()>
where
    R: FormResource,
    R::Item: TableRow,
{
    match command {
        ResourceCommand::Ls(args) => handle_list::<R>(ctx, args).await,
        ResourceCommand::Get(args) => handle_get::<R>(ctx, args.id).await,
        ResourceCommand::Add(fields) => handle_save::<R>(ctx, None, fields).await,
        ResourceCommand::Edit(EditArgs { id, fields }) => {
            handle_save::<R>(ctx, Some(id), fields).await
        }
        ResourceCommand::Rm(args) => handle_remove::<R, _>(ctx, args, &mut Console::stdin()).await,
    }
}

pub(crate) async fn handle_list<R>(ctx: &AppContext, args: ListArgs) -> CliResult<()>
where
    R: FormResource,
    R::Item: TableRow,
{
    let mut list = ListController::new(
        ctx.api.resource::<R>(),
        args.sort.unwrap_or_else(R::default_sort),
    )
    .with_page(args.page)
    .with_size(args.size)?;
    for (field, value) in args.filters {
        list = list.with_filter(field, value)?;
    }
    refresh(&mut list).await?;
    render_list(&list, ctx.output)
}

pub(crate) async fn handle_get<R>(ctx: &AppContext, id: EntityId) -> CliResult<()>
where
    R: FormResource,
    R::Item: TableRow,
{
    let item = ctx
        .api
        .resource::<R>()
        .get(id)
        .await
        .map_err(|err| CliError::api(err, &format!("Error loading {}", R::KIND.item_label())))?;
    render_item(&item, ctx.output)
}

/// Create (`id` is `None`) or update, then show the owning list.
pub(crate) async fn handle_save<R>(
    ctx: &AppContext,
    id: Option<EntityId>,
    fields: FieldArgs,
) -> CliResult<()>
where
    R: FormResource,
    R::Item: TableRow,
{
    let mut form = FormController::new(ctx.api.resource::<R>());
    if let Some(id) = id {
        form.load(id).await?;
    }
    for (name, value) in fields.fields {
        form.set_field(&name, value)?;
    }

    let route = match form.submit().await {
        Ok(route) => route,
        Err(FormError::MissingField { field }) if is_reference::<R>(&field) => {
            if let Err(err) = print_reference_options(ctx).await {
                tracing::debug!(error = %err.display_message(), "could not load form options");
            }
            return Err(FormError::MissingField { field }.into());
        }
        Err(err) => return Err(err.into()),
    };

    let verb = if id.is_some() { "Updated" } else { "Created" };
    notice(ctx.output, &format!("{verb} {}; showing {route}", R::KIND.item_label()));
    show_owning_list::<R>(ctx).await
}

pub(crate) async fn handle_remove<R, In>(
    ctx: &AppContext,
    args: RemoveArgs,
    console: &mut Console<In>,
) -> CliResult<()>
where
    R: FormResource,
    R::Item: TableRow,
    In: AsyncBufRead + Unpin,
{
    let label = R::KIND.item_label();
    if !args.yes {
        if R::KIND.cascades_to_events() {
            println!("{CASCADE_WARNING}");
        }
        if !console.confirm(&format!("Delete {label} {}?", args.id)).await? {
            notice(ctx.output, "Cancelled");
            return Ok(());
        }
    }

    let mut list = ListController::new(ctx.api.resource::<R>(), R::default_sort())
        .with_page(args.page)
        .with_size(args.size)?;
    match list.delete(args.id).await {
        DeleteOutcome::Failed => Err(list_failure(&list)),
        DeleteOutcome::DeletedRefreshFailed => {
            notice(ctx.output, &format!("Deleted {label} {}", args.id));
            Err(list_failure(&list))
        }
        outcome @ (DeleteOutcome::Deleted | DeleteOutcome::DeletedAndRetreated) => {
            tracing::debug!(?outcome, id = args.id, "delete finished");
            notice(ctx.output, &format!("Deleted {label} {}", args.id));
            render_list(&list, ctx.output)
        }
    }
}

async fn show_owning_list<R>(ctx: &AppContext) -> CliResult<()>
where
    R: FormResource,
    R::Item: TableRow,
{
    let mut list = ListController::new(ctx.api.resource::<R>(), R::default_sort());
    refresh(&mut list).await?;
    render_list(&list, ctx.output)
}

async fn refresh<R: FormResource>(list: &mut ListController<ResourceClient<R>>) -> CliResult<()> {
    match list.refresh().await {
        FetchOutcome::Failed => Err(list_failure(list)),
        _ => Ok(()),
    }
}

pub(crate) fn list_failure<S: ListSource>(list: &ListController<S>) -> CliError {
    let info = list.last_error().cloned().unwrap_or_else(|| {
        ErrorInfo::fallback(format!("Error loading {}", list.kind().label()))
    });
    CliError::failure(anyhow!(info.to_string()))
}

fn is_reference<R: FormResource>(field: &str) -> bool {
    R::fields()
        .iter()
        .any(|spec| spec.name == field && spec.kind == FieldKind::Reference)
}

async fn print_reference_options(ctx: &AppContext) -> CliResult<()> {
    let options = FormController::new(ctx.api.events()).load_options().await?;
    eprintln!("event types (--set eventType=<id>):");
    for event_type in &options.event_types {
        eprintln!("  {}  {}", event_type.id, event_type.event_code);
    }
    eprintln!("controllers (--set controller=<guid>):");
    for controller in &options.controllers {
        eprintln!(
            "  {}  {}",
            controller.guid.as_deref().unwrap_or("-"),
            controller.serial_number
        );
    }
    Ok(())
}
