//! Output renderers and formatting helpers for CLI commands.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use anyhow::anyhow;
use ctrlpanel_api_models::{Controller, Event, EventType, StatisticsBucket};
use ctrlpanel_core::{ListController, ListSource, ResourceKind, Sort, SortDirection};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

/// Shown on stderr while the backend health probe is failing.
pub(crate) const SERVER_ERROR_BANNER: &str = "\
!! Server error !!
The server did not answer its health check. Please try again later.";

/// Shown on the home screen and before deleting referenced entities.
pub(crate) const CASCADE_WARNING: &str = "Be careful! Deleting controllers and event types also deletes every event attached to them.";

const CHART_WIDTH: usize = 40;

/// A table column; `sort_field` is the backend key the header sorts by.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Column {
    pub(crate) header: &'static str,
    pub(crate) sort_field: &'static str,
}

const fn column(header: &'static str, sort_field: &'static str) -> Column {
    Column { header, sort_field }
}

/// An entity that can be listed as a table row.
pub(crate) trait TableRow: Serialize {
    fn columns() -> &'static [Column];
    fn cells(&self) -> Vec<String>;
}

fn text(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

const CONTROLLER_COLUMNS: [Column; 4] = [
    column("ID", "id"),
    column("SERIAL", "serialNumber"),
    column("GUID", "guid"),
    column("VEHICLE", "vehicleNumber"),
];

impl TableRow for Controller {
    fn columns() -> &'static [Column] {
        &CONTROLLER_COLUMNS
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.serial_number.clone(),
            text(self.guid.as_deref()),
            text(self.vehicle_number.as_deref()),
        ]
    }
}

const EVENT_TYPE_COLUMNS: [Column; 3] = [
    column("ID", "id"),
    column("CODE", "eventCode"),
    column("COMMENT", "comment"),
];

impl TableRow for EventType {
    fn columns() -> &'static [Column] {
        &EVENT_TYPE_COLUMNS
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.event_code.clone(),
            text(self.comment.as_deref()),
        ]
    }
}

const EVENT_COLUMNS: [Column; 8] = [
    column("ID", "id"),
    column("TYPE", "eventType.eventCode"),
    column("TYPE COMMENT", "eventType.comment"),
    column("CONTROLLER", "controller.serialNumber"),
    column("VEHICLE", "controller.vehicleNumber"),
    column("TIME", "eventTime"),
    column("SERVER TIME", "serverTime"),
    column("COMMENT", "comment"),
];

impl TableRow for Event {
    fn columns() -> &'static [Column] {
        &EVENT_COLUMNS
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.event_type.event_code.clone(),
            text(self.event_type.comment.as_deref()),
            self.controller.serial_number.clone(),
            text(self.controller.vehicle_number.as_deref()),
            self.event_time.clone(),
            text(self.server_time.as_deref()),
            text(self.comment.as_deref()),
        ]
    }
}

/// Everything a list screen shows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageView<'a, T> {
    pub(crate) page: u32,
    pub(crate) size: u32,
    pub(crate) total_pages: u32,
    pub(crate) sort: String,
    pub(crate) filters: &'a BTreeMap<String, String>,
    pub(crate) content: &'a [T],
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn render_page<T: TableRow>(
    kind: ResourceKind,
    view: &PageView<'_, T>,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(view),
        OutputFormat::Table => {
            print!("{}", format_page(kind, view));
            Ok(())
        }
    }
}

/// Render the controller's current page.
pub(crate) fn render_list<S>(list: &ListController<S>, format: OutputFormat) -> CliResult<()>
where
    S: ListSource,
    S::Item: TableRow,
{
    let view = PageView {
        page: list.page(),
        size: list.size(),
        total_pages: list.total_pages(),
        sort: list.sort().to_string(),
        filters: list.applied_filters(),
        content: list.content(),
    };
    render_page(list.kind(), &view, format)
}

/// Status line; kept off stdout when stdout carries JSON.
pub(crate) fn notice(format: OutputFormat, message: &str) {
    match format {
        OutputFormat::Table => println!("{message}"),
        OutputFormat::Json => eprintln!("{message}"),
    }
}

pub(crate) fn render_item<T: TableRow>(item: &T, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(item),
        OutputFormat::Table => {
            for (column, cell) in T::columns().iter().zip(item.cells()) {
                println!("{}: {cell}", column.header.to_ascii_lowercase());
            }
            Ok(())
        }
    }
}

pub(crate) fn render_stats(buckets: &[StatisticsBucket], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(buckets),
        OutputFormat::Table => {
            print!("{}", format_chart(buckets, CHART_WIDTH));
            Ok(())
        }
    }
}

const fn indicator(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => " ▲",
        SortDirection::Desc => " ▼",
    }
}

/// Table with the active sort column marked, plus a page footer.
#[must_use]
pub(crate) fn format_page<T: TableRow>(kind: ResourceKind, view: &PageView<'_, T>) -> String {
    let sort = view.sort.parse::<Sort>().ok();
    let headers: Vec<String> = T::columns()
        .iter()
        .map(|column| match &sort {
            Some(sort) if sort.field == column.sort_field => {
                format!("{}{}", column.header, indicator(sort.direction))
            }
            _ => column.header.to_string(),
        })
        .collect();
    let rows: Vec<Vec<String>> = view.content.iter().map(TableRow::cells).collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &headers, &widths);
    if rows.is_empty() {
        let _ = writeln!(out, "(no {})", kind.label());
    }
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    let _ = writeln!(
        out,
        "page {} of {} | size {} | sort {}",
        view.page + 1,
        view.total_pages.max(1),
        view.size,
        view.sort
    );
    if !view.filters.is_empty() {
        let filters: Vec<String> = view
            .filters
            .iter()
            .map(|(field, value)| format!("{field}={value}"))
            .collect();
        let _ = writeln!(out, "filters: {}", filters.join(", "));
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}

/// Horizontal bar chart, one row per day, bars scaled to `width`.
#[must_use]
pub(crate) fn format_chart(buckets: &[StatisticsBucket], width: usize) -> String {
    if buckets.is_empty() {
        return "no events in range\n".to_string();
    }
    let max = buckets.iter().map(|b| b.count).max().unwrap_or(1).max(1);
    let total: u64 = buckets.iter().map(|b| b.count).sum();
    let mut out = String::new();
    for bucket in buckets {
        let scaled = bucket.count.saturating_mul(width as u64) / max;
        let bar = "#".repeat(usize::try_from(scaled).unwrap_or(width).max(1));
        let _ = writeln!(out, "{}  {bar} {}", bucket.date, bucket.count);
    }
    let _ = writeln!(out, "total: {total}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctrlpanel_api_models::EntityId;

    fn controller(id: EntityId, serial: &str) -> Controller {
        Controller {
            id,
            serial_number: serial.into(),
            guid: None,
            vehicle_number: Some("A123BC".into()),
        }
    }

    #[test]
    fn active_sort_column_carries_indicator() {
        let items = vec![controller(1, "SN-1"), controller(2, "SN-22")];
        let filters = BTreeMap::new();
        let view = PageView {
            page: 0,
            size: 10,
            total_pages: 1,
            sort: "serialNumber,desc".into(),
            filters: &filters,
            content: &items,
        };
        let table = format_page(ResourceKind::Controllers, &view);
        let header = table.lines().next().expect("header");
        assert!(header.contains("SERIAL ▼"));
        assert!(!header.contains('▲'));
        assert!(table.contains("SN-22"));
        assert!(table.lines().any(|line| line.starts_with("page 1 of 1")));
    }

    #[test]
    fn empty_page_is_labelled() {
        let filters = BTreeMap::from([("comment".to_string(), "door".to_string())]);
        let view: PageView<'_, Event> = PageView {
            page: 0,
            size: 10,
            total_pages: 0,
            sort: "eventTime,asc".into(),
            filters: &filters,
            content: &[],
        };
        let table = format_page(ResourceKind::Events, &view);
        assert!(table.contains("TIME ▲"));
        assert!(table.contains("(no events)"));
        assert!(table.contains("filters: comment=door"));
    }

    #[test]
    fn chart_scales_to_largest_bucket() {
        let buckets = vec![
            StatisticsBucket {
                date: "2024-01-01".into(),
                count: 4,
            },
            StatisticsBucket {
                date: "2024-01-02".into(),
                count: 1,
            },
        ];
        let chart = format_chart(&buckets, 8);
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines[0], "2024-01-01  ######## 4");
        assert_eq!(lines[1], "2024-01-02  ## 1");
        assert_eq!(lines[2], "total: 5");
    }

    #[test]
    fn empty_chart_says_so() {
        assert_eq!(format_chart(&[], 10), "no events in range\n");
    }
}
