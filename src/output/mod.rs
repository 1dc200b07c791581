pub mod report;

use colored::Colorize;
use itertools::Itertools;
use serde::Serialize;

use crate::countdown::UpdateSchedule;
use crate::notify::{format_line, Notification};
use crate::page::{Container, ContainerContent, Page};
use crate::table::Table;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

/// Everything an export shows: the page, the countdown element (`None` when
/// the update mechanism is disabled) and the notices raised while loading.
/// The schedule lets the HTML export keep counting after it is written.
#[derive(Clone, Debug)]
pub struct Dashboard<'a> {
    pub title: &'a str,
    pub countdown: Option<String>,
    pub schedule: UpdateSchedule,
    pub notices: Vec<Notification>,
    pub page: &'a Page,
}

#[derive(Serialize)]
struct DashboardJson<'a> {
    title: &'a str,
    countdown: Option<&'a str>,
    notices: &'a [Notification],
    containers: Vec<&'a Container>,
}

fn render_table_text(table: &Table, out: &mut String) {
    let columns = table.column_count();
    let mut widths: Vec<usize> = table
        .headers
        .iter()
        .map(|h| h.label.chars().count())
        .collect();
    for row in &table.rows {
        for (i, cell) in row.cells.iter().enumerate().take(columns) {
            widths[i] = widths[i].max(cell.display_text().chars().count());
        }
    }

    let pad = |text: &str, width: usize| format!("{text:<width$}");
    let header = table
        .headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| pad(&h.label, *w).bold().to_string())
        .join("  ");
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(&widths.iter().map(|w| "-".repeat(*w)).join("  "));
    out.push('\n');
    for row in &table.rows {
        let line = widths
            .iter()
            .enumerate()
            .map(|(i, w)| pad(row.cells.get(i).map(|c| c.display_text()).unwrap_or(""), *w))
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
}

pub fn render_text(dashboard: &Dashboard) -> Vec<u8> {
    let mut out = String::new();
    if let Some(countdown) = dashboard.countdown.as_deref() {
        out.push_str(&format!(":: {:<10}: {}\n\n", "Next update", countdown));
    }
    for notice in &dashboard.notices {
        out.push_str(&format_line(notice));
        out.push('\n');
    }
    if !dashboard.notices.is_empty() {
        out.push('\n');
    }
    for container in dashboard.page.containers() {
        out.push_str(&container.title.bold().underline().to_string());
        out.push('\n');
        match &container.content {
            ContainerContent::Empty => out.push_str("(empty)\n"),
            ContainerContent::Loading => out.push_str("Loading...\n"),
            ContainerContent::Failure { message } => {
                out.push_str(&message.red().to_string());
                out.push('\n');
            }
            ContainerContent::Table { table } => render_table_text(table, &mut out),
        }
        out.push('\n');
    }
    out.into_bytes()
}

pub fn render_json(dashboard: &Dashboard) -> Vec<u8> {
    let doc = DashboardJson {
        title: dashboard.title,
        countdown: dashboard.countdown.as_deref(),
        notices: &dashboard.notices,
        containers: dashboard.page.containers().collect(),
    };
    serde_json::to_vec_pretty(&doc).unwrap_or_else(|_| b"{}\n".to_vec())
}

pub fn render_html(dashboard: &Dashboard) -> Vec<u8> {
    report::render_html(dashboard)
}

pub fn render(format: OutputFormat, dashboard: &Dashboard) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(dashboard),
        OutputFormat::Json => render_json(dashboard),
        OutputFormat::Html => render_html(dashboard),
    }
}
