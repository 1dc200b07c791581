//! Dashboard panels: which endpoint feeds which container, how records are
//! ordered before render, and the column plan for each.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use serde_json::Value;
use thiserror::Error;

use crate::client::{BackendClient, BackendError};
use crate::notify::{Notification, NotificationSink};
use crate::page::Page;
use crate::table::{extract, render_table, sort_records, RenderError, RenderPlan};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum View {
    Hardware,
    Teams,
    Users,
    Leaderboard,
    Competition,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Leaderboard,
        View::Competition,
        View::Teams,
        View::Users,
        View::Hardware,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "hardware" => Some(Self::Hardware),
            "teams" | "team" => Some(Self::Teams),
            "users" | "user" => Some(Self::Users),
            "leaderboard" | "team-leaderboard" => Some(Self::Leaderboard),
            "competition" | "user-stats" => Some(Self::Competition),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            View::Hardware => "hardware",
            View::Teams => "teams",
            View::Users => "users",
            View::Leaderboard => "leaderboard",
            View::Competition => "competition",
        }
    }

    pub fn container_id(self) -> &'static str {
        match self {
            View::Competition => "user_stats",
            other => other.name(),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            View::Hardware => "Hardware",
            View::Teams => "Teams",
            View::Users => "Users",
            View::Leaderboard => "Team Leaderboard",
            View::Competition => "User Competition",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            View::Hardware => "/hardware/fields",
            View::Teams => "/teams/fields",
            View::Users => "/users/all",
            View::Leaderboard => "/stats/leaderboard",
            View::Competition => "/stats/users",
        }
    }

    pub fn sort_key(self) -> &'static str {
        match self {
            View::Leaderboard | View::Competition => "rank",
            _ => "id",
        }
    }
}

/// Id → display name indexes used to resolve user references.
#[derive(Clone, Debug, Default)]
pub struct Lookups {
    pub hardware: Arc<HashMap<i64, String>>,
    pub teams: Arc<HashMap<i64, String>>,
}

impl Lookups {
    pub fn from_records(hardware: &[Value], teams: &[Value]) -> Self {
        Self {
            hardware: Arc::new(extract::name_index(hardware, "displayName")),
            teams: Arc::new(extract::name_index(teams, "teamName")),
        }
    }
}

pub fn hardware_plan() -> RenderPlan {
    RenderPlan::new()
        .column("ID", extract::number("id"))
        .column("Name", extract::text("hardwareName"))
        .column("Display Name", extract::text("displayName"))
        .column("Operating System", extract::optional_text("operatingSystem"))
        .column("Multiplier", extract::number("multiplier"))
        .column("Average PPD", extract::optional_number("averagePpd"))
}

pub fn teams_plan() -> RenderPlan {
    RenderPlan::new()
        .column("ID", extract::number("id"))
        .column("Name", extract::text("teamName"))
        .column("Description", extract::optional_text("teamDescription"))
        .column("Forum", extract::optional_link("forumLink", "Link"))
}

pub fn users_plan(lookups: &Lookups) -> RenderPlan {
    RenderPlan::new()
        .column("ID", extract::number("id"))
        .column("Folding Name", extract::text("foldingUserName"))
        .column(
            "Display Name",
            extract::text_with_link("displayName", "profileLink"),
        )
        .column("Category", extract::optional_text("category"))
        .column(
            "Hardware",
            extract::lookup("hardwareId", lookups.hardware.clone()),
        )
        .column("Team", extract::lookup("teamId", lookups.teams.clone()))
        .column(
            "Live Stats",
            extract::optional_link("liveStatsLink", "Live Stats"),
        )
}

pub fn leaderboard_plan() -> RenderPlan {
    RenderPlan::new()
        .column("Rank", extract::number("rank"))
        .column("Team", extract::text("teamName"))
        .column(
            "Points",
            extract::points_with_unmultiplied("teamMultipliedPoints", "teamPoints"),
        )
        .column("Units", extract::number("teamUnits"))
        .column("Diff To Leader", extract::optional_number("diffToLeader"))
        .column("Diff To Next", extract::optional_number("diffToNext"))
}

pub fn competition_plan() -> RenderPlan {
    RenderPlan::new()
        .column("Rank", extract::number("rank"))
        .column(
            "User",
            extract::text_with_link("displayName", "profileLink"),
        )
        .column("Hardware", extract::optional_text("hardware"))
        .column("Category", extract::optional_text("category"))
        .column(
            "Points",
            extract::points_with_unmultiplied("multipliedPoints", "points"),
        )
        .column("Units", extract::number("units"))
        .column("Diff To Leader", extract::optional_number("diffToLeader"))
        .column("Diff To Next", extract::optional_number("diffToNext"))
}

#[derive(Debug, Error)]
pub enum PanelError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl PanelError {
    /// Short reason shown to the user: the HTTP status when there is one.
    pub fn reason(&self) -> String {
        match self {
            PanelError::Backend(e) => match e.status() {
                Some(status) => status.to_string(),
                None => e.to_string(),
            },
            PanelError::Render(e) => e.to_string(),
        }
    }
}

/// Fetches everything `view` needs. Dependent collections are requested one
/// after another: hardware, then teams, then the users themselves.
pub async fn fetch_view(
    client: &BackendClient,
    view: View,
) -> Result<(Vec<Value>, RenderPlan), BackendError> {
    let plan = match view {
        View::Users => {
            let hardware = client.get_records(View::Hardware.path()).await?;
            let teams = client.get_records(View::Teams.path()).await?;
            users_plan(&Lookups::from_records(&hardware, &teams))
        }
        View::Hardware => hardware_plan(),
        View::Teams => teams_plan(),
        View::Leaderboard => leaderboard_plan(),
        View::Competition => competition_plan(),
    };
    let records = client.get_records(view.path()).await?;
    Ok((records, plan))
}

/// Orders records by the view's key and renders them into its container.
pub fn render_view(
    page: &mut Page,
    view: View,
    mut records: Vec<Value>,
    plan: &RenderPlan,
) -> Result<(), RenderError> {
    sort_records(&mut records, view.sort_key());
    render_table(page, view.container_id(), &records, plan)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PanelSummary {
    pub rendered: Vec<View>,
    pub failed: Vec<View>,
}

/// Loads every panel independently. A failing panel shows its failure and
/// raises a notification; the others still render.
pub async fn load_panels(
    client: &BackendClient,
    page: &mut Page,
    views: &[View],
    sink: &dyn NotificationSink,
) -> PanelSummary {
    for view in views {
        page.add_container(view.container_id(), view.title());
        page.set_loading(view.container_id());
    }

    let mut pending = views
        .iter()
        .map(|&view| async move { (view, fetch_view(client, view).await) })
        .collect::<FuturesUnordered<_>>();

    let mut summary = PanelSummary::default();
    while let Some((view, fetched)) = pending.next().await {
        let outcome = fetched
            .map_err(PanelError::from)
            .and_then(|(records, plan)| Ok(render_view(page, view, records, &plan)?));
        match outcome {
            Ok(()) => {
                tracing::info!(view = view.name(), "panel loaded");
                summary.rendered.push(view);
            }
            Err(e) => {
                let message = format!("Failed to load {}: {}", view.title(), e.reason());
                tracing::warn!(view = view.name(), error = %e, "panel failed");
                page.set_failure(view.container_id(), message.clone());
                sink.notify(&Notification::failure(message));
                summary.failed.push(view);
            }
        }
    }
    summary
}
