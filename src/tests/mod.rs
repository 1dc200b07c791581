pub(crate) mod support;

use serde_json::json;

use crate::client::{BackendClient, ClientOptions};
use crate::countdown::{check_missed_updates, UpdateSchedule};
use crate::notify::{Level, RecordingSink};
use crate::page::{ContainerContent, Page};
use crate::storage::{FileStore, KeyValueStore, UPDATE_COUNTER_KEY};
use crate::table::{extract, RenderPlan, SortDirection};
use crate::views::{self, View};
use support::{serve, Route};

fn id_name_plan() -> RenderPlan {
    RenderPlan::new()
        .column("ID", extract::number("id"))
        .column("Name", extract::text("name"))
}

#[test]
fn records_are_sorted_by_key_before_render() {
    let records = vec![json!({"id": 2, "name": "B"}), json!({"id": 1, "name": "A"})];
    let mut page = Page::new();
    views::render_view(&mut page, View::Teams, records, &id_name_plan()).unwrap();

    let table = page.table("teams").unwrap();
    assert_eq!(table.rows[0].cells[0].display_text(), "1");
    assert_eq!(table.rows[0].cells[1].display_text(), "A");
}

#[test]
fn repeated_header_clicks_toggle_direction() {
    let records = vec![
        json!({"id": 1, "name": "charlie"}),
        json!({"id": 2, "name": "Alpha"}),
        json!({"id": 3, "name": "bravo"}),
    ];
    let mut page = Page::new();
    views::render_view(&mut page, View::Teams, records, &id_name_plan()).unwrap();

    assert_eq!(page.sort_table("teams", 1).unwrap(), SortDirection::Ascending);
    let first: Vec<_> = names(&page);
    assert_eq!(first, vec!["Alpha", "bravo", "charlie"]);

    assert_eq!(page.sort_table("teams", 1).unwrap(), SortDirection::Descending);
    assert_eq!(names(&page), vec!["charlie", "bravo", "Alpha"]);

    // a different column starts over at ascending
    assert_eq!(page.sort_table("teams", 0).unwrap(), SortDirection::Ascending);
    assert_eq!(names(&page), vec!["charlie", "Alpha", "bravo"]);
}

fn names(page: &Page) -> Vec<String> {
    page.table("teams")
        .unwrap()
        .rows
        .iter()
        .map(|r| r.cells[1].display_text().to_string())
        .collect()
}

#[test]
fn stored_counter_five_with_seven_elapsed_reports_two_updates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let mut store = FileStore::open(&path).unwrap();
    store.set(UPDATE_COUNTER_KEY, "5").unwrap();

    let schedule = UpdateSchedule::default();
    let now = schedule.month_start(chrono::Utc::now()) + chrono::Duration::hours(7);
    let notice = check_missed_updates(&mut store, &schedule, now)
        .unwrap()
        .unwrap();
    assert_eq!(notice.message, "2 updates");

    let reopened = FileStore::open(&path).unwrap();
    assert_eq!(reopened.get(UPDATE_COUNTER_KEY).as_deref(), Some("7"));
}

#[tokio::test]
async fn failing_panel_does_not_block_the_others() {
    let (base_url, _) = serve(vec![
        Route::ok(
            "/teams/fields",
            r#"[{"id":2,"teamName":"Silver"},{"id":1,"teamName":"Gold","forumLink":"https://forum.example/gold"}]"#,
        ),
        Route::status("/hardware/fields", 500, "boom"),
    ])
    .await;
    let client = BackendClient::new(ClientOptions {
        base_url,
        ..ClientOptions::default()
    })
    .unwrap();

    let sink = RecordingSink::new();
    let mut page = Page::new();
    let summary =
        views::load_panels(&client, &mut page, &[View::Teams, View::Hardware], &sink).await;

    assert_eq!(summary.rendered, vec![View::Teams]);
    assert_eq!(summary.failed, vec![View::Hardware]);

    let teams = page.table("teams").unwrap();
    assert_eq!(teams.rows[0].cells[1].display_text(), "Gold");

    match &page.container("hardware").unwrap().content {
        ContainerContent::Failure { message } => {
            assert_eq!(message, "Failed to load Hardware: 500 Internal Server Error")
        }
        other => panic!("unexpected content: {other:?}"),
    }
    let notices = sink.notifications();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, Level::Failure);
}

#[tokio::test]
async fn users_panel_fetches_dependencies_in_order() {
    let (base_url, requests) = serve(vec![
        Route::ok(
            "/hardware/fields",
            r#"[{"id":1,"hardwareName":"R9","displayName":"Radeon R9"}]"#,
        ),
        Route::ok("/teams/fields", r#"[{"id":3,"teamName":"Blue"}]"#),
        Route::ok(
            "/users/all",
            r#"[{"id":5,"foldingUserName":"f5","displayName":"Five","hardwareId":1,"teamId":3}]"#,
        ),
    ])
    .await;
    let client = BackendClient::new(ClientOptions {
        base_url,
        ..ClientOptions::default()
    })
    .unwrap();

    let sink = RecordingSink::new();
    let mut page = Page::new();
    let summary = views::load_panels(&client, &mut page, &[View::Users], &sink).await;
    assert_eq!(summary.rendered, vec![View::Users]);

    let paths: Vec<String> = requests
        .lock()
        .unwrap()
        .iter()
        .filter_map(|r| r.split_whitespace().nth(1).map(str::to_string))
        .collect();
    assert_eq!(paths, vec!["/hardware/fields", "/teams/fields", "/users/all"]);

    let row = &page.table("users").unwrap().rows[0];
    assert_eq!(row.cells[4].display_text(), "Radeon R9");
    assert_eq!(row.cells[5].display_text(), "Blue");
}
