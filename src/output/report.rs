use super::Dashboard;
use crate::notify::{Dismiss, Level, Notification, AUTO_DISMISS_AFTER};
use crate::page::ContainerContent;
use crate::table::{Cell, Table};

// Sorting follows the in-process rules: lower-cased text without thousands
// separators, integers numerically, ascending first and descending when
// ascending moved nothing. The countdown follows `countdown::CountdownLoop`
// in UTC, redrawn on each wall-clock second.
const PAGE_SCRIPT: &str = r#"
    function cellText(row, n) {
      const cell = row.cells[n];
      return cell ? cell.innerText.trim().toLowerCase().replace(/,/g, '') : '';
    }

    function compareCells(x, y) {
      const intPattern = /^[-+]?\d+$/;
      if (intPattern.test(x) && intPattern.test(y)) {
        return Math.sign(parseInt(x, 10) - parseInt(y, 10));
      }
      return x < y ? -1 : (x > y ? 1 : 0);
    }

    function bubblePasses(body, n, dir) {
      let swaps = 0;
      const count = body.rows.length;
      for (let pass = 0; pass < count; pass++) {
        let passSwaps = 0;
        for (let i = 1; i < body.rows.length; i++) {
          const a = body.rows[i - 1];
          const b = body.rows[i];
          const c = compareCells(cellText(a, n), cellText(b, n));
          if ((dir === 'asc' && c > 0) || (dir === 'desc' && c < 0)) {
            body.insertBefore(b, a);
            passSwaps++;
          }
        }
        swaps += passSwaps;
        if (passSwaps === 0) break;
      }
      return swaps;
    }

    function sortTable(n, tableId) {
      const table = document.getElementById(tableId);
      if (!table || !table.tBodies.length) return;
      const body = table.tBodies[0];
      let dir = 'asc';
      if (bubblePasses(body, n, 'asc') === 0) {
        bubblePasses(body, n, 'desc');
        dir = 'desc';
      }
      table.dataset.sortColumn = n;
      table.dataset.sortDirection = dir;
    }

    document.querySelectorAll('.notice[data-dismiss-ms]').forEach(function (el) {
      setTimeout(function () { el.remove(); }, Number(el.dataset.dismissMs));
    });
    document.querySelectorAll('.notice button').forEach(function (btn) {
      btn.addEventListener('click', function () { btn.parentElement.remove(); });
    });

    function formatRemaining(seconds) {
      const s = Math.max(0, seconds);
      const days = Math.floor(s / 86400);
      const hours = Math.floor((s % 86400) / 3600);
      const minutes = Math.floor((s % 3600) / 60);
      const secs = s % 60;
      const pad = function (v) { return String(v).padStart(2, '0'); };
      if (days > 0) return days + 'd ' + pad(hours) + ':' + pad(minutes) + ':' + pad(secs);
      if (hours > 0) return pad(hours) + ':' + pad(minutes) + ':' + pad(secs);
      return pad(minutes) + ':' + pad(secs);
    }

    function eligibleDay(now, firstDay) {
      const last = new Date(Date.UTC(now.getUTCFullYear(), now.getUTCMonth() + 1, 0)).getUTCDate();
      return Math.min(Math.max(firstDay, 1), last);
    }

    function countdownState(now, minute, firstDay) {
      const day = eligibleDay(now, firstDay);
      if (now.getUTCDate() < day) {
        const opensAt = Date.UTC(now.getUTCFullYear(), now.getUTCMonth(), day);
        return { phase: 'before', seconds: Math.max(0, Math.ceil((opensAt - now.getTime()) / 1000)) };
      }
      const current = now.getUTCMinutes() * 60 + now.getUTCSeconds();
      return { phase: 'within', seconds: (((minute * 60 - current) % 3600) + 3600) % 3600 };
    }

    function isWindowOpening(now, firstDay) {
      const day = eligibleDay(now, firstDay);
      const opensAt = Date.UTC(now.getUTCFullYear(), now.getUTCMonth(), day);
      return day > 1 && Math.floor(now.getTime() / 1000) * 1000 === opensAt;
    }

    function showNotice(message, dismissMs) {
      const notices = document.getElementById('notices');
      if (!notices) return;
      const el = document.createElement('div');
      el.className = 'notice success';
      el.dataset.dismissMs = dismissMs;
      const text = document.createElement('span');
      text.textContent = message;
      const close = document.createElement('button');
      close.type = 'button';
      close.innerHTML = '&times;';
      close.addEventListener('click', function () { el.remove(); });
      el.appendChild(text);
      el.appendChild(close);
      notices.appendChild(el);
      setTimeout(function () { el.remove(); }, dismissMs);
    }

    (function () {
      const countdown = document.getElementById('countdown');
      const value = document.getElementById('countdown-value');
      if (!countdown || countdown.hidden || !value || countdown.dataset.updateMinute === undefined) return;
      const minute = Number(countdown.dataset.updateMinute);
      const firstDay = Number(countdown.dataset.firstDay);
      const dismissMs = Number(countdown.dataset.noticeMs);
      let lastPhase = null;

      function tick() {
        const now = new Date();
        const state = countdownState(now, minute, firstDay);
        const opened = state.phase === 'within'
          && (lastPhase === null ? isWindowOpening(now, firstDay) : lastPhase === 'before');
        lastPhase = state.phase;
        if (opened) {
          value.textContent = formatRemaining(0);
          showNotice('Update window is now open', dismissMs);
        } else {
          value.textContent = formatRemaining(state.seconds);
          if (state.seconds === 0) showNotice('Stats are updating now', dismissMs);
        }
        setTimeout(tick, 1000 - new Date().getMilliseconds());
      }
      tick();
    })();
"#;

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn render_cell(cell: &Cell) -> String {
    match cell {
        Cell::Empty => "<td></td>".to_string(),
        Cell::Text { text } => format!("<td>{}</td>", escape_html(text)),
        Cell::Link { text, href } => format!(
            r#"<td><a href="{}" target="_blank" rel="noopener">{}</a></td>"#,
            escape_html(href),
            escape_html(text)
        ),
        Cell::Tooltip { text, tooltip } => format!(
            r#"<td><span class="has-tooltip" title="{}">{}</span></td>"#,
            escape_html(tooltip),
            escape_html(text)
        ),
    }
}

fn render_table(table: &Table) -> String {
    let mut out = String::new();
    let sort_attrs = table
        .sort
        .map(|s| {
            format!(
                r#" data-sort-column="{}" data-sort-direction="{}""#,
                s.column,
                s.direction.label()
            )
        })
        .unwrap_or_default();
    out.push_str(&format!(
        r#"<table id="{}" class="stats-table"{}>"#,
        escape_html(&table.id),
        sort_attrs
    ));
    out.push_str("\n<thead><tr>");
    for header in &table.headers {
        out.push_str(&format!(
            r#"<th onclick="sortTable({}, '{}')">{}</th>"#,
            header.on_click.column,
            escape_html(&header.on_click.table_id),
            escape_html(&header.label)
        ));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in &table.rows {
        out.push_str("<tr>");
        for cell in &row.cells {
            out.push_str(&render_cell(cell));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>");
    out
}

fn render_notice(notice: &Notification) -> String {
    let class = match notice.level {
        Level::Info => "notice info",
        Level::Success => "notice success",
        Level::Failure => "notice failure",
    };
    let dismiss = match notice.dismiss {
        Dismiss::After(after) => format!(r#" data-dismiss-ms="{}""#, after.as_millis()),
        Dismiss::Manual => String::new(),
    };
    format!(
        r#"<div class="{class}"{dismiss}><span>{}</span><button type="button">&times;</button></div>"#,
        escape_html(&notice.message)
    )
}

pub fn render_html(dashboard: &Dashboard) -> Vec<u8> {
    let countdown = match dashboard.countdown.as_deref() {
        Some(text) => format!(
            r#"<div id="countdown" data-update-minute="{}" data-first-day="{}" data-notice-ms="{}">Next update in <span id="countdown-value">{}</span></div>"#,
            dashboard.schedule.update_minute,
            dashboard.schedule.first_eligible_day,
            AUTO_DISMISS_AFTER.as_millis(),
            escape_html(text)
        ),
        None => r#"<div id="countdown" hidden></div>"#.to_string(),
    };

    let notices = dashboard
        .notices
        .iter()
        .map(render_notice)
        .collect::<Vec<_>>()
        .join("\n");

    let mut sections = String::new();
    for container in dashboard.page.containers() {
        let body = match &container.content {
            ContainerContent::Empty => String::new(),
            ContainerContent::Loading => r#"<div class="loader">Loading...</div>"#.to_string(),
            ContainerContent::Failure { message } => {
                format!(r#"<p class="failure">{}</p>"#, escape_html(message))
            }
            ContainerContent::Table { table } => render_table(table),
        };
        sections.push_str(&format!(
            "<section id=\"{id}-section\">\n<h2>{title}</h2>\n<div id=\"{id}-container\">\n{body}\n</div>\n</section>\n",
            id = escape_html(&container.id),
            title = escape_html(&container.title),
        ));
    }

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>{title}</title>
  <style>
    body {{ font-family: 'Inter', sans-serif; margin: 0; background: #f8fafc; color: #0f172a; }}
    header {{ display: flex; justify-content: space-between; align-items: center; padding: 1rem 2rem; background: #fff; border-bottom: 1px solid #e2e8f0; }}
    main {{ max-width: 1440px; margin: 0 auto; padding: 2rem; }}
    h1, h2 {{ font-family: 'Montserrat', sans-serif; letter-spacing: -0.025em; }}
    #countdown {{ font-weight: 600; color: #135bec; }}
    .stats-table {{ width: 100%; border-collapse: collapse; margin-bottom: 2rem; background: #fff; }}
    .stats-table th {{ cursor: pointer; text-align: left; padding: 0.75rem 1rem; font-size: 11px; text-transform: uppercase; letter-spacing: 0.1em; background: #f1f5f9; }}
    .stats-table td {{ padding: 0.5rem 1rem; border-top: 1px solid #e2e8f0; }}
    .has-tooltip {{ border-bottom: 1px dotted #64748b; cursor: help; }}
    .notice {{ display: flex; justify-content: space-between; padding: 0.75rem 1rem; margin-bottom: 0.5rem; border-radius: 0.5rem; }}
    .notice button {{ border: none; background: transparent; cursor: pointer; font-size: 1.25rem; }}
    .notice.info {{ background: #e0f2fe; }}
    .notice.success {{ background: #dcfce7; }}
    .notice.failure {{ background: #fee2e2; }}
    .failure {{ color: #b91c1c; }}
  </style>
</head>
<body>
  <header>
    <h1>{title}</h1>
    {countdown}
  </header>
  <main>
    <div id="notices">
{notices}
    </div>
{sections}
  </main>
  <script>
{script}
  </script>
</body>
</html>
"####,
        title = escape_html(dashboard.title),
        countdown = countdown,
        notices = notices,
        sections = sections,
        script = PAGE_SCRIPT,
    );
    html.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::UpdateSchedule;
    use crate::page::Page;
    use crate::table::{extract, render_table as build, RenderPlan};
    use serde_json::json;

    fn dashboard_html(countdown: Option<String>) -> String {
        let plan = RenderPlan::new()
            .column("User", extract::text_with_link("displayName", "profileLink"))
            .column(
                "Points",
                extract::points_with_unmultiplied("multipliedPoints", "points"),
            );
        let mut page = Page::new();
        build(
            &mut page,
            "user_stats",
            &[json!({
                "displayName": "<Folder>",
                "profileLink": "https://stats.example/donor/1",
                "multipliedPoints": 2000,
                "points": 1000
            })],
            &plan,
        )
        .unwrap();
        let dashboard = Dashboard {
            title: "Folding Stats",
            countdown,
            schedule: UpdateSchedule {
                update_minute: 40,
                first_eligible_day: 5,
            },
            notices: vec![Notification::info("3 updates")],
            page: &page,
        };
        String::from_utf8(render_html(&dashboard)).unwrap()
    }

    #[test]
    fn headers_call_sort_with_column_and_table() {
        let html = dashboard_html(Some("10:00".to_string()));
        assert!(html.contains(r#"<th onclick="sortTable(0, 'user_stats')">User</th>"#));
        assert!(html.contains(r#"<th onclick="sortTable(1, 'user_stats')">Points</th>"#));
        assert!(html.contains(r#"<table id="user_stats""#));
    }

    #[test]
    fn cells_are_escaped_and_decorated() {
        let html = dashboard_html(None);
        assert!(html.contains("&lt;Folder&gt;"));
        assert!(html.contains(r#"href="https://stats.example/donor/1""#));
        assert!(html.contains(r#"title="Unmultiplied: 1,000">2,000</span>"#));
        assert!(html.contains("3 updates"));
    }

    #[test]
    fn countdown_hidden_when_disabled() {
        let hidden = dashboard_html(None);
        assert!(hidden.contains(r#"<div id="countdown" hidden></div>"#));
        assert!(!hidden.contains("data-update-minute"));

        let live = dashboard_html(Some("04:59".to_string()));
        assert!(live.contains(
            r#"<div id="countdown" data-update-minute="40" data-first-day="5" data-notice-ms="5000">"#
        ));
        assert!(live.contains(r#"<span id="countdown-value">04:59</span>"#));
    }

    #[test]
    fn page_script_keeps_the_countdown_ticking() {
        let html = dashboard_html(Some("04:59".to_string()));
        assert!(html.contains("setTimeout(tick, 1000 - new Date().getMilliseconds())"));
        assert!(html.contains("Date.UTC("));
        assert!(html.contains("'Update window is now open'"));
        assert!(html.contains("'Stats are updating now'"));
    }
}
