use std::sync::{Arc, Mutex};
use std::time::Duration;

use colored::Colorize;
use indicatif::ProgressBar;
use serde::Serialize;

/// How long auto-dismissing notifications stay visible.
pub const AUTO_DISMISS_AFTER: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Failure,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dismiss {
    Manual,
    After(Duration),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
    pub dismiss: Dismiss,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
            dismiss: Dismiss::Manual,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
            dismiss: Dismiss::After(AUTO_DISMISS_AFTER),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            level: Level::Failure,
            message: message.into(),
            dismiss: Dismiss::Manual,
        }
    }
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: &Notification);
}

pub fn format_line(notification: &Notification) -> String {
    let tag = match notification.level {
        Level::Info => "INF".bold().cyan(),
        Level::Success => "OK ".bold().green(),
        Level::Failure => "ERR".bold().red(),
    };
    format!(
        "{}{}{} {}",
        "[".bold().white(),
        tag,
        "]".bold().white(),
        notification.message.bold().white()
    )
}

/// Prints notifications on stdout, or above a live progress bar when one is
/// attached so the bar is not clobbered.
#[derive(Clone, Default)]
pub struct TerminalSink {
    bar: Option<ProgressBar>,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bar(bar: ProgressBar) -> Self {
        Self { bar: Some(bar) }
    }
}

impl NotificationSink for TerminalSink {
    fn notify(&self, notification: &Notification) {
        let line = format_line(notification);
        match &self.bar {
            Some(bar) => bar.println(line),
            None => println!("{line}"),
        }
        match notification.level {
            Level::Failure => tracing::warn!(message = %notification.message, "notification"),
            _ => tracing::info!(message = %notification.message, "notification"),
        }
    }
}

/// Keeps every notification; used by tests and by the JSON/HTML exports.
#[derive(Clone, Default)]
pub struct RecordingSink {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: &Notification) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(notification.clone());
        }
    }
}

/// Fans one notification out to several sinks.
pub struct Fanout(pub Vec<Arc<dyn NotificationSink>>);

impl NotificationSink for Fanout {
    fn notify(&self, notification: &Notification) {
        for sink in &self.0 {
            sink.notify(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fanout_reaches_every_sink() {
        let a = RecordingSink::new();
        let b = RecordingSink::new();
        let fanout = Fanout(vec![Arc::new(a.clone()), Arc::new(b.clone())]);
        fanout.notify(&Notification::failure("Failed to load teams: 500"));
        assert_eq!(a.notifications().len(), 1);
        assert_eq!(b.notifications()[0].level, Level::Failure);
    }

    #[test]
    fn success_notifications_auto_dismiss() {
        assert_eq!(
            Notification::success("Stats updated").dismiss,
            Dismiss::After(AUTO_DISMISS_AFTER)
        );
        assert_eq!(Notification::info("2 updates").dismiss, Dismiss::Manual);
    }

    #[test]
    fn terminal_line_contains_message() {
        colored::control::set_override(false);
        let line = format_line(&Notification::info("3 updates"));
        assert_eq!(line, "[INF] 3 updates");
    }

    #[test]
    fn terminal_sink_prints_through_attached_bar() {
        let bar = ProgressBar::hidden();
        bar.set_message("Next update in 10:00");
        let sink = TerminalSink::with_bar(bar.clone());
        sink.notify(&Notification::info("Countdown running, press Ctrl-C to stop"));
        // the bar's own line is left alone
        assert_eq!(bar.message(), "Next update in 10:00");
        assert!(!bar.is_finished());
    }
}
