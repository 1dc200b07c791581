use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

use crate::notify::{format_line, Dismiss, Notification};

/// Where the countdown loop writes its text each tick.
pub trait CountdownDisplay: Send {
    fn show(&mut self, text: &str);
    /// One-shot notice raised when the countdown hits zero.
    fn zero_reached(&mut self, notification: &Notification);
}

/// Spinner line showing `Next update in MM:SS`. The zero notice replaces the
/// prefix until its dismiss timeout passes.
pub struct BarDisplay {
    bar: ProgressBar,
    notice_until: Option<Instant>,
}

impl BarDisplay {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix}{msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self::with_bar(bar)
    }

    pub fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            notice_until: None,
        }
    }

    pub fn bar(&self) -> ProgressBar {
        self.bar.clone()
    }
}

impl Default for BarDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownDisplay for BarDisplay {
    fn show(&mut self, text: &str) {
        if let Some(until) = self.notice_until {
            if Instant::now() >= until {
                self.bar.set_prefix("");
                self.notice_until = None;
            }
        }
        self.bar.set_message(format!("Next update in {text}"));
        self.bar.tick();
    }

    fn zero_reached(&mut self, notification: &Notification) {
        self.bar.set_prefix(format!("{} ", format_line(notification)));
        // manual notices stay until the next one replaces them
        self.notice_until = match notification.dismiss {
            Dismiss::After(after) => Instant::now().checked_add(after),
            Dismiss::Manual => None,
        };
    }
}

impl Drop for BarDisplay {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Collects every frame; handy for driving the loop in tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingDisplay {
    pub frames: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    pub notices: std::sync::Arc<std::sync::Mutex<Vec<Notification>>>,
}

impl RecordingDisplay {
    pub fn frames(&self) -> Vec<String> {
        self.frames.lock().map(|f| f.clone()).unwrap_or_default()
    }

    pub fn notices(&self) -> Vec<Notification> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }
}

impl CountdownDisplay for RecordingDisplay {
    fn show(&mut self, text: &str) {
        if let Ok(mut frames) = self.frames.lock() {
            frames.push(text.to_string());
        }
    }

    fn zero_reached(&mut self, notification: &Notification) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notification.clone());
        }
    }
}
