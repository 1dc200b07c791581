//! Refresh schedule arithmetic for the countdown and missed-update counter.
//!
//! The backend refreshes stats once an hour at `update_minute` past the hour,
//! starting on `first_eligible_day` of each month. Before that day the
//! countdown targets the opening of the window instead. All times are UTC.

pub mod display;
pub mod notifier;

use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};

pub use display::{BarDisplay, CountdownDisplay, RecordingDisplay};
pub use notifier::{check_missed_updates, spawn_countdown, Clock, CountdownLoop, SystemClock};

pub const DEFAULT_UPDATE_MINUTE: u32 = 55;
pub const DEFAULT_FIRST_ELIGIBLE_DAY: u32 = 3;

const SECONDS_PER_HOUR: i64 = 3600;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    BeforeWindowOpen,
    WithinWindow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateSchedule {
    pub update_minute: u32,
    pub first_eligible_day: u32,
}

impl Default for UpdateSchedule {
    fn default() -> Self {
        Self {
            update_minute: DEFAULT_UPDATE_MINUTE,
            first_eligible_day: DEFAULT_FIRST_ELIGIBLE_DAY,
        }
    }
}

/// Snapshot of the countdown at one instant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Remaining {
    pub phase: Phase,
    pub seconds: i64,
}

impl Remaining {
    pub fn is_zero(&self) -> bool {
        self.seconds == 0
    }

    pub fn display(&self) -> String {
        format_remaining(self.seconds)
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

impl UpdateSchedule {
    pub fn validate(&self) -> Result<(), String> {
        if self.update_minute > 59 {
            return Err(format!(
                "invalid update minute {}, expected 0-59",
                self.update_minute
            ));
        }
        if !(1..=31).contains(&self.first_eligible_day) {
            return Err(format!(
                "invalid first eligible day {}, expected 1-31",
                self.first_eligible_day
            ));
        }
        Ok(())
    }

    // Short months clamp the first eligible day to their last day.
    fn eligible_day_in(&self, year: i32, month: u32) -> u32 {
        self.first_eligible_day.clamp(1, days_in_month(year, month))
    }

    pub fn phase(&self, now: DateTime<Utc>) -> Phase {
        if now.day() < self.eligible_day_in(now.year(), now.month()) {
            Phase::BeforeWindowOpen
        } else {
            Phase::WithinWindow
        }
    }

    /// Midnight UTC of the first eligible day in `now`'s month.
    pub fn window_opens_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let day = self.eligible_day_in(now.year(), now.month());
        Utc.with_ymd_and_hms(now.year(), now.month(), day, 0, 0, 0)
            .single()
            .unwrap_or(now)
    }

    /// True during the exact second the window opens. Months whose eligible
    /// day is the 1st have no closed period and never open.
    pub fn is_window_opening(&self, now: DateTime<Utc>) -> bool {
        let opens = self.window_opens_at(now);
        opens.day() > 1 && now.timestamp() == opens.timestamp()
    }

    /// First scheduled refresh mark of `now`'s month: day 1 at `:update_minute`.
    pub fn month_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, self.update_minute, 0)
            .single()
            .unwrap_or(now)
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Remaining {
        let phase = self.phase(now);
        let seconds = match phase {
            Phase::WithinWindow => {
                let target = i64::from(self.update_minute) * 60;
                let current = i64::from(now.minute()) * 60 + i64::from(now.second());
                (target - current).rem_euclid(SECONDS_PER_HOUR)
            }
            Phase::BeforeWindowOpen => {
                (self.window_opens_at(now).timestamp() - now.timestamp()).max(0)
            }
        };
        Remaining { phase, seconds }
    }

    /// Whole hours elapsed since the month's first refresh mark, never negative.
    pub fn elapsed_updates(&self, now: DateTime<Utc>) -> i64 {
        (now.timestamp() - self.month_start(now).timestamp())
            .div_euclid(SECONDS_PER_HOUR)
            .max(0)
    }
}

/// `MM:SS` under an hour, `HH:MM:SS` under a day, `Dd HH:MM:SS` beyond.
pub fn format_remaining(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if days > 0 {
        format!("{days}d {hours:02}:{minutes:02}:{secs:02}")
    } else if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// Delay until the next wall-clock second boundary.
pub fn next_tick_delay(now: DateTime<Utc>) -> Duration {
    let millis = u64::from(now.timestamp_subsec_millis().min(999));
    Duration::from_millis(1000 - millis)
}

pub fn pluralize_updates(count: i64) -> String {
    if count == 1 {
        "1 update".to_string()
    } else {
        format!("{count} updates")
    }
}
