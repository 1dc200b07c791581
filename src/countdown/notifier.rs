use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use super::{
    format_remaining, next_tick_delay, pluralize_updates, CountdownDisplay, Phase, UpdateSchedule,
};
use crate::notify::Notification;
use crate::storage::{KeyValueStore, StorageError, UPDATE_COUNTER_KEY};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Compares the stored update counter with the hours elapsed this month and
/// returns a notice for any refreshes missed since the last visit. The counter
/// is overwritten with the current value every time.
pub fn check_missed_updates(
    store: &mut dyn KeyValueStore,
    schedule: &UpdateSchedule,
    now: DateTime<Utc>,
) -> Result<Option<Notification>, StorageError> {
    let current = schedule.elapsed_updates(now);
    let previous = store
        .get(UPDATE_COUNTER_KEY)
        .and_then(|raw| raw.trim().parse::<i64>().ok());

    let notification = match previous {
        Some(previous) if current > previous => {
            tracing::info!(previous, current, "stats updated since last visit");
            Some(Notification::info(pluralize_updates(current - previous)))
        }
        _ => None,
    };

    store.set(UPDATE_COUNTER_KEY, &current.to_string())?;
    Ok(notification)
}

/// Once-a-second countdown redraw, aligned to wall-clock second boundaries.
pub struct CountdownLoop<C, D> {
    schedule: UpdateSchedule,
    clock: C,
    display: D,
    last_phase: Option<Phase>,
}

impl<C: Clock, D: CountdownDisplay> CountdownLoop<C, D> {
    pub fn new(schedule: UpdateSchedule, clock: C, display: D) -> Self {
        Self {
            schedule,
            clock,
            display,
            last_phase: None,
        }
    }

    /// Draws one frame and returns the delay until the next one.
    pub fn tick(&mut self) -> Duration {
        let now = self.clock.now();
        let remaining = self.schedule.remaining(now);
        let opened = remaining.phase == Phase::WithinWindow
            && match self.last_phase {
                Some(previous) => previous == Phase::BeforeWindowOpen,
                None => self.schedule.is_window_opening(now),
            };
        self.last_phase = Some(remaining.phase);

        if opened {
            // the opening frame counts the closed period down to zero
            self.display.show(&format_remaining(0));
            self.display
                .zero_reached(&Notification::success("Update window is now open"));
        } else {
            self.display.show(&remaining.display());
            if remaining.is_zero() {
                self.display
                    .zero_reached(&Notification::success("Stats are updating now"));
            }
        }
        next_tick_delay(now)
    }

    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            let delay = self.tick();
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

/// Starts the countdown on its own task; nothing is scheduled when disabled.
pub fn spawn_countdown<C, D, F>(
    enabled: bool,
    schedule: UpdateSchedule,
    clock: C,
    display: D,
    shutdown: F,
) -> Option<JoinHandle<()>>
where
    C: Clock + 'static,
    D: CountdownDisplay + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    if !enabled {
        tracing::debug!("update countdown disabled");
        return None;
    }
    let countdown = CountdownLoop::new(schedule, clock, display);
    Some(tokio::spawn(countdown.run(shutdown)))
}
