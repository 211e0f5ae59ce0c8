//! Scheduler: time-triggered device actions plus the background poll loop.
//!
//! A single mutex guards the schedule list. [`Scheduler::check_and_run_at`]
//! decides under that lock which schedules are due, advances recurring ones
//! and drops one-shots, then releases it before running any action. Actions
//! therefore never run while the list is locked, and callers may add or
//! remove schedules from inside an action without deadlocking.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Local;
use smarthome_domain::device::{Device, DeviceState};
use smarthome_domain::error::{SmartHomeError, ValidationError};
use smarthome_domain::id::{DeviceId, ScheduleId};
use smarthome_domain::schedule::{Recurrence, Schedule, ScheduleAction, ScheduleInfo};
use smarthome_domain::time::{self, Timestamp};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default pause between two background checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

struct Entry {
    id: ScheduleId,
    schedule: Schedule,
}

/// Pending schedules, in insertion order.
pub struct Scheduler {
    entries: Mutex<Vec<Entry>>,
    next_id: AtomicI64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schedule and return its handle.
    pub fn add_schedule(&self, schedule: Schedule) -> ScheduleId {
        let id = ScheduleId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::info!(
            schedule_id = %id,
            device_id = %schedule.device_id,
            recurrence = %schedule.recurrence,
            fire_at = %schedule.fire_at,
            "schedule added"
        );
        self.lock_entries().push(Entry { id, schedule });
        id
    }

    /// Register a schedule putting `device` into `target` at the next
    /// occurrence of `at` (`HH:MM`, local wall clock).
    ///
    /// A time equal to or earlier than the current minute lands on tomorrow.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTime`] when `at` does not parse, or
    /// [`ValidationError::StateNotSupported`] when the device's kind cannot
    /// hold `target`.
    pub fn schedule_at(
        &self,
        device: Arc<Device>,
        target: DeviceState,
        at: &str,
        recurrence: Recurrence,
    ) -> Result<ScheduleId, SmartHomeError> {
        let time_of_day = time::parse_time_of_day(at)?;
        let fire_at = time::next_occurrence(time_of_day, &Local::now())
            .ok_or_else(|| ValidationError::InvalidTime(at.to_string()))?;
        let schedule = Schedule::device_action(device, target, recurrence, fire_at)?;
        Ok(self.add_schedule(schedule))
    }

    /// Drop a pending schedule. Returns `false` when `id` is unknown.
    pub fn remove_schedule(&self, id: ScheduleId) -> bool {
        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;
        if removed {
            tracing::info!(schedule_id = %id, "schedule removed");
        }
        removed
    }

    /// Snapshot of all pending schedules, in insertion order.
    #[must_use]
    pub fn list(&self) -> Vec<ScheduleInfo> {
        self.lock_entries()
            .iter()
            .map(|entry| ScheduleInfo {
                id: entry.id,
                device_id: entry.schedule.device_id,
                recurrence: entry.schedule.recurrence,
                fire_at: entry.schedule.fire_at,
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    /// Run every schedule due at the current time.
    pub fn check_and_run(&self) -> usize {
        self.check_and_run_at(time::now())
    }

    /// Run every schedule whose fire time is at or before `now`.
    ///
    /// Each due schedule fires at most once per call, even if several periods
    /// were missed. A failing action is logged and does not stop the others.
    /// Returns how many actions ran.
    pub fn check_and_run_at(&self, now: Timestamp) -> usize {
        let due = self.take_due(now);
        for (id, device_id, action) in &due {
            match action() {
                Ok(()) => {
                    tracing::info!(schedule_id = %id, device_id = %device_id, "schedule fired");
                }
                Err(err) => tracing::warn!(
                    schedule_id = %id,
                    device_id = %device_id,
                    error = %err,
                    "schedule action failed"
                ),
            }
        }
        due.len()
    }

    fn take_due(&self, now: Timestamp) -> Vec<(ScheduleId, DeviceId, ScheduleAction)> {
        let mut entries = self.lock_entries();
        let mut due = Vec::new();
        entries.retain_mut(|entry| {
            if !entry.schedule.is_due(now) {
                return true;
            }
            due.push((entry.id, entry.schedule.device_id, entry.schedule.action()));
            entry.schedule.advance()
        });
        due
    }

    /// Check for due schedules every `interval` until `cancel` fires.
    ///
    /// The first check happens immediately. Cancellation interrupts the
    /// sleep, so shutdown never waits a full interval.
    pub async fn run_loop(&self, interval: Duration, cancel: CancellationToken) {
        tracing::info!(interval_secs = interval.as_secs(), "scheduler started");
        while !cancel.is_cancelled() {
            let fired = self.check_and_run();
            if fired > 0 {
                tracing::debug!(fired, "scheduler pass finished");
            }
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
            }
        }
        tracing::info!("scheduler stopped");
    }

    /// Spawn [`Scheduler::run_loop`] on the current tokio runtime.
    #[must_use]
    pub fn spawn(self: &Arc<Self>, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.run_loop(interval, cancel).await })
    }

    fn lock_entries(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
