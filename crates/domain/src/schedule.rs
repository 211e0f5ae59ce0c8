//! Schedule: a time-triggered one-shot or recurring device action.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::device::{Device, DeviceState};
use crate::error::{SmartHomeError, ValidationError};
use crate::id::{DeviceId, ScheduleId};
use crate::time::Timestamp;

/// How often a schedule repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Recurrence {
    Once,
    Daily,
    Weekly,
}

impl Recurrence {
    /// Time between two firings, or `None` for one-shot schedules.
    #[must_use]
    pub fn period(self) -> Option<Duration> {
        match self {
            Self::Once => None,
            Self::Daily => Some(Duration::hours(24)),
            Self::Weekly => Some(Duration::hours(7 * 24)),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Once => f.write_str("once"),
            Self::Daily => f.write_str("daily"),
            Self::Weekly => f.write_str("weekly"),
        }
    }
}

impl FromStr for Recurrence {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "once" => Ok(Self::Once),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            _ => Err(ValidationError::UnknownToken {
                kind: "recurrence",
                token: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Recurrence {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The effect run when a schedule fires.
pub type ScheduleAction = Arc<dyn Fn() -> Result<(), SmartHomeError> + Send + Sync>;

/// A pending device action with its next fire time.
#[derive(Clone)]
pub struct Schedule {
    pub device_id: DeviceId,
    pub recurrence: Recurrence,
    pub fire_at: Timestamp,
    action: ScheduleAction,
}

impl Schedule {
    /// Build a schedule running an arbitrary action.
    pub fn new(
        device_id: DeviceId,
        recurrence: Recurrence,
        fire_at: Timestamp,
        action: impl Fn() -> Result<(), SmartHomeError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            device_id,
            recurrence,
            fire_at,
            action: Arc::new(action),
        }
    }

    /// Build a schedule that puts `device` into `target` when it fires.
    ///
    /// The device is captured now and never looked up again.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::StateNotSupported`] when the device's kind
    /// cannot hold `target`.
    pub fn device_action(
        device: Arc<Device>,
        target: DeviceState,
        recurrence: Recurrence,
        fire_at: Timestamp,
    ) -> Result<Self, SmartHomeError> {
        let target = device.kind().check(target)?;
        let device_id = device.id();
        Ok(Self::new(device_id, recurrence, fire_at, move || {
            device.set_state(target).map_err(SmartHomeError::from)
        }))
    }

    /// Shared handle to the action.
    #[must_use]
    pub fn action(&self) -> ScheduleAction {
        Arc::clone(&self.action)
    }

    /// Whether the schedule is due at `now` (fire time reached or passed).
    #[must_use]
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.fire_at <= now
    }

    /// Move a recurring schedule to its next fire time.
    ///
    /// Returns `false` for one-shot schedules, which must be discarded instead.
    pub fn advance(&mut self) -> bool {
        match self.recurrence.period() {
            Some(period) => {
                self.fire_at += period;
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schedule")
            .field("device_id", &self.device_id)
            .field("recurrence", &self.recurrence)
            .field("fire_at", &self.fire_at)
            .finish_non_exhaustive()
    }
}

/// Read-only view of a pending schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleInfo {
    pub id: ScheduleId,
    pub device_id: DeviceId,
    pub recurrence: Recurrence,
    pub fire_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceKind;
    use crate::time::now;

    fn light() -> Arc<Device> {
        Arc::new(
            Device::builder()
                .id(DeviceId::new(1))
                .name("Porch")
                .kind(DeviceKind::Light)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn should_parse_recurrence_tokens_case_insensitively() {
        assert_eq!("once".parse::<Recurrence>().unwrap(), Recurrence::Once);
        assert_eq!("Daily".parse::<Recurrence>().unwrap(), Recurrence::Daily);
        assert_eq!("WEEKLY".parse::<Recurrence>().unwrap(), Recurrence::Weekly);
        assert!("hourly".parse::<Recurrence>().is_err());
    }

    #[test]
    fn should_deserialize_recurrence_in_any_case() {
        let parsed: Vec<Recurrence> =
            serde_json::from_str(r#"["DAILY", "Weekly", "once"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![Recurrence::Daily, Recurrence::Weekly, Recurrence::Once]
        );
        assert_eq!(serde_json::to_string(&Recurrence::Daily).unwrap(), "\"daily\"");
    }

    #[test]
    fn should_have_no_period_for_once() {
        assert_eq!(Recurrence::Once.period(), None);
        assert_eq!(Recurrence::Daily.period(), Some(Duration::hours(24)));
        assert_eq!(Recurrence::Weekly.period(), Some(Duration::days(7)));
    }

    #[test]
    fn should_run_bound_device_action() {
        let device = light();
        let schedule =
            Schedule::device_action(Arc::clone(&device), DeviceState::On, Recurrence::Once, now())
                .unwrap();
        (schedule.action())().unwrap();
        assert_eq!(device.state(), DeviceState::On);
        assert_eq!(schedule.device_id, DeviceId::new(1));
    }

    #[test]
    fn should_reject_action_target_not_supported_by_device() {
        let result =
            Schedule::device_action(light(), DeviceState::Active, Recurrence::Daily, now());
        assert!(matches!(
            result,
            Err(SmartHomeError::Validation(
                ValidationError::StateNotSupported { .. }
            ))
        ));
    }

    #[test]
    fn should_advance_recurring_schedule_by_its_period() {
        let at = now();
        let mut daily = Schedule::new(DeviceId::new(1), Recurrence::Daily, at, || Ok(()));
        assert!(daily.advance());
        assert_eq!(daily.fire_at, at + Duration::hours(24));

        let mut weekly = Schedule::new(DeviceId::new(1), Recurrence::Weekly, at, || Ok(()));
        assert!(weekly.advance());
        assert_eq!(weekly.fire_at, at + Duration::days(7));
    }

    #[test]
    fn should_not_advance_one_shot_schedule() {
        let at = now();
        let mut once = Schedule::new(DeviceId::new(1), Recurrence::Once, at, || Ok(()));
        assert!(!once.advance());
        assert_eq!(once.fire_at, at);
    }

    #[test]
    fn should_be_due_at_or_after_fire_time() {
        let at = now();
        let s = Schedule::new(DeviceId::new(1), Recurrence::Once, at, || Ok(()));
        assert!(s.is_due(at));
        assert!(s.is_due(at + Duration::seconds(1)));
        assert!(!s.is_due(at - Duration::seconds(1)));
    }
}
