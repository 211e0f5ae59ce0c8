//! Device: the state machine for one appliance or sensor.
//!
//! A device's identity (id, name, kind) is fixed at construction; only its
//! [`DeviceState`] changes afterwards. The state lives in its own mutex, so a
//! device can be shared behind an `Arc` between the foreground command loop
//! and the scheduler task, and every transition (including the
//! read-modify-write of [`Device::toggle`]) is atomic.

mod state;

pub use state::{DeviceKind, DeviceState};

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{SmartHomeError, ValidationError};
use crate::id::DeviceId;

/// A plain, owned copy of a device: what the store loads and saves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: DeviceId,
    pub name: String,
    pub kind: DeviceKind,
    pub state: DeviceState,
}

/// A simulated appliance or sensor.
#[derive(Debug)]
pub struct Device {
    id: DeviceId,
    name: String,
    kind: DeviceKind,
    state: Mutex<DeviceState>,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Rebuild a device from a stored record.
    ///
    /// A state the kind cannot hold is replaced by the kind's default, since
    /// the invariant must hold from construction on.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::Validation`] when the name is empty.
    pub fn from_record(record: DeviceRecord) -> Result<Self, SmartHomeError> {
        let state = if record.kind.supports(record.state) {
            record.state
        } else {
            record.kind.default_state()
        };
        Self::builder()
            .id(record.id)
            .name(record.name)
            .kind(record.kind)
            .state(state)
            .build()
    }

    #[must_use]
    pub fn id(&self) -> DeviceId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        *self.lock_state()
    }

    /// Current state as upper-case text (`ON`, `OFF`, `ACTIVE`, `INACTIVE`).
    #[must_use]
    pub fn state_text(&self) -> &'static str {
        self.state().as_str()
    }

    /// Owned snapshot of this device.
    #[must_use]
    pub fn record(&self) -> DeviceRecord {
        DeviceRecord {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            state: self.state(),
        }
    }

    /// Switch an actuator on.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::StateNotSupported`] for sensors.
    pub fn turn_on(&self) -> Result<(), ValidationError> {
        self.set_state(DeviceState::On)
    }

    /// Switch an actuator off.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::StateNotSupported`] for sensors.
    pub fn turn_off(&self) -> Result<(), ValidationError> {
        self.set_state(DeviceState::Off)
    }

    /// Mark a sensor active.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::StateNotSupported`] for actuators.
    pub fn activate(&self) -> Result<(), ValidationError> {
        self.set_state(DeviceState::Active)
    }

    /// Mark a sensor inactive.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::StateNotSupported`] for actuators.
    pub fn deactivate(&self) -> Result<(), ValidationError> {
        self.set_state(DeviceState::Inactive)
    }

    /// Override the state regardless of the current one.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::StateNotSupported`] when this device's kind
    /// cannot hold `state`; the device is left untouched.
    pub fn set_state(&self, state: DeviceState) -> Result<(), ValidationError> {
        let state = self.kind.check(state)?;
        *self.lock_state() = state;
        Ok(())
    }

    /// Flip to the other state of the kind's pair and return the new state.
    pub fn toggle(&self) -> DeviceState {
        let mut state = self.lock_state();
        *state = state.flipped();
        *state
    }

    fn lock_state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    kind: Option<DeviceKind>,
    state: Option<DeviceState>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: DeviceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn state(mut self, state: DeviceState) -> Self {
        self.state = Some(state);
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// The kind defaults to [`DeviceKind::Light`] and the state to the
    /// kind's default.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::Validation`] if the name is missing or empty,
    /// or if the state is not valid for the kind.
    pub fn build(self) -> Result<Device, SmartHomeError> {
        let name = self.name.unwrap_or_default();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let kind = self.kind.unwrap_or(DeviceKind::Light);
        let state = match self.state {
            Some(state) => kind.check(state)?,
            None => kind.default_state(),
        };
        Ok(Device {
            id: self.id.unwrap_or(DeviceId::new(0)),
            name,
            kind,
            state: Mutex::new(state),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(kind: DeviceKind) -> Device {
        Device::builder()
            .id(DeviceId::new(1))
            .name("Test device")
            .kind(kind)
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_actuator_in_off_state() {
        let light = device(DeviceKind::Light);
        assert_eq!(light.state(), DeviceState::Off);
        assert_eq!(light.state_text(), "OFF");
    }

    #[test]
    fn should_build_sensor_in_inactive_state() {
        let sensor = device(DeviceKind::Sensor);
        assert_eq!(sensor.state(), DeviceState::Inactive);
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = Device::builder().kind(DeviceKind::Fan).build();
        assert!(matches!(
            result,
            Err(SmartHomeError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_reject_building_sensor_with_actuator_state() {
        let result = Device::builder()
            .name("Motion")
            .kind(DeviceKind::Sensor)
            .state(DeviceState::On)
            .build();
        assert!(matches!(
            result,
            Err(SmartHomeError::Validation(
                ValidationError::StateNotSupported { .. }
            ))
        ));
    }

    #[test]
    fn should_turn_actuator_on_and_off() {
        let fan = device(DeviceKind::Fan);
        fan.turn_on().unwrap();
        assert_eq!(fan.state(), DeviceState::On);
        fan.turn_off().unwrap();
        assert_eq!(fan.state(), DeviceState::Off);
    }

    #[test]
    fn should_activate_and_deactivate_sensor() {
        let sensor = device(DeviceKind::Sensor);
        sensor.activate().unwrap();
        assert_eq!(sensor.state_text(), "ACTIVE");
        sensor.deactivate().unwrap();
        assert_eq!(sensor.state_text(), "INACTIVE");
    }

    #[test]
    fn should_leave_state_untouched_when_transition_is_not_supported() {
        let sensor = device(DeviceKind::Sensor);
        assert!(sensor.turn_on().is_err());
        assert_eq!(sensor.state(), DeviceState::Inactive);

        let ac = device(DeviceKind::Ac);
        ac.turn_on().unwrap();
        assert!(ac.activate().is_err());
        assert_eq!(ac.state(), DeviceState::On);
    }

    #[test]
    fn should_return_to_original_state_after_two_toggles_for_actuators() {
        for kind in [DeviceKind::Light, DeviceKind::Fan, DeviceKind::Ac] {
            for initial in [DeviceState::On, DeviceState::Off] {
                let d = device(kind);
                d.set_state(initial).unwrap();
                d.toggle();
                d.toggle();
                assert_eq!(d.state(), initial, "{kind} starting {initial}");
            }
        }
    }

    #[test]
    fn should_only_visit_active_and_inactive_when_toggling_sensor() {
        let sensor = device(DeviceKind::Sensor);
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(sensor.toggle());
        }
        assert_eq!(
            seen,
            vec![
                DeviceState::Active,
                DeviceState::Inactive,
                DeviceState::Active,
                DeviceState::Inactive,
            ]
        );
    }

    #[test]
    fn should_normalize_invalid_stored_state_on_load() {
        let record = DeviceRecord {
            id: DeviceId::new(9),
            name: "Hall sensor".to_string(),
            kind: DeviceKind::Sensor,
            state: DeviceState::Off,
        };
        let d = Device::from_record(record).unwrap();
        assert_eq!(d.state(), DeviceState::Inactive);
    }

    #[test]
    fn should_roundtrip_through_record() {
        let d = device(DeviceKind::Ac);
        d.turn_on().unwrap();
        let restored = Device::from_record(d.record()).unwrap();
        assert_eq!(restored.record(), d.record());
    }

    #[test]
    fn should_not_lose_toggles_across_threads() {
        let light = std::sync::Arc::new(device(DeviceKind::Light));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let light = std::sync::Arc::clone(&light);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        light.toggle();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        // 800 flips is even, so the light ends where it started.
        assert_eq!(light.state(), DeviceState::Off);
    }
}
