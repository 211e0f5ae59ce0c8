//! Rule engine: derives device states from simulated room readings.
//!
//! Rules are authoritative on every application: [`RuleEngine::apply_rules`]
//! overwrites whatever state a device was left in manually. Rules are
//! evaluated in insertion order, so when several target the same device the
//! last one wins.

use std::collections::HashMap;

use smarthome_domain::device::DeviceState;
use smarthome_domain::room::Room;
use smarthome_domain::rule::{Environment, Rule};

use crate::house::House;

/// Declared rules plus the simulated per-room environment.
#[derive(Debug, Default)]
pub struct RuleEngine {
    rules: Vec<Rule>,
    environments: HashMap<String, Environment>,
}

impl RuleEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. Duplicates are allowed.
    pub fn add_rule(&mut self, rule: Rule) {
        tracing::debug!(%rule, "rule added");
        self.rules.push(rule);
    }

    /// Declared rules, in insertion order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn set_room_temperature(&mut self, room: &str, temperature: f32) {
        self.environment_mut(room).temperature = temperature;
    }

    pub fn set_room_motion(&mut self, room: &str, motion_detected: bool) {
        self.environment_mut(room).motion_detected = motion_detected;
    }

    /// Set the same temperature in every room of `house`.
    pub fn set_global_temperature(&mut self, house: &House, temperature: f32) {
        for room in house.rooms() {
            self.set_room_temperature(room.name(), temperature);
        }
    }

    /// Set the same motion flag in every room of `house`.
    pub fn set_global_motion(&mut self, house: &House, motion_detected: bool) {
        for room in house.rooms() {
            self.set_room_motion(room.name(), motion_detected);
        }
    }

    /// Simulated temperature, 25.0 when never set.
    #[must_use]
    pub fn room_temperature(&self, room: &str) -> f32 {
        self.environment(room).temperature
    }

    /// Simulated motion flag, `false` when never set.
    #[must_use]
    pub fn room_motion(&self, room: &str) -> bool {
        self.environment(room).motion_detected
    }

    /// Readings for `room`, defaulted when never set.
    #[must_use]
    pub fn environment(&self, room: &str) -> Environment {
        self.environments.get(room).copied().unwrap_or_default()
    }

    /// Target state `rule` prescribes for its device in `room`, or `None`
    /// when the device is not in that room.
    #[must_use]
    pub fn evaluate(&self, rule: &Rule, room: &Room) -> Option<DeviceState> {
        let device = room.device(rule.device_id)?;
        let engaged = rule.is_engaged(&self.environment(room.name()));
        Some(device.kind().engaged_state(engaged))
    }

    /// Apply every rule whose device lives in `room`. Returns how many
    /// device states were set.
    pub fn apply_rules(&self, room: &Room) -> usize {
        let env = self.environment(room.name());
        let mut applied = 0;
        for rule in &self.rules {
            let Some(device) = room.device(rule.device_id) else {
                continue;
            };
            let target = device.kind().engaged_state(rule.is_engaged(&env));
            // engaged_state always yields a state the kind supports
            if device.set_state(target).is_ok() {
                applied += 1;
            }
        }
        tracing::debug!(room = room.name(), applied, "rules applied");
        applied
    }

    /// Apply the rules to every room of `house`, in order.
    pub fn apply_rules_to_house(&self, house: &House) -> usize {
        house.rooms().iter().map(|room| self.apply_rules(room)).sum()
    }

    fn environment_mut(&mut self, room: &str) -> &mut Environment {
        self.environments.entry(room.to_string()).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smarthome_domain::device::{Device, DeviceKind};
    use smarthome_domain::id::{DeviceId, RoomId};

    fn device(id: i64, kind: DeviceKind) -> Device {
        Device::builder()
            .id(DeviceId::new(id))
            .name(format!("device-{id}"))
            .kind(kind)
            .build()
            .unwrap()
    }

    fn living_room() -> Room {
        let room = Room::new(RoomId::new(1), "Living").unwrap();
        room.add_device(device(1, DeviceKind::Light)).unwrap();
        room.add_device(device(2, DeviceKind::Ac)).unwrap();
        room.add_device(device(3, DeviceKind::Sensor)).unwrap();
        room
    }

    fn state(room: &Room, id: i64) -> DeviceState {
        room.device(DeviceId::new(id)).unwrap().state()
    }

    #[test]
    fn should_default_readings_when_never_set() {
        let engine = RuleEngine::new();
        assert!((engine.room_temperature("Nowhere") - 25.0).abs() < f32::EPSILON);
        assert!(!engine.room_motion("Nowhere"));
    }

    #[test]
    fn should_store_readings_per_room() {
        let mut engine = RuleEngine::new();
        engine.set_room_temperature("Living", 18.5);
        engine.set_room_motion("Hall", true);

        assert!((engine.room_temperature("Living") - 18.5).abs() < f32::EPSILON);
        assert!(!engine.room_motion("Living"));
        assert!(engine.room_motion("Hall"));
        assert!((engine.room_temperature("Hall") - 25.0).abs() < f32::EPSILON);
    }

    #[test]
    fn should_evaluate_temperature_rule_with_strict_threshold() {
        let room = living_room();
        let rule = Rule::temperature(DeviceId::new(2), 20.0, true);
        let mut engine = RuleEngine::new();

        for (temperature, expected) in [
            (21.0, DeviceState::On),
            (20.0, DeviceState::Off),
            (19.0, DeviceState::Off),
        ] {
            engine.set_room_temperature("Living", temperature);
            assert_eq!(engine.evaluate(&rule, &room), Some(expected), "{temperature}");
        }
    }

    #[test]
    fn should_evaluate_below_threshold_rule() {
        let room = living_room();
        let rule = Rule::temperature(DeviceId::new(2), 20.0, false);
        let mut engine = RuleEngine::new();

        engine.set_room_temperature("Living", 19.0);
        assert_eq!(engine.evaluate(&rule, &room), Some(DeviceState::On));
        engine.set_room_temperature("Living", 20.0);
        assert_eq!(engine.evaluate(&rule, &room), Some(DeviceState::Off));
    }

    #[test]
    fn should_return_none_when_device_not_in_room() {
        let room = living_room();
        let engine = RuleEngine::new();
        assert_eq!(engine.evaluate(&Rule::motion(DeviceId::new(99)), &room), None);
    }

    #[test]
    fn should_override_manual_state_with_motion_rule() {
        let room = living_room();
        let mut engine = RuleEngine::new();
        engine.add_rule(Rule::motion(DeviceId::new(1)));

        room.device(DeviceId::new(1)).unwrap().turn_on().unwrap();
        engine.set_room_motion("Living", false);
        engine.apply_rules(&room);
        assert_eq!(state(&room, 1), DeviceState::Off);

        engine.set_room_motion("Living", true);
        engine.apply_rules(&room);
        assert_eq!(state(&room, 1), DeviceState::On);
    }

    #[test]
    fn should_drive_sensor_between_active_and_inactive() {
        let room = living_room();
        let mut engine = RuleEngine::new();
        engine.add_rule(Rule::motion(DeviceId::new(3)));

        engine.set_room_motion("Living", true);
        engine.apply_rules(&room);
        assert_eq!(state(&room, 3), DeviceState::Active);

        engine.set_room_motion("Living", false);
        engine.apply_rules(&room);
        assert_eq!(state(&room, 3), DeviceState::Inactive);
    }

    #[test]
    fn should_let_last_rule_win_on_conflict() {
        let room = living_room();
        let mut engine = RuleEngine::new();
        engine.set_room_temperature("Living", 30.0);
        engine.add_rule(Rule::temperature(DeviceId::new(2), 20.0, true));
        engine.add_rule(Rule::temperature(DeviceId::new(2), 20.0, false));

        let applied = engine.apply_rules(&room);
        assert_eq!(applied, 2);
        assert_eq!(state(&room, 2), DeviceState::Off);
    }

    #[test]
    fn should_skip_rules_for_devices_in_other_rooms() {
        let room = living_room();
        let mut engine = RuleEngine::new();
        engine.add_rule(Rule::motion(DeviceId::new(42)));
        assert_eq!(engine.apply_rules(&room), 0);
    }

    #[test]
    fn should_apply_global_readings_to_every_room() {
        let house = House::new();
        let living = house.add_room(living_room()).unwrap();
        let hall = house
            .add_room(Room::new(RoomId::new(2), "Hall").unwrap())
            .unwrap();
        hall.add_device(device(1, DeviceKind::Light)).unwrap();

        let mut engine = RuleEngine::new();
        engine.add_rule(Rule::motion(DeviceId::new(1)));
        engine.set_global_motion(&house, true);
        engine.set_global_temperature(&house, 12.0);

        assert_eq!(engine.apply_rules_to_house(&house), 2);
        assert_eq!(state(&living, 1), DeviceState::On);
        assert_eq!(state(&hall, 1), DeviceState::On);
        assert!((engine.room_temperature("Hall") - 12.0).abs() < f32::EPSILON);
    }
}
