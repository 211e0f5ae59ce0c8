//! Device kind and state: the closed set of appliance types and the states
//! each of them may hold.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The type of appliance. Lights, fans and AC units are actuators; sensors
/// are driven by simulated readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum DeviceKind {
    Light,
    Fan,
    Ac,
    Sensor,
}

impl DeviceKind {
    /// Whether this kind holds `Active`/`Inactive` rather than `On`/`Off`.
    #[must_use]
    pub fn is_sensor(self) -> bool {
        matches!(self, Self::Sensor)
    }

    /// Whether a device of this kind may hold `state`.
    #[must_use]
    pub fn supports(self, state: DeviceState) -> bool {
        match state {
            DeviceState::On | DeviceState::Off => !self.is_sensor(),
            DeviceState::Active | DeviceState::Inactive => self.is_sensor(),
        }
    }

    /// State of a freshly created device.
    #[must_use]
    pub fn default_state(self) -> DeviceState {
        self.engaged_state(false)
    }

    /// Map an engaged/disengaged decision onto this kind's states.
    #[must_use]
    pub fn engaged_state(self, engaged: bool) -> DeviceState {
        match (self.is_sensor(), engaged) {
            (false, true) => DeviceState::On,
            (false, false) => DeviceState::Off,
            (true, true) => DeviceState::Active,
            (true, false) => DeviceState::Inactive,
        }
    }

    /// Check that `state` is valid for this kind.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::StateNotSupported`] otherwise.
    pub fn check(self, state: DeviceState) -> Result<DeviceState, ValidationError> {
        if self.supports(state) {
            Ok(state)
        } else {
            Err(ValidationError::StateNotSupported {
                kind: self.to_string(),
                state: state.to_string(),
            })
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("LIGHT"),
            Self::Fan => f.write_str("FAN"),
            Self::Ac => f.write_str("AC"),
            Self::Sensor => f.write_str("SENSOR"),
        }
    }
}

impl FromStr for DeviceKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "fan" => Ok(Self::Fan),
            "ac" => Ok(Self::Ac),
            "sensor" => Ok(Self::Sensor),
            _ => Err(ValidationError::UnknownToken {
                kind: "device kind",
                token: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for DeviceKind {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Operational state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum DeviceState {
    Off,
    On,
    Active,
    Inactive,
}

impl DeviceState {
    /// The opposite state within the same pair (`On`↔`Off`, `Active`↔`Inactive`).
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }

    /// Upper-case text shown to users.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(ValidationError::UnknownToken {
                kind: "device state",
                token: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for DeviceState {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTUATORS: [DeviceKind; 3] = [DeviceKind::Light, DeviceKind::Fan, DeviceKind::Ac];

    #[test]
    fn should_restrict_actuators_to_on_off() {
        for kind in ACTUATORS {
            assert!(kind.supports(DeviceState::On));
            assert!(kind.supports(DeviceState::Off));
            assert!(!kind.supports(DeviceState::Active));
            assert!(!kind.supports(DeviceState::Inactive));
        }
    }

    #[test]
    fn should_restrict_sensor_to_active_inactive() {
        assert!(DeviceKind::Sensor.supports(DeviceState::Active));
        assert!(DeviceKind::Sensor.supports(DeviceState::Inactive));
        assert!(!DeviceKind::Sensor.supports(DeviceState::On));
        assert!(!DeviceKind::Sensor.supports(DeviceState::Off));
    }

    #[test]
    fn should_default_to_disengaged_state() {
        assert_eq!(DeviceKind::Light.default_state(), DeviceState::Off);
        assert_eq!(DeviceKind::Sensor.default_state(), DeviceState::Inactive);
    }

    #[test]
    fn should_map_engaged_to_kind_specific_state() {
        assert_eq!(DeviceKind::Fan.engaged_state(true), DeviceState::On);
        assert_eq!(DeviceKind::Sensor.engaged_state(true), DeviceState::Active);
    }

    #[test]
    fn should_reject_unsupported_state_in_check() {
        let err = DeviceKind::Sensor.check(DeviceState::On).unwrap_err();
        assert!(matches!(err, ValidationError::StateNotSupported { .. }));
        assert_eq!(DeviceKind::Ac.check(DeviceState::On), Ok(DeviceState::On));
    }

    #[test]
    fn should_parse_tokens_case_insensitively() {
        assert_eq!("ON".parse::<DeviceState>().unwrap(), DeviceState::On);
        assert_eq!("off".parse::<DeviceState>().unwrap(), DeviceState::Off);
        assert_eq!("Active".parse::<DeviceState>().unwrap(), DeviceState::Active);
        assert_eq!("INACTIVE".parse::<DeviceState>().unwrap(), DeviceState::Inactive);
        assert_eq!("ac".parse::<DeviceKind>().unwrap(), DeviceKind::Ac);
        assert_eq!("Sensor".parse::<DeviceKind>().unwrap(), DeviceKind::Sensor);
    }

    #[test]
    fn should_reject_unknown_tokens() {
        assert!(matches!(
            "dim".parse::<DeviceState>(),
            Err(ValidationError::UnknownToken { kind: "device state", .. })
        ));
        assert!("heater".parse::<DeviceKind>().is_err());
    }

    #[test]
    fn should_display_upper_case_text() {
        assert_eq!(DeviceState::Inactive.to_string(), "INACTIVE");
        assert_eq!(DeviceKind::Ac.to_string(), "AC");
    }

    #[test]
    fn should_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&DeviceState::On).unwrap(), "\"on\"");
        assert_eq!(serde_json::to_string(&DeviceKind::Ac).unwrap(), "\"ac\"");
    }

    #[test]
    fn should_deserialize_tokens_in_any_case() {
        let kinds: Vec<DeviceKind> =
            serde_json::from_str(r#"["LIGHT", "Sensor", "ac", "Fan"]"#).unwrap();
        assert_eq!(
            kinds,
            vec![DeviceKind::Light, DeviceKind::Sensor, DeviceKind::Ac, DeviceKind::Fan]
        );
        let states: Vec<DeviceState> = serde_json::from_str(r#"["ON", "inactive"]"#).unwrap();
        assert_eq!(states, vec![DeviceState::On, DeviceState::Inactive]);
        assert!(serde_json::from_str::<DeviceKind>(r#""toaster""#).is_err());
    }
}
