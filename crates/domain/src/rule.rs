//! Rule: a standing mapping from simulated room conditions to a device's
//! target state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;

/// Temperature assumed for a room that has never been given a reading.
pub const DEFAULT_TEMPERATURE: f32 = 25.0;

/// Simulated readings for one room.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub temperature: f32,
    pub motion_detected: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            motion_detected: false,
        }
    }
}

/// What a rule reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    /// Engaged while the room reports motion.
    Motion,
    /// Engaged while the temperature is strictly above (or strictly below)
    /// the threshold.
    Temperature { threshold: f32, turn_on_above: bool },
}

/// A rule targeting one device by id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub device_id: DeviceId,
    #[serde(flatten)]
    pub kind: RuleKind,
}

impl Rule {
    #[must_use]
    pub fn motion(device_id: DeviceId) -> Self {
        Self {
            device_id,
            kind: RuleKind::Motion,
        }
    }

    #[must_use]
    pub fn temperature(device_id: DeviceId, threshold: f32, turn_on_above: bool) -> Self {
        Self {
            device_id,
            kind: RuleKind::Temperature {
                threshold,
                turn_on_above,
            },
        }
    }

    /// Whether the target device should be engaged (on / active) under
    /// `env`. A temperature equal to the threshold is never engaged.
    #[must_use]
    pub fn is_engaged(&self, env: &Environment) -> bool {
        match self.kind {
            RuleKind::Motion => env.motion_detected,
            RuleKind::Temperature {
                threshold,
                turn_on_above: true,
            } => env.temperature > threshold,
            RuleKind::Temperature {
                threshold,
                turn_on_above: false,
            } => env.temperature < threshold,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RuleKind::Motion => write!(f, "motion(device {})", self.device_id),
            RuleKind::Temperature {
                threshold,
                turn_on_above,
            } => {
                let op = if turn_on_above { '>' } else { '<' };
                write!(f, "temperature(device {}, on {op} {threshold})", self.device_id)
            }
        }
    }
}
