//! Scene: a named, immutable capture of device states for one room or the
//! whole house.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::device::DeviceState;
use crate::error::{SmartHomeError, ValidationError};
use crate::id::DeviceId;

/// Token selecting whole-house scope at the boundary.
pub const HOUSE_TOKEN: &str = "HOUSE";

/// Where a scene applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "room", rename_all = "lowercase")]
pub enum SceneScope {
    /// A single room, by name.
    Room(String),
    /// Every room in the house.
    House,
}

impl fmt::Display for SceneScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Room(name) => write!(f, "room({name})"),
            Self::House => f.write_str("house"),
        }
    }
}

impl FromStr for SceneScope {
    type Err = std::convert::Infallible;

    /// `HOUSE` (any case) selects the whole house; anything else names a room.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(HOUSE_TOKEN) {
            Ok(Self::House)
        } else {
            Ok(Self::Room(s.to_string()))
        }
    }
}

/// One recorded `(device id, state)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneEntry {
    pub device_id: DeviceId,
    pub state: DeviceState,
}

impl SceneEntry {
    #[must_use]
    pub fn new(device_id: DeviceId, state: DeviceState) -> Self {
        Self { device_id, state }
    }
}

/// A named snapshot of desired device states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    name: String,
    scope: SceneScope,
    entries: Vec<SceneEntry>,
}

impl Scene {
    /// Create a scene.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::Validation`] when `name` is empty.
    pub fn new(
        name: impl Into<String>,
        scope: SceneScope,
        entries: Vec<SceneEntry>,
    ) -> Result<Self, SmartHomeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(Self {
            name,
            scope,
            entries,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn scope(&self) -> &SceneScope {
        &self.scope
    }

    #[must_use]
    pub fn entries(&self) -> &[SceneEntry] {
        &self.entries
    }
}

/// Read-only listing row: name plus scope/target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneSummary {
    pub name: String,
    pub scope: SceneScope,
    pub device_count: usize,
}

impl From<&Scene> for SceneSummary {
    fn from(scene: &Scene) -> Self {
        Self {
            name: scene.name.clone(),
            scope: scene.scope.clone(),
            device_count: scene.entries.len(),
        }
    }
}
