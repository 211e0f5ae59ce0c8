//! Scene manager: named captures of device states, applied on demand.
//!
//! Scenes are immutable once stored. Applying one copies its entries out of
//! the scene list first and then drives devices with the list unlocked.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use smarthome_domain::error::{
    EmptyCollectionError, NotFoundError, SmartHomeError, ValidationError,
};
use smarthome_domain::room::Room;
use smarthome_domain::scene::{Scene, SceneEntry, SceneScope, SceneSummary};

use crate::house::House;

/// Stores scenes and applies them to the rooms of a [`House`].
pub struct SceneManager {
    house: Arc<House>,
    scenes: Mutex<Vec<Scene>>,
}

impl SceneManager {
    #[must_use]
    pub fn new(house: Arc<House>) -> Self {
        Self {
            house,
            scenes: Mutex::new(Vec::new()),
        }
    }

    /// Store a room-scoped scene from explicitly captured entries.
    ///
    /// # Errors
    ///
    /// - [`NotFoundError`] when the room does not exist, or an entry names a
    ///   device outside it
    /// - [`EmptyCollectionError`] when the room has no devices
    /// - [`ValidationError`] when the name is empty or taken, or an entry
    ///   carries a state its device cannot hold
    pub fn create_room_scene(
        &self,
        name: &str,
        room_name: &str,
        entries: Vec<SceneEntry>,
    ) -> Result<SceneSummary, SmartHomeError> {
        let room = self.existing_room(room_name)?;
        if room.is_empty() {
            return Err(EmptyCollectionError(room.name().to_string()).into());
        }
        for entry in &entries {
            check_entry(&[&*room], entry)?;
        }
        self.insert(Scene::new(name, SceneScope::Room(room_name.to_string()), entries)?)
    }

    /// Store a house-scoped scene from explicitly captured entries.
    ///
    /// # Errors
    ///
    /// - [`EmptyCollectionError`] when the house holds no devices at all
    /// - [`NotFoundError`] when an entry names a device in no room
    /// - [`ValidationError`] when the name is empty or taken, or an entry
    ///   carries a state no matching device can hold
    pub fn create_house_scene(
        &self,
        name: &str,
        entries: Vec<SceneEntry>,
    ) -> Result<SceneSummary, SmartHomeError> {
        let rooms = self.house.rooms();
        if rooms.iter().all(|room| room.is_empty()) {
            return Err(EmptyCollectionError("house".to_string()).into());
        }
        let rooms: Vec<&Room> = rooms.iter().map(Arc::as_ref).collect();
        for entry in &entries {
            check_entry(&rooms, entry)?;
        }
        self.insert(Scene::new(name, SceneScope::House, entries)?)
    }

    /// Store a room-scoped scene capturing every device's current state.
    ///
    /// # Errors
    ///
    /// Same as [`SceneManager::create_room_scene`].
    pub fn snapshot_room_scene(
        &self,
        name: &str,
        room_name: &str,
    ) -> Result<SceneSummary, SmartHomeError> {
        let room = self.existing_room(room_name)?;
        self.create_room_scene(name, room_name, snapshot(&room))
    }

    /// Store a house-scoped scene capturing every device's current state.
    ///
    /// # Errors
    ///
    /// Same as [`SceneManager::create_house_scene`].
    pub fn snapshot_house_scene(&self, name: &str) -> Result<SceneSummary, SmartHomeError> {
        let entries = self
            .house
            .rooms()
            .iter()
            .flat_map(|room| snapshot(room.as_ref()))
            .collect();
        self.create_house_scene(name, entries)
    }

    /// Name and scope of every stored scene, in creation order.
    #[must_use]
    pub fn list_scenes(&self) -> Vec<SceneSummary> {
        self.lock_scenes().iter().map(SceneSummary::from).collect()
    }

    /// Copy of a stored scene.
    #[must_use]
    pub fn scene(&self, name: &str) -> Option<Scene> {
        self.lock_scenes().iter().find(|s| s.name() == name).cloned()
    }

    /// Drive every recorded device to its recorded state.
    ///
    /// Returns `false` when the scene is unknown or its room no longer
    /// exists. Entries whose device has gone are skipped.
    pub fn apply_scene(&self, name: &str) -> bool {
        let Some(scene) = self.scene(name) else {
            tracing::warn!(scene = name, "scene not found");
            return false;
        };

        let rooms = match scene.scope() {
            SceneScope::House => self.house.rooms(),
            SceneScope::Room(room_name) => match self.house.room(room_name) {
                Some(room) => vec![room],
                None => {
                    tracing::warn!(scene = name, room = %room_name, "scene room not found");
                    return false;
                }
            },
        };

        let mut applied = 0;
        for room in &rooms {
            for entry in scene.entries() {
                let Some(device) = room.device(entry.device_id) else {
                    continue;
                };
                match device.set_state(entry.state) {
                    Ok(()) => applied += 1,
                    Err(err) => tracing::debug!(
                        scene = name,
                        room = room.name(),
                        device_id = %entry.device_id,
                        error = %err,
                        "scene entry skipped"
                    ),
                }
            }
        }
        tracing::info!(scene = name, applied, "scene applied");
        true
    }

    /// Remove a stored scene. Returns `false` when it does not exist.
    pub fn delete_scene(&self, name: &str) -> bool {
        let mut scenes = self.lock_scenes();
        let before = scenes.len();
        scenes.retain(|s| s.name() != name);
        let removed = scenes.len() != before;
        if removed {
            tracing::info!(scene = name, "scene deleted");
        }
        removed
    }

    fn existing_room(&self, room_name: &str) -> Result<Arc<Room>, SmartHomeError> {
        self.house.room(room_name).ok_or_else(|| {
            NotFoundError {
                entity: "Room",
                id: room_name.to_string(),
            }
            .into()
        })
    }

    fn insert(&self, scene: Scene) -> Result<SceneSummary, SmartHomeError> {
        let mut scenes = self.lock_scenes();
        if scenes.iter().any(|s| s.name() == scene.name()) {
            return Err(ValidationError::DuplicateName {
                entity: "Scene",
                name: scene.name().to_string(),
            }
            .into());
        }
        let summary = SceneSummary::from(&scene);
        tracing::info!(
            scene = scene.name(),
            scope = %scene.scope(),
            devices = summary.device_count,
            "scene created"
        );
        scenes.push(scene);
        Ok(summary)
    }

    fn lock_scenes(&self) -> MutexGuard<'_, Vec<Scene>> {
        self.scenes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn snapshot(room: &Room) -> Vec<SceneEntry> {
    room.devices()
        .iter()
        .map(|device| SceneEntry::new(device.id(), device.state()))
        .collect()
}

/// An entry is valid when some device with its id, in one of `rooms`, can
/// hold its state.
fn check_entry(rooms: &[&Room], entry: &SceneEntry) -> Result<(), SmartHomeError> {
    let mut unsupported = None;
    for device in rooms.iter().filter_map(|room| room.device(entry.device_id)) {
        match device.kind().check(entry.state) {
            Ok(_) => return Ok(()),
            Err(err) => unsupported = Some(err),
        }
    }
    match unsupported {
        Some(err) => Err(err.into()),
        None => Err(NotFoundError {
            entity: "Device",
            id: entry.device_id.to_string(),
        }
        .into()),
    }
}
