//! House: the registry of rooms, keyed by unique name.
//!
//! Insertion order is kept so the driving layer can number rooms in a menu;
//! it carries no other meaning.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use smarthome_domain::error::{SmartHomeError, ValidationError};
use smarthome_domain::room::Room;

/// All rooms of the simulated home.
#[derive(Debug, Default)]
pub struct House {
    rooms: RwLock<Vec<Arc<Room>>>,
}

impl House {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a room.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateName`] when a room with the same
    /// name already exists.
    pub fn add_room(&self, room: Room) -> Result<Arc<Room>, SmartHomeError> {
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        if rooms.iter().any(|r| r.name() == room.name()) {
            return Err(ValidationError::DuplicateName {
                entity: "Room",
                name: room.name().to_string(),
            }
            .into());
        }
        let room = Arc::new(room);
        rooms.push(Arc::clone(&room));
        Ok(room)
    }

    /// Look up a room by its exact name.
    #[must_use]
    pub fn room(&self, name: &str) -> Option<Arc<Room>> {
        self.read_rooms().iter().find(|r| r.name() == name).cloned()
    }

    /// Look up a room by its 1-based menu position.
    #[must_use]
    pub fn room_at(&self, position: usize) -> Option<Arc<Room>> {
        position
            .checked_sub(1)
            .and_then(|index| self.read_rooms().get(index).cloned())
    }

    /// Snapshot of all rooms, in insertion order.
    #[must_use]
    pub fn rooms(&self) -> Vec<Arc<Room>> {
        self.read_rooms().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read_rooms().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_rooms().is_empty()
    }

    /// Total number of devices across every room.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.read_rooms().iter().map(|r| r.len()).sum()
    }

    fn read_rooms(&self) -> RwLockReadGuard<'_, Vec<Arc<Room>>> {
        self.rooms.read().unwrap_or_else(PoisonError::into_inner)
    }
}
