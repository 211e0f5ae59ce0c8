//! House service: loads the house from storage and writes it back.

use smarthome_domain::device::{Device, DeviceRecord};
use smarthome_domain::error::SmartHomeError;
use smarthome_domain::room::{Room, RoomRecord};

use crate::house::House;
use crate::ports::HomeRepository;

/// A room together with the devices it should start with.
pub type RoomSeed = (RoomRecord, Vec<DeviceRecord>);

/// Application service moving the house in and out of a [`HomeRepository`].
pub struct HouseService<R> {
    repo: R,
}

impl<R: HomeRepository> HouseService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Write `rooms` when the store holds no room yet.
    ///
    /// Returns `true` when the seed was written.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn seed_if_empty(&self, rooms: Vec<RoomSeed>) -> Result<bool, SmartHomeError> {
        if !self.repo.load_rooms().await?.is_empty() {
            return Ok(false);
        }
        for (room, devices) in rooms {
            let room_id = room.id;
            tracing::info!(room_id = %room_id, room = %room.name, devices = devices.len(), "seeding room");
            self.repo.save_room(room).await?;
            for device in devices {
                self.repo.save_device(room_id, device).await?;
            }
        }
        Ok(true)
    }

    /// Rebuild the house from storage.
    ///
    /// Device states a kind cannot hold are reset to the kind's default.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repository, or a validation error
    /// when a stored record breaks a domain invariant (empty name).
    pub async fn load_house(&self) -> Result<House, SmartHomeError> {
        let house = House::new();
        for record in self.repo.load_rooms().await? {
            let room = house.add_room(Room::from_record(record)?)?;
            for device in self.repo.load_devices(room.id()).await? {
                let stored = device.state;
                let device = room.add_device(Device::from_record(device)?)?;
                if device.state() != stored {
                    tracing::warn!(
                        room = room.name(),
                        device_id = %device.id(),
                        stored = %stored,
                        state = %device.state(),
                        "stored state not supported by device kind, reset"
                    );
                }
            }
        }
        tracing::info!(
            rooms = house.len(),
            devices = house.device_count(),
            "house loaded"
        );
        Ok(house)
    }

    /// Persist every room and device of `house`.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn save_house(&self, house: &House) -> Result<(), SmartHomeError> {
        for room in house.rooms() {
            self.save_room(&room).await?;
        }
        tracing::info!(rooms = house.len(), "house saved");
        Ok(())
    }

    /// Persist one room and its devices.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn save_room(&self, room: &Room) -> Result<(), SmartHomeError> {
        self.repo.save_room(room.record()).await?;
        for device in room.devices() {
            self.repo.save_device(room.id(), device.record()).await?;
        }
        Ok(())
    }
}
