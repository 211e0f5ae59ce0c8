//! Room: a named, ordered collection of devices.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::device::Device;
use crate::error::{SmartHomeError, ValidationError};
use crate::id::{DeviceId, RoomId};

/// A plain, owned copy of a room's identity: what the store loads and saves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub id: RoomId,
    pub name: String,
}

/// A room owning its devices.
///
/// Devices are handed out as `Arc<Device>` so scheduled actions can hold on
/// to the exact device they were created for. Device ids are unique within a
/// room; insertion order is preserved.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    name: String,
    devices: RwLock<Vec<Arc<Device>>>,
}

impl Room {
    /// Create an empty room.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::Validation`] when `name` is empty.
    pub fn new(id: RoomId, name: impl Into<String>) -> Result<Self, SmartHomeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(Self {
            id,
            name,
            devices: RwLock::new(Vec::new()),
        })
    }

    /// Rebuild a room from a stored record.
    ///
    /// # Errors
    ///
    /// Returns [`SmartHomeError::Validation`] when the name is empty.
    pub fn from_record(record: RoomRecord) -> Result<Self, SmartHomeError> {
        Self::new(record.id, record.name)
    }

    #[must_use]
    pub fn id(&self) -> RoomId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn record(&self) -> RoomRecord {
        RoomRecord {
            id: self.id,
            name: self.name.clone(),
        }
    }

    /// Append a device, taking ownership of it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateDeviceId`] when a device with the
    /// same id is already in this room.
    pub fn add_device(&self, device: Device) -> Result<Arc<Device>, SmartHomeError> {
        let mut devices = self.write_devices();
        if devices.iter().any(|d| d.id() == device.id()) {
            return Err(ValidationError::DuplicateDeviceId {
                id: device.id().get(),
            }
            .into());
        }
        let device = Arc::new(device);
        devices.push(Arc::clone(&device));
        Ok(device)
    }

    /// Remove a device by id. Returns `false` when no such device exists.
    pub fn remove_device(&self, id: DeviceId) -> bool {
        let mut devices = self.write_devices();
        let before = devices.len();
        devices.retain(|d| d.id() != id);
        devices.len() != before
    }

    /// Snapshot of the device list, in insertion order.
    #[must_use]
    pub fn devices(&self) -> Vec<Arc<Device>> {
        self.read_devices().clone()
    }

    /// Look up a device by id.
    #[must_use]
    pub fn device(&self, id: DeviceId) -> Option<Arc<Device>> {
        self.read_devices().iter().find(|d| d.id() == id).cloned()
    }

    /// Toggle a device by id. Returns `false` when no such device exists.
    pub fn toggle_device(&self, id: DeviceId) -> bool {
        match self.device(id) {
            Some(device) => {
                device.toggle();
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read_devices().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_devices().is_empty()
    }

    fn read_devices(&self) -> RwLockReadGuard<'_, Vec<Arc<Device>>> {
        self.devices.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_devices(&self) -> RwLockWriteGuard<'_, Vec<Arc<Device>>> {
        self.devices.write().unwrap_or_else(PoisonError::into_inner)
    }
}
