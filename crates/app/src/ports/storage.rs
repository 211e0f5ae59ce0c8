//! Storage port: persistence for rooms and their devices.

use std::future::Future;

use smarthome_domain::device::DeviceRecord;
use smarthome_domain::error::SmartHomeError;
use smarthome_domain::id::RoomId;
use smarthome_domain::room::RoomRecord;

/// Repository for persisting rooms and the devices they hold.
///
/// Saves are upserts: writing a record with an existing key replaces it.
pub trait HomeRepository {
    /// Get every stored room, ordered by id.
    fn load_rooms(&self) -> impl Future<Output = Result<Vec<RoomRecord>, SmartHomeError>> + Send;

    /// Get the devices stored for `room_id`, ordered by device id.
    fn load_devices(
        &self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Vec<DeviceRecord>, SmartHomeError>> + Send;

    /// Insert or update a room.
    fn save_room(&self, room: RoomRecord)
    -> impl Future<Output = Result<(), SmartHomeError>> + Send;

    /// Insert or update a device of `room_id`.
    fn save_device(
        &self,
        room_id: RoomId,
        device: DeviceRecord,
    ) -> impl Future<Output = Result<(), SmartHomeError>> + Send;
}
