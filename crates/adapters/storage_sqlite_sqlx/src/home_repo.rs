//! `SQLite` implementation of [`HomeRepository`].

use std::future::Future;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use smarthome_app::ports::HomeRepository;
use smarthome_domain::device::{DeviceKind, DeviceRecord, DeviceState};
use smarthome_domain::error::SmartHomeError;
use smarthome_domain::id::{DeviceId, RoomId};
use smarthome_domain::room::RoomRecord;

use crate::error::StorageError;

/// Wrapper for converting database rows into domain records.
struct Wrapper<T>(T);

impl<'r> FromRow<'r, SqliteRow> for Wrapper<RoomRecord> {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let name: String = row.try_get("name")?;

        Ok(Self(RoomRecord {
            id: RoomId::new(id),
            name,
        }))
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper<DeviceRecord> {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let kind: String = row.try_get("kind")?;
        let state: String = row.try_get("state")?;

        let kind = DeviceKind::from_str(&kind).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let state =
            DeviceState::from_str(&state).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(DeviceRecord {
            id: DeviceId::new(id),
            name,
            kind,
            state,
        }))
    }
}

const SELECT_ROOMS: &str = "SELECT id, name FROM rooms ORDER BY id";
const SELECT_DEVICES: &str =
    "SELECT id, name, kind, state FROM devices WHERE room_id = ? ORDER BY id";
const UPSERT_ROOM: &str = "INSERT INTO rooms (id, name) VALUES (?, ?) \
     ON CONFLICT (id) DO UPDATE SET name = excluded.name";
const UPSERT_DEVICE: &str = "INSERT INTO devices (id, room_id, name, kind, state) \
     VALUES (?, ?, ?, ?, ?) \
     ON CONFLICT (room_id, id) DO UPDATE SET \
     name = excluded.name, kind = excluded.kind, state = excluded.state";

/// `SQLite`-backed home repository.
pub struct SqliteHomeRepository {
    pool: SqlitePool,
}

impl SqliteHomeRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl HomeRepository for SqliteHomeRepository {
    fn load_rooms(&self) -> impl Future<Output = Result<Vec<RoomRecord>, SmartHomeError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper<RoomRecord>> = sqlx::query_as(SELECT_ROOMS)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn load_devices(
        &self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Vec<DeviceRecord>, SmartHomeError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper<DeviceRecord>> = sqlx::query_as(SELECT_DEVICES)
                .bind(room_id.get())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn save_room(&self, room: RoomRecord) -> impl Future<Output = Result<(), SmartHomeError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPSERT_ROOM)
                .bind(room.id.get())
                .bind(&room.name)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }

    fn save_device(
        &self,
        room_id: RoomId,
        device: DeviceRecord,
    ) -> impl Future<Output = Result<(), SmartHomeError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPSERT_DEVICE)
                .bind(device.id.get())
                .bind(room_id.get())
                .bind(&device.name)
                .bind(device.kind.to_string())
                .bind(device.state.as_str())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }
}
