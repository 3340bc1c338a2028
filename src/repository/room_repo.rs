// ==========================================
// 手术室排程系统 - 手术室仓储
// ==========================================
// 用途: 房间候选池（可按房间类型过滤）
// 红线: 候选池按 room_id 排序，保证检索结果可复现
// ==========================================

use crate::domain::surgery::OperatingRoom;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct OperatingRoomRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OperatingRoomRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<OperatingRoom> {
        Ok(OperatingRoom {
            room_id: row.get(0)?,
            name: row.get(1)?,
            room_type: row.get(2)?,
            is_backup: row.get::<_, i64>(3)? != 0,
            active: row.get::<_, i64>(4)? != 0,
        })
    }

    /// 按ID查询房间
    pub fn find_by_id(&self, room_id: &str) -> RepositoryResult<Option<OperatingRoom>> {
        let conn = self.get_conn()?;
        let room = conn
            .query_row(
                "SELECT room_id, name, room_type, is_backup, active
                 FROM operating_room WHERE room_id = ?1",
                params![room_id],
                Self::map_row,
            )
            .optional()?;
        Ok(room)
    }

    /// 可用房间候选池（固定排序，可按类型过滤）
    pub fn find_active_pool(
        &self,
        room_type_filter: Option<&str>,
    ) -> RepositoryResult<Vec<OperatingRoom>> {
        let conn = self.get_conn()?;

        let rooms = match room_type_filter {
            Some(room_type) => {
                let mut stmt = conn.prepare(
                    "SELECT room_id, name, room_type, is_backup, active
                     FROM operating_room
                     WHERE active = 1 AND room_type = ?1
                     ORDER BY room_id",
                )?;
                stmt.query_map(params![room_type], Self::map_row)?
                    .collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT room_id, name, room_type, is_backup, active
                     FROM operating_room
                     WHERE active = 1
                     ORDER BY room_id",
                )?;
                stmt.query_map([], Self::map_row)?
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(rooms)
    }

    /// 新增房间
    pub fn insert(&self, room: &OperatingRoom) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO operating_room (room_id, name, room_type, is_backup, active)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                room.room_id,
                room.name,
                room.room_type,
                if room.is_backup { 1 } else { 0 },
                if room.active { 1 } else { 0 },
            ],
        )?;
        Ok(())
    }
}
