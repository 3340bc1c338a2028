// ==========================================
// 手术室排程系统 - 医生仓储
// ==========================================
// 用途: 指定主刀校验 + 医生候选池
// 红线: 候选池按 surgeon_id 排序，保证检索结果可复现
// ==========================================

use crate::domain::surgery::Surgeon;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct SurgeonRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SurgeonRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Surgeon> {
        Ok(Surgeon {
            surgeon_id: row.get(0)?,
            name: row.get(1)?,
            specialty: row.get(2)?,
            active: row.get::<_, i64>(3)? != 0,
        })
    }

    /// 按ID查询医生
    pub fn find_by_id(&self, surgeon_id: &str) -> RepositoryResult<Option<Surgeon>> {
        let conn = self.get_conn()?;
        let surgeon = conn
            .query_row(
                "SELECT surgeon_id, name, specialty, active
                 FROM surgeon WHERE surgeon_id = ?1",
                params![surgeon_id],
                Self::map_row,
            )
            .optional()?;
        Ok(surgeon)
    }

    /// 在岗医生候选池（固定排序）
    pub fn find_active_pool(&self) -> RepositoryResult<Vec<Surgeon>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT surgeon_id, name, specialty, active
             FROM surgeon WHERE active = 1
             ORDER BY surgeon_id",
        )?;
        let surgeons = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(surgeons)
    }

    /// 新增医生
    pub fn insert(&self, surgeon: &Surgeon) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO surgeon (surgeon_id, name, specialty, active)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                surgeon.surgeon_id,
                surgeon.name,
                surgeon.specialty,
                if surgeon.active { 1 } else { 0 },
            ],
        )?;
        Ok(())
    }
}
