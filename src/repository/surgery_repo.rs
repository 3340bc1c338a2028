// ==========================================
// 手术室排程系统 - 手术仓储
// ==========================================
// 职责: 手术类型查询 + 手术记录读写
// 红线: 让位不删手术行（清位由 schedule_repo 事务完成）
// ==========================================

use crate::domain::request::EmergencyRequest;
use crate::domain::surgery::{Surgery, SurgeryType};
use crate::domain::types::{SurgeryStatus, UrgencyLevel};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub struct SurgeryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SurgeryRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_surgery_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Surgery> {
        let urgency: String = row.get(8)?;
        let status: String = row.get(9)?;
        Ok(Surgery {
            surgery_id: row.get(0)?,
            patient_id: row.get(1)?,
            surgery_type_id: row.get(2)?,
            surgeon_id: row.get(3)?,
            room_id: row.get(4)?,
            scheduled_start: row.get(5)?,
            scheduled_end: row.get(6)?,
            duration_min: row.get(7)?,
            urgency: UrgencyLevel::from_db_str(&urgency),
            status: SurgeryStatus::from_db_str(&status),
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    const SURGERY_COLUMNS: &'static str = "surgery_id, patient_id, surgery_type_id, surgeon_id, \
         room_id, scheduled_start, scheduled_end, duration_min, urgency, status, \
         created_at, updated_at";

    /// 按ID查询手术类型
    pub fn find_type_by_id(&self, type_id: &str) -> RepositoryResult<Option<SurgeryType>> {
        let conn = self.get_conn()?;
        let surgery_type = conn
            .query_row(
                "SELECT type_id, name, default_duration_min
                 FROM surgery_type WHERE type_id = ?1",
                params![type_id],
                |row| {
                    Ok(SurgeryType {
                        type_id: row.get(0)?,
                        name: row.get(1)?,
                        default_duration_min: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(surgery_type)
    }

    /// 新增手术类型
    pub fn insert_type(&self, surgery_type: &SurgeryType) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO surgery_type (type_id, name, default_duration_min)
             VALUES (?1, ?2, ?3)",
            params![
                surgery_type.type_id,
                surgery_type.name,
                surgery_type.default_duration_min,
            ],
        )?;
        Ok(())
    }

    /// 按ID查询手术
    pub fn find_by_id(&self, surgery_id: &str) -> RepositoryResult<Option<Surgery>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM surgery WHERE surgery_id = ?1",
            Self::SURGERY_COLUMNS
        );
        let surgery = conn
            .query_row(&sql, params![surgery_id], Self::map_surgery_row)
            .optional()?;
        Ok(surgery)
    }

    /// 登记急诊手术（未排状态，插台失败时记录保留）
    pub fn register_emergency(&self, request: &EmergencyRequest) -> RepositoryResult<Surgery> {
        let now = Utc::now();
        let surgery = Surgery {
            surgery_id: Uuid::new_v4().to_string(),
            patient_id: request.patient_id.clone(),
            surgery_type_id: request.surgery_type_id.clone(),
            surgeon_id: None,
            room_id: None,
            scheduled_start: None,
            scheduled_end: None,
            duration_min: request.duration_min,
            urgency: UrgencyLevel::Emergency,
            status: SurgeryStatus::AwaitingReschedule,
            created_at: now,
            updated_at: now,
        };

        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO surgery (
                surgery_id, patient_id, surgery_type_id, surgeon_id, room_id,
                scheduled_start, scheduled_end, duration_min, urgency, status,
                created_at, updated_at
             ) VALUES (?1, ?2, ?3, NULL, NULL, NULL, NULL, ?4, ?5, ?6, ?7, ?8)",
            params![
                surgery.surgery_id,
                surgery.patient_id,
                surgery.surgery_type_id,
                surgery.duration_min,
                surgery.urgency.to_db_str(),
                surgery.status.to_db_str(),
                surgery.created_at,
                surgery.updated_at,
            ],
        )?;
        Ok(surgery)
    }

    /// 新增手术（种子/测试数据用）
    pub fn insert(&self, surgery: &Surgery) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO surgery (
                surgery_id, patient_id, surgery_type_id, surgeon_id, room_id,
                scheduled_start, scheduled_end, duration_min, urgency, status,
                created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                surgery.surgery_id,
                surgery.patient_id,
                surgery.surgery_type_id,
                surgery.surgeon_id,
                surgery.room_id,
                surgery.scheduled_start,
                surgery.scheduled_end,
                surgery.duration_min,
                surgery.urgency.to_db_str(),
                surgery.status.to_db_str(),
                surgery.created_at,
                surgery.updated_at,
            ],
        )?;
        Ok(())
    }
}
