// ==========================================
// 手术室排程系统 - 排班仓储
// ==========================================
// 职责: 当日占用快照查询 + 插台提交
// 红线: 新占用写入与全部让位清位必须同一事务，要么全部生效要么全部回滚
// ==========================================

use crate::domain::outcome::Placement;
use crate::domain::schedule::{DaySnapshot, ScheduleAssignment};
use crate::domain::types::{SurgeryStatus, UrgencyLevel};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub struct ScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询指定日期的排班快照
    ///
    /// 联查 surgery 表补充主刀医生与紧急度（让位排序依据），
    /// 按 (room_id, start_at) 排序保证快照顺序可复现
    pub fn find_day_snapshot(&self, date: NaiveDate) -> RepositoryResult<DaySnapshot> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT a.assignment_id, a.surgery_id, a.room_id, s.surgeon_id,
                    a.start_at, a.end_at, s.urgency
             FROM schedule_assignment a
             JOIN surgery s ON s.surgery_id = a.surgery_id
             WHERE date(a.start_at) = ?1
             ORDER BY a.room_id, a.start_at",
        )?;

        let assignments = stmt
            .query_map(params![date.format("%Y-%m-%d").to_string()], |row| {
                let surgeon_id: Option<String> = row.get(3)?;
                let urgency: String = row.get(6)?;
                Ok(ScheduleAssignment {
                    assignment_id: row.get(0)?,
                    surgery_id: row.get(1)?,
                    room_id: row.get(2)?,
                    // 占用必然有主刀；脏数据按空串处理并由上层可用性检查兜底
                    surgeon_id: surgeon_id.unwrap_or_default(),
                    start_at: row.get(4)?,
                    end_at: row.get(5)?,
                    urgency: UrgencyLevel::from_db_str(&urgency),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DaySnapshot::new(date, assignments))
    }

    /// 提交插台决定（单事务）
    ///
    /// 事务内容:
    /// 1. 写入急诊手术的新占用
    /// 2. 更新急诊手术落位字段，状态置 SCHEDULED
    /// 3. 对每个被让位手术: 删除其占用、清空落位字段、状态退回 AWAITING_RESCHEDULE
    ///
    /// # 返回
    /// - `Ok(assignment_id)`: 新占用ID
    /// - `Err`: 任一写入失败，整个事务回滚
    pub fn apply_insertion(
        &self,
        surgery_id: &str,
        placement: &Placement,
    ) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let assignment_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        tx.execute(
            "INSERT INTO schedule_assignment (assignment_id, surgery_id, room_id, start_at, end_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                assignment_id,
                surgery_id,
                placement.room_id,
                placement.start_at,
                placement.end_at,
                now,
            ],
        )?;

        let updated = tx.execute(
            "UPDATE surgery
             SET surgeon_id = ?1, room_id = ?2, scheduled_start = ?3, scheduled_end = ?4,
                 status = ?5, updated_at = ?6
             WHERE surgery_id = ?7",
            params![
                placement.surgeon_id,
                placement.room_id,
                placement.start_at,
                placement.end_at,
                SurgeryStatus::Scheduled.to_db_str(),
                now,
                surgery_id,
            ],
        )?;
        if updated != 1 {
            return Err(RepositoryError::NotFound {
                entity: "surgery".to_string(),
                id: surgery_id.to_string(),
            });
        }

        for bumped in &placement.bumped {
            let deleted = tx.execute(
                "DELETE FROM schedule_assignment WHERE assignment_id = ?1",
                params![bumped.assignment_id],
            )?;
            if deleted != 1 {
                return Err(RepositoryError::DatabaseTransactionError(format!(
                    "让位占用不存在或已变更: assignment_id={}",
                    bumped.assignment_id
                )));
            }

            let cleared = tx.execute(
                "UPDATE surgery
                 SET surgeon_id = NULL, room_id = NULL,
                     scheduled_start = NULL, scheduled_end = NULL,
                     status = ?1, updated_at = ?2
                 WHERE surgery_id = ?3",
                params![
                    SurgeryStatus::AwaitingReschedule.to_db_str(),
                    now,
                    bumped.surgery_id,
                ],
            )?;
            if cleared != 1 {
                return Err(RepositoryError::DatabaseTransactionError(format!(
                    "让位手术不存在: surgery_id={}",
                    bumped.surgery_id
                )));
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(assignment_id)
    }

    /// 指定日期的占用数量（测试与巡检用）
    pub fn count_for_day(&self, date: NaiveDate) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM schedule_assignment WHERE date(start_at) = ?1",
            params![date.format("%Y-%m-%d").to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 写入一条占用（种子/测试数据用）
    pub fn insert_assignment(&self, assignment: &ScheduleAssignment) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO schedule_assignment (assignment_id, surgery_id, room_id, start_at, end_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                assignment.assignment_id,
                assignment.surgery_id,
                assignment.room_id,
                assignment.start_at,
                assignment.end_at,
                Utc::now(),
            ],
        )?;
        Ok(())
    }
}
