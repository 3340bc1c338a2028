// ==========================================
// 手术室排程系统 - 插台提交引擎
// ==========================================
// 职责: 把胜出策略的落位作为一次原子排班变更提交
// 红线: 新占用写入与全部让位清位必须同一事务
//       （事务边界在 ScheduleRepository::apply_insertion）
// ==========================================

use crate::domain::outcome::Placement;
use crate::repository::error::RepositoryResult;
use crate::repository::schedule_repo::ScheduleRepository;
use std::sync::Arc;
use tracing::info;

// ==========================================
// InsertionApplier - 插台提交引擎
// ==========================================
pub struct InsertionApplier {
    schedule_repo: Arc<ScheduleRepository>,
}

impl InsertionApplier {
    pub fn new(schedule_repo: Arc<ScheduleRepository>) -> Self {
        Self { schedule_repo }
    }

    /// 提交落位
    ///
    /// # 参数
    /// - surgery_id: 急诊手术ID
    /// - placement: 胜出策略的落位
    ///
    /// # 返回
    /// - `Ok(assignment_id)`: 新占用ID
    /// - `Err`: 事务失败，数据库保持提交前状态
    pub fn apply(&self, surgery_id: &str, placement: &Placement) -> RepositoryResult<String> {
        let assignment_id = self.schedule_repo.apply_insertion(surgery_id, placement)?;

        info!(
            surgery_id,
            assignment_id = %assignment_id,
            room_id = %placement.room_id,
            surgeon_id = %placement.surgeon_id,
            start_at = %placement.start_at,
            bumped = placement.bumped.len(),
            overtime = placement.overtime_required,
            "插台已提交"
        );
        Ok(assignment_id)
    }
}
