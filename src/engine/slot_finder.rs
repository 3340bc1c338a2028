// ==========================================
// 手术室排程系统 - 空闲房间检索引擎
// ==========================================
// 职责: "空闲房间插台" 策略的贪心首适配检索
// 策略说明: 按固定顺序遍历 房间 × 医生，取第一个可行组合，
//           不做跨组合的最早开始时间寻优。换成寻优会改变同一
//           输入下的落位结果，这里是明确的策略选择而非缺陷
// ==========================================

use crate::domain::outcome::{Placement, TacticResult};
use crate::domain::request::EmergencyRequest;
use crate::domain::schedule::DaySnapshot;
use crate::domain::surgery::{OperatingRoom, Surgeon};
use crate::domain::types::InsertionTactic;
use crate::engine::availability::AvailabilityChecker;
use chrono::Duration;
use tracing::debug;

/// 等待超出时限时的放弃原因
pub const REASON_WAIT_EXCEEDED: &str = "No free slot within the wait target";
/// 无可行组合时的放弃原因
pub const REASON_NO_FREE_PAIR: &str = "No free room/surgeon pair available";

// ==========================================
// SlotFinder - 空闲房间检索引擎
// ==========================================
pub struct SlotFinder {
    // 无状态引擎,不需要注入依赖
}

impl Default for SlotFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotFinder {
    pub fn new() -> Self {
        Self {}
    }

    /// 检索第一个可行的 (房间, 医生) 组合
    ///
    /// 候选开始时间 = max(到达时间, 期望开始时间)；
    /// 等待 (开始 - 到达) 超过有效时限则放弃
    pub fn find(
        &self,
        request: &EmergencyRequest,
        snapshot: &DaySnapshot,
        rooms: &[OperatingRoom],
        surgeons: &[Surgeon],
        checker: &AvailabilityChecker,
    ) -> TacticResult {
        let start = request.candidate_start();
        let end = start + Duration::minutes(request.duration_min);

        let wait_minutes = (start - request.arrival_at).num_minutes().max(0);
        if wait_minutes > request.effective_max_wait_minutes() {
            debug!(
                wait_minutes,
                max_wait = request.effective_max_wait_minutes(),
                "空闲房间检索: 候选开始时间超出等待时限"
            );
            return TacticResult::skipped(REASON_WAIT_EXCEEDED);
        }

        for room in rooms {
            for surgeon in surgeons {
                if checker.is_available(&room.room_id, &surgeon.surgeon_id, start, end, snapshot) {
                    debug!(
                        room_id = %room.room_id,
                        surgeon_id = %surgeon.surgeon_id,
                        %start,
                        "空闲房间检索: 找到可行组合"
                    );
                    return TacticResult::Placed(Placement {
                        tactic: InsertionTactic::BackupRoom,
                        room_id: room.room_id.clone(),
                        surgeon_id: surgeon.surgeon_id.clone(),
                        start_at: start,
                        end_at: end,
                        overtime_required: false,
                        bumped: Vec::new(),
                        conflicts: Vec::new(),
                        affected_surgeon_ids: Vec::new(),
                    });
                }
            }
        }

        TacticResult::skipped(REASON_NO_FREE_PAIR)
    }
}
