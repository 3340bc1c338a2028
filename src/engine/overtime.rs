// ==========================================
// 手术室排程系统 - 延时插台检索引擎
// ==========================================
// 职责: "延时插台" 策略, 在正常工作时段之后寻找落位
// 锚点: max(名义下班时间, 当日最晚结束时间)
// 红线: 候选结束时间超过硬截止则放弃，不产生越界排班
// ==========================================

use crate::config::SchedulingPolicy;
use crate::domain::outcome::{Placement, TacticResult};
use crate::domain::request::EmergencyRequest;
use crate::domain::schedule::DaySnapshot;
use crate::domain::surgery::{OperatingRoom, Surgeon};
use crate::domain::types::InsertionTactic;
use crate::engine::availability::AvailabilityChecker;
use chrono::Duration;
use tracing::debug;

/// 延时被禁用时的放弃原因
pub const REASON_OVERTIME_DISALLOWED: &str = "Overtime not allowed";
/// 无可行延时落位时的放弃原因
pub const REASON_NO_OVERTIME_SLOT: &str = "No overtime slots available";

// ==========================================
// OvertimeSlotFinder - 延时插台检索引擎
// ==========================================
pub struct OvertimeSlotFinder {
    // 无状态引擎,不需要注入依赖
}

impl Default for OvertimeSlotFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl OvertimeSlotFinder {
    pub fn new() -> Self {
        Self {}
    }

    /// 在延时时段检索第一个可行的 (房间, 医生) 组合
    pub fn find(
        &self,
        request: &EmergencyRequest,
        snapshot: &DaySnapshot,
        rooms: &[OperatingRoom],
        surgeons: &[Surgeon],
        checker: &AvailabilityChecker,
        policy: &SchedulingPolicy,
    ) -> TacticResult {
        if !request.flags.allow_overtime {
            return TacticResult::skipped(REASON_OVERTIME_DISALLOWED);
        }

        let nominal_day_end = snapshot.date.and_time(policy.day_end);
        let anchor = match snapshot.latest_end() {
            Some(latest) if latest > nominal_day_end => latest,
            _ => nominal_day_end,
        };

        let start = anchor + Duration::minutes(policy.overtime_buffer_min);
        let end = start + Duration::minutes(request.duration_min);
        let cutoff = snapshot.date.and_time(policy.overtime_cutoff);

        if end > cutoff {
            debug!(%start, %end, %cutoff, "延时插台: 候选结束时间超过硬截止");
            return TacticResult::skipped(REASON_NO_OVERTIME_SLOT);
        }

        for room in rooms {
            for surgeon in surgeons {
                if checker.is_available(&room.room_id, &surgeon.surgeon_id, start, end, snapshot) {
                    debug!(
                        room_id = %room.room_id,
                        surgeon_id = %surgeon.surgeon_id,
                        %start,
                        "延时插台: 找到可行组合"
                    );
                    return TacticResult::Placed(Placement {
                        tactic: InsertionTactic::Overtime,
                        room_id: room.room_id.clone(),
                        surgeon_id: surgeon.surgeon_id.clone(),
                        start_at: start,
                        end_at: end,
                        overtime_required: true,
                        bumped: Vec::new(),
                        conflicts: Vec::new(),
                        affected_surgeon_ids: Vec::new(),
                    });
                }
            }
        }

        TacticResult::skipped(REASON_NO_OVERTIME_SLOT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::EmergencyFlags;
    use crate::domain::schedule::ScheduleAssignment;
    use crate::domain::types::{PriorityTier, UrgencyLevel};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 4)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn room(id: &str) -> OperatingRoom {
        OperatingRoom {
            room_id: id.to_string(),
            name: id.to_string(),
            room_type: "GENERAL".to_string(),
            is_backup: false,
            active: true,
        }
    }

    fn surgeon(id: &str) -> Surgeon {
        Surgeon {
            surgeon_id: id.to_string(),
            name: id.to_string(),
            specialty: None,
            active: true,
        }
    }

    fn busy(id: &str, room_id: &str, surgeon_id: &str, s: NaiveDateTime, e: NaiveDateTime) -> ScheduleAssignment {
        ScheduleAssignment {
            assignment_id: id.to_string(),
            surgery_id: format!("S_{}", id),
            room_id: room_id.to_string(),
            surgeon_id: surgeon_id.to_string(),
            start_at: s,
            end_at: e,
            urgency: UrgencyLevel::Medium,
        }
    }

    fn request(duration_min: i64, allow_overtime: bool) -> EmergencyRequest {
        EmergencyRequest {
            patient_id: "P001".to_string(),
            surgery_type_id: "T001".to_string(),
            duration_min,
            arrival_at: at(10, 0),
            tier: PriorityTier::SemiUrgent,
            required_surgeon_id: None,
            preferred_start: None,
            room_type_filter: None,
            flags: EmergencyFlags {
                allow_overtime,
                ..EmergencyFlags::default()
            },
            max_wait_override_min: None,
        }
    }

    #[test]
    fn test_disallowed_fails_fast() {
        let finder = OvertimeSlotFinder::new();
        let checker = AvailabilityChecker::new();
        let snap = DaySnapshot::new(NaiveDate::from_ymd_opt(2026, 8, 4).unwrap(), Vec::new());

        match finder.find(
            &request(60, false),
            &snap,
            &[room("R1")],
            &[surgeon("D1")],
            &checker,
            &SchedulingPolicy::default(),
        ) {
            TacticResult::Skipped { reason } => assert_eq!(reason, REASON_OVERTIME_DISALLOWED),
            TacticResult::Placed(_) => panic!("expected skip"),
        }
    }

    #[test]
    fn test_anchor_at_nominal_day_end() {
        let finder = OvertimeSlotFinder::new();
        let checker = AvailabilityChecker::new();
        // 最晚结束 16:00，早于名义下班 17:00
        let snap = DaySnapshot::new(
            NaiveDate::from_ymd_opt(2026, 8, 4).unwrap(),
            vec![busy("A1", "R1", "D1", at(14, 0), at(16, 0))],
        );

        match finder.find(
            &request(60, true),
            &snap,
            &[room("R1")],
            &[surgeon("D1")],
            &checker,
            &SchedulingPolicy::default(),
        ) {
            TacticResult::Placed(p) => {
                assert_eq!(p.start_at, at(17, 30));
                assert_eq!(p.end_at, at(18, 30));
                assert!(p.overtime_required);
            }
            TacticResult::Skipped { reason } => panic!("unexpected skip: {}", reason),
        }
    }

    #[test]
    fn test_anchor_at_latest_assignment_end() {
        let finder = OvertimeSlotFinder::new();
        let checker = AvailabilityChecker::new();
        // 最晚结束 18:00，晚于名义下班 17:00 → 锚点 18:00，开始 18:30
        let snap = DaySnapshot::new(
            NaiveDate::from_ymd_opt(2026, 8, 4).unwrap(),
            vec![busy("A1", "R1", "D1", at(15, 0), at(18, 0))],
        );

        match finder.find(
            &request(90, true),
            &snap,
            &[room("R1")],
            &[surgeon("D1")],
            &checker,
            &SchedulingPolicy::default(),
        ) {
            TacticResult::Placed(p) => {
                assert_eq!(p.start_at, at(18, 30));
                assert_eq!(p.end_at, at(20, 0));
                assert!(p.overtime_required);
            }
            TacticResult::Skipped { reason } => panic!("unexpected skip: {}", reason),
        }
    }

    #[test]
    fn test_cutoff_rejects_late_candidate() {
        let finder = OvertimeSlotFinder::new();
        let checker = AvailabilityChecker::new();
        // 最晚结束 22:00 → 候选 22:30 + 60min = 23:30 > 23:00
        let snap = DaySnapshot::new(
            NaiveDate::from_ymd_opt(2026, 8, 4).unwrap(),
            vec![busy("A1", "R1", "D1", at(20, 0), at(22, 0))],
        );

        match finder.find(
            &request(60, true),
            &snap,
            &[room("R1")],
            &[surgeon("D1")],
            &checker,
            &SchedulingPolicy::default(),
        ) {
            TacticResult::Skipped { reason } => assert_eq!(reason, REASON_NO_OVERTIME_SLOT),
            TacticResult::Placed(_) => panic!("expected skip"),
        }
    }

    #[test]
    fn test_candidate_end_exactly_at_cutoff_is_allowed() {
        let finder = OvertimeSlotFinder::new();
        let checker = AvailabilityChecker::new();
        // 锚点 17:00 → 开始 17:30，时长 330min → 结束 23:00 == 截止
        let snap = DaySnapshot::new(NaiveDate::from_ymd_opt(2026, 8, 4).unwrap(), Vec::new());

        assert!(matches!(
            finder.find(
                &request(330, true),
                &snap,
                &[room("R1")],
                &[surgeon("D1")],
                &checker,
                &SchedulingPolicy::default(),
            ),
            TacticResult::Placed(_)
        ));
    }
}
