// ==========================================
// 手术室排程系统 - 插台策略编排器
// ==========================================
// 职责: 按分级固定顺序尝试插台策略，第一个成功者胜出
// 红线: 策略顺序只由分级决定，禁止运行期启发式重排
// 红线: 失败策略不得留下任何副作用（策略只读快照）
// ==========================================

use crate::config::SchedulingPolicy;
use crate::domain::outcome::{InsertionDecision, TacticAttempt, TacticResult};
use crate::domain::request::EmergencyRequest;
use crate::domain::schedule::DaySnapshot;
use crate::domain::surgery::{OperatingRoom, Surgeon};
use crate::domain::types::{InsertionTactic, PriorityTier};
use crate::engine::availability::AvailabilityChecker;
use crate::engine::bump::BumpSelector;
use crate::engine::overtime::OvertimeSlotFinder;
use crate::engine::slot_finder::SlotFinder;
use tracing::{debug, info};

/// 全部策略失败时的统一失败原因
pub const REASON_EXHAUSTED: &str = "No viable insertion strategy found";
/// 空闲房间策略被禁用时的放弃原因
pub const REASON_BACKUP_ROOMS_DISALLOWED: &str = "Backup rooms not allowed";
/// 人工协调策略的放弃原因（该策略从不自动落位）
pub const REASON_MANUAL_REVIEW: &str = "Manual coordination required";

// ==========================================
// EmergencyOrchestrator - 插台策略编排器
// ==========================================
pub struct EmergencyOrchestrator {
    checker: AvailabilityChecker,
    slot_finder: SlotFinder,
    overtime: OvertimeSlotFinder,
    bump: BumpSelector,
    policy: SchedulingPolicy,
}

impl EmergencyOrchestrator {
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - policy: 排程策略快照（一次决策内不变）
    pub fn new(policy: SchedulingPolicy) -> Self {
        Self {
            checker: AvailabilityChecker::new(),
            slot_finder: SlotFinder::new(),
            overtime: OvertimeSlotFinder::new(),
            bump: BumpSelector::new(),
            policy,
        }
    }

    /// 分级对应的策略顺序
    pub fn tactic_order(tier: PriorityTier) -> &'static [InsertionTactic] {
        match tier {
            PriorityTier::Immediate => &[
                InsertionTactic::PriorityBump,
                InsertionTactic::BackupRoom,
                InsertionTactic::Overtime,
            ],
            PriorityTier::Urgent => &[
                InsertionTactic::BackupRoom,
                InsertionTactic::PriorityBump,
                InsertionTactic::Overtime,
            ],
            PriorityTier::SemiUrgent => &[
                InsertionTactic::BackupRoom,
                InsertionTactic::Overtime,
                InsertionTactic::PriorityBump,
            ],
            PriorityTier::Scheduled => &[
                InsertionTactic::BackupRoom,
                InsertionTactic::Overtime,
                InsertionTactic::ManualReview,
            ],
        }
    }

    /// 执行插台决策
    ///
    /// # 参数
    /// - request: 已通过校验的插台请求
    /// - snapshot: 当日排班快照（只读）
    /// - rooms: 房间候选池（已按类型过滤、固定排序）
    /// - surgeons: 医生候选池（指定主刀时只含该医生）
    ///
    /// # 返回
    /// 第一个成功策略的落位，或全部失败的策略穷尽记录
    pub fn resolve(
        &self,
        request: &EmergencyRequest,
        snapshot: &DaySnapshot,
        rooms: &[OperatingRoom],
        surgeons: &[Surgeon],
    ) -> InsertionDecision {
        let order = Self::tactic_order(request.tier);
        info!(
            tier = %request.tier,
            assignments = snapshot.assignments.len(),
            rooms = rooms.len(),
            surgeons = surgeons.len(),
            "开始插台决策"
        );

        let mut attempts: Vec<TacticAttempt> = Vec::new();
        let mut needs_manual_review = false;

        for tactic in order {
            let result = match tactic {
                InsertionTactic::BackupRoom => {
                    if request.flags.allow_backup_rooms {
                        self.slot_finder
                            .find(request, snapshot, rooms, surgeons, &self.checker)
                    } else {
                        TacticResult::skipped(REASON_BACKUP_ROOMS_DISALLOWED)
                    }
                }
                InsertionTactic::PriorityBump => {
                    self.bump
                        .select(request, snapshot, &self.checker, &self.policy)
                }
                InsertionTactic::Overtime => self.overtime.find(
                    request,
                    snapshot,
                    rooms,
                    surgeons,
                    &self.checker,
                    &self.policy,
                ),
                InsertionTactic::ManualReview => {
                    // 终端策略: 从不自动落位，只把结果标记为需人工协调
                    needs_manual_review = true;
                    TacticResult::skipped(REASON_MANUAL_REVIEW)
                }
            };

            match result {
                TacticResult::Placed(placement) => {
                    info!(
                        tactic = %placement.tactic,
                        room_id = %placement.room_id,
                        surgeon_id = %placement.surgeon_id,
                        start_at = %placement.start_at,
                        bumped = placement.bumped.len(),
                        overtime = placement.overtime_required,
                        "插台策略胜出"
                    );
                    return InsertionDecision::Placed(placement);
                }
                TacticResult::Skipped { reason } => {
                    debug!(tactic = %tactic, reason = %reason, "插台策略放弃");
                    attempts.push(TacticAttempt {
                        tactic: *tactic,
                        reason,
                    });
                }
            }
        }

        info!(attempts = attempts.len(), "全部插台策略失败");
        InsertionDecision::Exhausted {
            attempts,
            needs_manual_review,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::EmergencyFlags;
    use crate::domain::schedule::ScheduleAssignment;
    use crate::domain::types::UrgencyLevel;
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

    fn busy(
        id: &str,
        room_id: &str,
        surgeon_id: &str,
        urgency: UrgencyLevel,
        s: NaiveDateTime,
        e: NaiveDateTime,
    ) -> ScheduleAssignment {
        ScheduleAssignment {
            assignment_id: id.to_string(),
            surgery_id: format!("S_{}", id),
            room_id: room_id.to_string(),
            surgeon_id: surgeon_id.to_string(),
            start_at: s,
            end_at: e,
            urgency,
        }
    }

    fn request(tier: PriorityTier) -> EmergencyRequest {
        EmergencyRequest {
            patient_id: "P001".to_string(),
            surgery_type_id: "T001".to_string(),
            duration_min: 30,
            arrival_at: at(10, 0),
            tier,
            required_surgeon_id: None,
            preferred_start: None,
            room_type_filter: None,
            flags: EmergencyFlags::default(),
            max_wait_override_min: None,
        }
    }

    #[test]
    fn test_tactic_order_per_tier() {
        assert_eq!(
            EmergencyOrchestrator::tactic_order(PriorityTier::Immediate),
            &[
                InsertionTactic::PriorityBump,
                InsertionTactic::BackupRoom,
                InsertionTactic::Overtime
            ]
        );
        assert_eq!(
            EmergencyOrchestrator::tactic_order(PriorityTier::Urgent),
            &[
                InsertionTactic::BackupRoom,
                InsertionTactic::PriorityBump,
                InsertionTactic::Overtime
            ]
        );
        assert_eq!(
            EmergencyOrchestrator::tactic_order(PriorityTier::SemiUrgent),
            &[
                InsertionTactic::BackupRoom,
                InsertionTactic::Overtime,
                InsertionTactic::PriorityBump
            ]
        );
        assert_eq!(
            EmergencyOrchestrator::tactic_order(PriorityTier::Scheduled),
            &[
                InsertionTactic::BackupRoom,
                InsertionTactic::Overtime,
                InsertionTactic::ManualReview
            ]
        );
    }

    #[test]
    fn test_immediate_tier_bumps_before_free_slot() {
        // Immediate 先尝试让位: 即使 R2 空闲，也应驱逐 Low 手术
        let orchestrator = EmergencyOrchestrator::new(SchedulingPolicy::default());
        let snap = DaySnapshot::new(
            NaiveDate::from_ymd_opt(2026, 8, 4).unwrap(),
            vec![busy("A1", "R1", "D1", UrgencyLevel::Low, at(10, 0), at(12, 0))],
        );
        let rooms = vec![room("R1"), room("R2")];
        let surgeons = vec![surgeon("D1"), surgeon("D2")];

        match orchestrator.resolve(&request(PriorityTier::Immediate), &snap, &rooms, &surgeons) {
            InsertionDecision::Placed(p) => {
                assert_eq!(p.tactic, InsertionTactic::PriorityBump);
                assert_eq!(p.room_id, "R1");
            }
            InsertionDecision::Exhausted { .. } => panic!("expected placement"),
        }
    }

    #[test]
    fn test_urgent_tier_prefers_free_slot_over_bump() {
        let orchestrator = EmergencyOrchestrator::new(SchedulingPolicy::default());
        let snap = DaySnapshot::new(
            NaiveDate::from_ymd_opt(2026, 8, 4).unwrap(),
            vec![busy("A1", "R1", "D1", UrgencyLevel::Low, at(10, 0), at(12, 0))],
        );
        let rooms = vec![room("R1"), room("R2")];
        let surgeons = vec![surgeon("D1"), surgeon("D2")];

        match orchestrator.resolve(&request(PriorityTier::Urgent), &snap, &rooms, &surgeons) {
            InsertionDecision::Placed(p) => {
                assert_eq!(p.tactic, InsertionTactic::BackupRoom);
                assert_eq!(p.room_id, "R2");
                assert!(p.bumped.is_empty());
            }
            InsertionDecision::Exhausted { .. } => panic!("expected placement"),
        }
    }

    #[test]
    fn test_scheduled_tier_exhaustion_flags_manual_review() {
        let orchestrator = EmergencyOrchestrator::new(SchedulingPolicy::default());
        // 唯一房间被占至 23:00，空闲与延时均不可行
        let snap = DaySnapshot::new(
            NaiveDate::from_ymd_opt(2026, 8, 4).unwrap(),
            vec![busy("A1", "R1", "D1", UrgencyLevel::High, at(8, 0), at(23, 0))],
        );
        let rooms = vec![room("R1")];
        let surgeons = vec![surgeon("D1")];

        match orchestrator.resolve(&request(PriorityTier::Scheduled), &snap, &rooms, &surgeons) {
            InsertionDecision::Exhausted {
                attempts,
                needs_manual_review,
            } => {
                assert!(needs_manual_review);
                assert_eq!(attempts.len(), 3);
                assert_eq!(attempts[0].tactic, InsertionTactic::BackupRoom);
                assert_eq!(attempts[1].tactic, InsertionTactic::Overtime);
                assert_eq!(attempts[2].tactic, InsertionTactic::ManualReview);
            }
            InsertionDecision::Placed(_) => panic!("expected exhaustion"),
        }
    }

    #[test]
    fn test_determinism_same_input_same_decision() {
        let orchestrator = EmergencyOrchestrator::new(SchedulingPolicy::default());
        let snap = DaySnapshot::new(
            NaiveDate::from_ymd_opt(2026, 8, 4).unwrap(),
            vec![
                busy("A1", "R1", "D1", UrgencyLevel::Medium, at(9, 0), at(11, 0)),
                busy("A2", "R2", "D2", UrgencyLevel::Low, at(9, 0), at(11, 0)),
            ],
        );
        let rooms = vec![room("R1"), room("R2"), room("R3")];
        let surgeons = vec![surgeon("D1"), surgeon("D2"), surgeon("D3")];
        let req = request(PriorityTier::Urgent);

        let first = orchestrator.resolve(&req, &snap, &rooms, &surgeons);
        for _ in 0..5 {
            let again = orchestrator.resolve(&req, &snap, &rooms, &surgeons);
            match (&first, &again) {
                (InsertionDecision::Placed(a), InsertionDecision::Placed(b)) => {
                    assert_eq!(a.tactic, b.tactic);
                    assert_eq!(a.room_id, b.room_id);
                    assert_eq!(a.surgeon_id, b.surgeon_id);
                    assert_eq!(a.start_at, b.start_at);
                }
                _ => panic!("decision changed between replays"),
            }
        }
    }
}
