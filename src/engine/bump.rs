// ==========================================
// 手术室排程系统 - 让位选择引擎
// ==========================================
// 职责: "低优先级让位" 策略, 挑选并验证一台可被让位的存量手术
// 候选集: 紧急度权重严格低于请求分级权重的占用
// 排序: (紧急度权重升序, 占用窗口升序), 优先驱逐最低优先级、最短的手术
// 红线: 让位只清位不删记录，被让位手术退回待重排队列
// ==========================================

use crate::config::SchedulingPolicy;
use crate::domain::outcome::{ConflictRecord, Placement, TacticResult};
use crate::domain::request::EmergencyRequest;
use crate::domain::schedule::{DaySnapshot, ScheduleAssignment};
use crate::domain::types::{ConflictKind, InsertionTactic};
use crate::engine::availability::AvailabilityChecker;
use chrono::Duration;
use tracing::debug;

/// 让位被禁用时的放弃原因
pub const REASON_BUMP_DISALLOWED: &str = "Bumping not allowed";
/// 无可让位候选时的放弃原因
pub const REASON_NO_BUMP_CANDIDATE: &str = "No bumpable lower-priority case found";

// ==========================================
// BumpSelector - 让位选择引擎
// ==========================================
pub struct BumpSelector {
    // 无状态引擎,不需要注入依赖
}

impl Default for BumpSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl BumpSelector {
    pub fn new() -> Self {
        Self {}
    }

    /// 挑选让位候选并给出落位
    ///
    /// 接受条件（按排序逐个检查，第一个通过者胜出）:
    /// 1. 候选占用窗口 ≥ 请求时长
    /// 2. 给定期望开始时间时，候选开始时间与其偏差 ≤ 容许时间窗
    /// 3. 急诊选定的主刀在排除该候选占用后的快照下无冲突
    pub fn select(
        &self,
        request: &EmergencyRequest,
        snapshot: &DaySnapshot,
        checker: &AvailabilityChecker,
        policy: &SchedulingPolicy,
    ) -> TacticResult {
        if !request.flags.allow_bumping {
            return TacticResult::skipped(REASON_BUMP_DISALLOWED);
        }

        let tier_weight = request.tier.weight();
        let mut candidates: Vec<&ScheduleAssignment> = snapshot
            .assignments
            .iter()
            .filter(|a| a.urgency.weight() < tier_weight)
            .collect();

        // 最低权重、最短窗口优先；占用ID兜底保证排序稳定
        candidates.sort_by(|a, b| {
            a.urgency
                .weight()
                .partial_cmp(&b.urgency.weight())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.window_minutes().cmp(&b.window_minutes()))
                .then(a.assignment_id.cmp(&b.assignment_id))
        });

        for candidate in candidates {
            if candidate.window_minutes() < request.duration_min {
                continue;
            }

            if let Some(preferred) = request.preferred_start {
                let offset = (candidate.start_at - preferred).num_minutes().abs();
                if offset > policy.bump_window_min {
                    continue;
                }
            }

            // 急诊接管候选的房间与开始时间，结束时间按急诊自身时长计算
            let start = candidate.start_at;
            let end = start + Duration::minutes(request.duration_min);

            // 指定主刀优先，否则沿用被让位手术腾出的医生
            let surgeon_id = request
                .required_surgeon_id
                .clone()
                .unwrap_or_else(|| candidate.surgeon_id.clone());

            // 被让位占用退出后，落位不得违反房间/医生独占
            if !checker.is_available_excluding(
                &candidate.room_id,
                &surgeon_id,
                start,
                end,
                snapshot,
                &candidate.assignment_id,
            ) {
                debug!(
                    candidate_id = %candidate.assignment_id,
                    surgeon_id = %surgeon_id,
                    "让位选择: 候选腾出后仍有冲突，跳过"
                );
                continue;
            }

            debug!(
                candidate_id = %candidate.assignment_id,
                bumped_surgery = %candidate.surgery_id,
                room_id = %candidate.room_id,
                "让位选择: 候选通过验证"
            );

            let reason = format!(
                "{} 级急诊插台，原定 {} 开始的手术 {} 被让位",
                request.tier, candidate.start_at, candidate.surgery_id
            );

            return TacticResult::Placed(Placement {
                tactic: InsertionTactic::PriorityBump,
                room_id: candidate.room_id.clone(),
                surgeon_id,
                start_at: start,
                end_at: end,
                overtime_required: false,
                bumped: vec![candidate.clone()],
                conflicts: vec![ConflictRecord {
                    kind: ConflictKind::PriorityBump,
                    surgery_id: candidate.surgery_id.clone(),
                    reason,
                }],
                affected_surgeon_ids: vec![candidate.surgeon_id.clone()],
            });
        }

        TacticResult::skipped(REASON_NO_BUMP_CANDIDATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::EmergencyFlags;
    use crate::domain::types::{PriorityTier, UrgencyLevel};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 4)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
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

    fn request(tier: PriorityTier, duration_min: i64, allow_bumping: bool) -> EmergencyRequest {
        EmergencyRequest {
            patient_id: "P001".to_string(),
            surgery_type_id: "T001".to_string(),
            duration_min,
            arrival_at: at(10, 0),
            tier,
            required_surgeon_id: None,
            preferred_start: None,
            room_type_filter: None,
            flags: EmergencyFlags {
                allow_bumping,
                ..EmergencyFlags::default()
            },
            max_wait_override_min: None,
        }
    }

    fn snapshot(assignments: Vec<ScheduleAssignment>) -> DaySnapshot {
        DaySnapshot::new(NaiveDate::from_ymd_opt(2026, 8, 4).unwrap(), assignments)
    }

    #[test]
    fn test_disallowed_fails_fast() {
        let selector = BumpSelector::new();
        let snap = snapshot(vec![busy(
            "A1", "R1", "D1",
            UrgencyLevel::Low,
            at(10, 0),
            at(12, 0),
        )]);

        match selector.select(
            &request(PriorityTier::Immediate, 30, false),
            &snap,
            &AvailabilityChecker::new(),
            &SchedulingPolicy::default(),
        ) {
            TacticResult::Skipped { reason } => assert_eq!(reason, REASON_BUMP_DISALLOWED),
            TacticResult::Placed(_) => panic!("expected skip"),
        }
    }

    #[test]
    fn test_never_bumps_equal_or_higher_weight() {
        let selector = BumpSelector::new();
        // Urgent (0.8) 不能驱逐 High (0.8) 或 Emergency (1.0)
        let snap = snapshot(vec![
            busy("A1", "R1", "D1", UrgencyLevel::High, at(10, 0), at(12, 0)),
            busy("A2", "R2", "D2", UrgencyLevel::Emergency, at(10, 0), at(12, 0)),
        ]);

        match selector.select(
            &request(PriorityTier::Urgent, 30, true),
            &snap,
            &AvailabilityChecker::new(),
            &SchedulingPolicy::default(),
        ) {
            TacticResult::Skipped { reason } => assert_eq!(reason, REASON_NO_BUMP_CANDIDATE),
            TacticResult::Placed(_) => panic!("expected skip"),
        }
    }

    #[test]
    fn test_prefers_lowest_weight_then_shortest() {
        let selector = BumpSelector::new();
        let snap = snapshot(vec![
            busy("A1", "R1", "D1", UrgencyLevel::Medium, at(10, 0), at(12, 0)),
            busy("A2", "R2", "D2", UrgencyLevel::Low, at(10, 0), at(13, 0)),
            busy("A3", "R3", "D3", UrgencyLevel::Low, at(10, 0), at(11, 0)),
        ]);

        match selector.select(
            &request(PriorityTier::Immediate, 30, true),
            &snap,
            &AvailabilityChecker::new(),
            &SchedulingPolicy::default(),
        ) {
            TacticResult::Placed(p) => {
                // Low 权重低于 Medium，同为 Low 时窗口短者优先
                assert_eq!(p.bumped.len(), 1);
                assert_eq!(p.bumped[0].assignment_id, "A3");
                assert_eq!(p.room_id, "R3");
                assert_eq!(p.start_at, at(10, 0));
                assert_eq!(p.end_at, at(10, 30));
                assert_eq!(p.conflicts.len(), 1);
                assert_eq!(p.conflicts[0].kind, ConflictKind::PriorityBump);
                assert_eq!(p.affected_surgeon_ids, vec!["D3".to_string()]);
            }
            TacticResult::Skipped { reason } => panic!("unexpected skip: {}", reason),
        }
    }

    #[test]
    fn test_candidate_window_must_fit_duration() {
        let selector = BumpSelector::new();
        // 窗口 60 分钟，急诊需要 90 分钟
        let snap = snapshot(vec![busy(
            "A1", "R1", "D1",
            UrgencyLevel::Low,
            at(10, 0),
            at(11, 0),
        )]);

        match selector.select(
            &request(PriorityTier::Immediate, 90, true),
            &snap,
            &AvailabilityChecker::new(),
            &SchedulingPolicy::default(),
        ) {
            TacticResult::Skipped { reason } => assert_eq!(reason, REASON_NO_BUMP_CANDIDATE),
            TacticResult::Placed(_) => panic!("expected skip"),
        }
    }

    #[test]
    fn test_preferred_start_window_filter() {
        let selector = BumpSelector::new();
        let snap = snapshot(vec![
            busy("A1", "R1", "D1", UrgencyLevel::Low, at(14, 0), at(16, 0)),
        ]);

        // 期望 10:00 开始，候选 14:00 偏差 240 分钟 > 120 分钟容许窗
        let mut req = request(PriorityTier::Immediate, 30, true);
        req.preferred_start = Some(at(10, 0));

        match selector.select(
            &req,
            &snap,
            &AvailabilityChecker::new(),
            &SchedulingPolicy::default(),
        ) {
            TacticResult::Skipped { reason } => assert_eq!(reason, REASON_NO_BUMP_CANDIDATE),
            TacticResult::Placed(_) => panic!("expected skip"),
        }

        // 偏差在容许窗内则接受
        req.preferred_start = Some(at(13, 0));
        assert!(matches!(
            selector.select(
                &req,
                &snap,
                &AvailabilityChecker::new(),
                &SchedulingPolicy::default()
            ),
            TacticResult::Placed(_)
        ));
    }

    #[test]
    fn test_required_surgeon_conflict_rejects_candidate() {
        let selector = BumpSelector::new();
        // 指定主刀 D9 在 10:00-12:00 另有手术，候选腾出的 R1 落位会撞医生
        let snap = snapshot(vec![
            busy("A1", "R1", "D1", UrgencyLevel::Low, at(10, 0), at(12, 0)),
            busy("A2", "R2", "D9", UrgencyLevel::Emergency, at(10, 0), at(12, 0)),
        ]);

        let mut req = request(PriorityTier::Immediate, 60, true);
        req.required_surgeon_id = Some("D9".to_string());

        match selector.select(
            &req,
            &snap,
            &AvailabilityChecker::new(),
            &SchedulingPolicy::default(),
        ) {
            TacticResult::Skipped { reason } => assert_eq!(reason, REASON_NO_BUMP_CANDIDATE),
            TacticResult::Placed(_) => panic!("expected skip"),
        }
    }
}
