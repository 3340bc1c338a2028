// ==========================================
// 手术室排程系统 - 可用性判定引擎
// ==========================================
// 职责: 判定 (房间, 医生, 时间段) 三元组在快照下是否空闲
// 红线: 房间独占与医生独占是两条独立检查，必须同时通过
// 区间语义: 半开区间 [start, end)，首尾相接不算冲突
// ==========================================

use crate::domain::schedule::{DaySnapshot, ScheduleAssignment};
use chrono::NaiveDateTime;

/// 半开区间冲突判定
///
/// [s1,e1) 与 [s2,e2) 冲突当且仅当 s1 < e2 且 s2 < e1
pub fn intervals_conflict(
    s1: NaiveDateTime,
    e1: NaiveDateTime,
    s2: NaiveDateTime,
    e2: NaiveDateTime,
) -> bool {
    s1 < e2 && s2 < e1
}

// ==========================================
// AvailabilityChecker - 可用性判定引擎
// ==========================================
pub struct AvailabilityChecker {
    // 无状态引擎,不需要注入依赖
}

impl Default for AvailabilityChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl AvailabilityChecker {
    pub fn new() -> Self {
        Self {}
    }

    /// 判定时间段内房间与医生是否同时空闲
    pub fn is_available(
        &self,
        room_id: &str,
        surgeon_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        snapshot: &DaySnapshot,
    ) -> bool {
        self.room_conflicts(room_id, start, end, snapshot).is_empty()
            && self
                .surgeon_conflicts(surgeon_id, start, end, snapshot)
                .is_empty()
    }

    /// 同上，但忽略指定占用（让位验证时排除被让位的占用）
    pub fn is_available_excluding(
        &self,
        room_id: &str,
        surgeon_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        snapshot: &DaySnapshot,
        exclude_assignment_id: &str,
    ) -> bool {
        let conflicts = |a: &&ScheduleAssignment| {
            a.assignment_id != exclude_assignment_id
                && intervals_conflict(start, end, a.start_at, a.end_at)
        };

        !snapshot
            .assignments
            .iter()
            .filter(|a| a.room_id == room_id)
            .any(|a| conflicts(&a))
            && !snapshot
                .assignments
                .iter()
                .filter(|a| a.surgeon_id == surgeon_id)
                .any(|a| conflicts(&a))
    }

    /// 时间段内与指定房间冲突的占用
    pub fn room_conflicts<'a>(
        &self,
        room_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        snapshot: &'a DaySnapshot,
    ) -> Vec<&'a ScheduleAssignment> {
        snapshot
            .assignments
            .iter()
            .filter(|a| a.room_id == room_id && intervals_conflict(start, end, a.start_at, a.end_at))
            .collect()
    }

    /// 时间段内与指定医生冲突的占用
    pub fn surgeon_conflicts<'a>(
        &self,
        surgeon_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        snapshot: &'a DaySnapshot,
    ) -> Vec<&'a ScheduleAssignment> {
        snapshot
            .assignments
            .iter()
            .filter(|a| {
                a.surgeon_id == surgeon_id && intervals_conflict(start, end, a.start_at, a.end_at)
            })
            .collect()
    }
}
