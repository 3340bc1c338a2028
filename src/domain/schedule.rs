// ==========================================
// 手术室排程系统 - 当日排班快照
// ==========================================
// 红线: 快照是一次插台决策的只读输入，引擎不回写快照
// ==========================================

use crate::domain::types::UrgencyLevel;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// ScheduleAssignment - 排班占用（读模型）
// ==========================================
// 语义: 一条占用同时独占一间手术室和一名主刀医生
// 区间: 半开区间 [start_at, end_at)，首尾相接不算冲突
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleAssignment {
    pub assignment_id: String,     // 占用ID
    pub surgery_id: String,        // 关联手术
    pub room_id: String,           // 手术室
    pub surgeon_id: String,        // 主刀医生（来自 surgery 表联查）
    pub start_at: NaiveDateTime,   // 开始时间
    pub end_at: NaiveDateTime,     // 结束时间
    pub urgency: UrgencyLevel,     // 手术紧急度快照（让位排序用）
}

impl ScheduleAssignment {
    /// 占用窗口长度（分钟）
    pub fn window_minutes(&self) -> i64 {
        (self.end_at - self.start_at).num_minutes()
    }
}

// ==========================================
// DaySnapshot - 单日排班快照
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySnapshot {
    pub date: NaiveDate,                      // 快照日期
    pub assignments: Vec<ScheduleAssignment>, // 当日全部占用
}

impl DaySnapshot {
    pub fn new(date: NaiveDate, assignments: Vec<ScheduleAssignment>) -> Self {
        Self { date, assignments }
    }

    /// 当日最晚结束时间（空快照返回 None）
    pub fn latest_end(&self) -> Option<NaiveDateTime> {
        self.assignments.iter().map(|a| a.end_at).max()
    }

    /// 指定房间的占用
    pub fn for_room<'a>(&'a self, room_id: &str) -> impl Iterator<Item = &'a ScheduleAssignment> {
        let room_id = room_id.to_string();
        self.assignments.iter().filter(move |a| a.room_id == room_id)
    }

    /// 指定医生的占用
    pub fn for_surgeon<'a>(
        &'a self,
        surgeon_id: &str,
    ) -> impl Iterator<Item = &'a ScheduleAssignment> {
        let surgeon_id = surgeon_id.to_string();
        self.assignments
            .iter()
            .filter(move |a| a.surgeon_id == surgeon_id)
    }
}
