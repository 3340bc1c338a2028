// ==========================================
// 手术室排程系统 - 插台结果模型
// ==========================================
// 红线: 策略间传递用带标签的结果类型，禁止松散的 map
// 红线: 策略穷尽是业务结果不是异常，原因必须可解释
// ==========================================

use crate::domain::schedule::ScheduleAssignment;
use crate::domain::types::{ConflictKind, InsertionTactic};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ConflictRecord - 冲突记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub kind: ConflictKind,  // 冲突类型
    pub surgery_id: String,  // 原手术
    pub reason: String,      // 可读原因
}

// ==========================================
// Placement - 策略成功载荷
// ==========================================
// 描述一次尚未提交的落位决定
#[derive(Debug, Clone)]
pub struct Placement {
    pub tactic: InsertionTactic,              // 胜出策略
    pub room_id: String,                      // 选定房间
    pub surgeon_id: String,                   // 选定医生
    pub start_at: NaiveDateTime,              // 开始时间
    pub end_at: NaiveDateTime,                // 结束时间
    pub overtime_required: bool,              // 是否延时
    pub bumped: Vec<ScheduleAssignment>,      // 被让位的占用（提交时清位）
    pub conflicts: Vec<ConflictRecord>,       // 冲突记录
    pub affected_surgeon_ids: Vec<String>,    // 受影响医生
}

// ==========================================
// TacticResult - 单策略结果（带标签变体）
// ==========================================
#[derive(Debug, Clone)]
pub enum TacticResult {
    /// 策略给出可行落位
    Placed(Placement),
    /// 策略放弃，附可读原因
    Skipped { reason: String },
}

impl TacticResult {
    pub fn skipped(reason: impl Into<String>) -> Self {
        TacticResult::Skipped {
            reason: reason.into(),
        }
    }
}

// ==========================================
// TacticAttempt - 一次策略尝试的记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TacticAttempt {
    pub tactic: InsertionTactic, // 尝试的策略
    pub reason: String,          // 放弃原因
}

// ==========================================
// InsertionDecision - 编排器输出
// ==========================================
#[derive(Debug, Clone)]
pub enum InsertionDecision {
    /// 某一策略胜出
    Placed(Placement),
    /// 全部策略失败
    Exhausted {
        attempts: Vec<TacticAttempt>,
        needs_manual_review: bool,
    },
}

// ==========================================
// InsertionOutcome - 对外插台结果
// ==========================================
// 失败时仍携带急诊手术自身ID（手术记录保持未排状态），
// 以便调用方放宽开关后重试或转人工协调
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertionOutcome {
    pub success: bool,                         // 是否成功
    pub surgery_id: String,                    // 急诊手术ID（恒有）
    pub room_id: Option<String>,               // 落位房间
    pub surgeon_id: Option<String>,            // 落位医生
    pub scheduled_start: Option<NaiveDateTime>, // 落位开始
    pub scheduled_end: Option<NaiveDateTime>,   // 落位结束
    pub tactic: Option<InsertionTactic>,       // 胜出策略
    pub overtime_required: bool,               // 是否延时
    pub bumped_surgery_ids: Vec<String>,       // 被让位手术
    pub conflicts: Vec<ConflictRecord>,        // 冲突记录
    pub failure_reason: Option<String>,        // 失败原因
    pub needs_manual_review: bool,             // 是否需人工协调
    pub wait_minutes: Option<i64>,             // 等待时间（仅成功时有意义）
    pub disruption_score: f64,                 // 扰动评分 [0,1]
    pub affected_surgeon_ids: Vec<String>,     // 受影响医生
    pub notified_recipients: Vec<String>,      // 已通知对象（审计用）
    pub elapsed_ms: u64,                       // 处理耗时（毫秒）
}

impl InsertionOutcome {
    /// 构造失败结果骨架
    pub fn failed(surgery_id: &str, reason: &str, needs_manual_review: bool) -> Self {
        Self {
            success: false,
            surgery_id: surgery_id.to_string(),
            room_id: None,
            surgeon_id: None,
            scheduled_start: None,
            scheduled_end: None,
            tactic: None,
            overtime_required: false,
            bumped_surgery_ids: Vec::new(),
            conflicts: Vec::new(),
            failure_reason: Some(reason.to_string()),
            needs_manual_review,
            wait_minutes: None,
            disruption_score: 0.0,
            affected_surgeon_ids: Vec::new(),
            notified_recipients: Vec::new(),
            elapsed_ms: 0,
        }
    }
}
