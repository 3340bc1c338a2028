// ==========================================
// 手术室排程系统 - 手术领域模型
// ==========================================
// 对齐: db.rs ensure_schema 中的主数据与 surgery 表
// ==========================================

use crate::domain::types::{SurgeryStatus, UrgencyLevel};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Patient - 患者主数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: String,               // 患者ID
    pub name: String,                     // 姓名
    pub medical_record_no: Option<String>, // 病案号
    pub created_at: DateTime<Utc>,        // 记录创建时间
}

// ==========================================
// Surgeon - 外科医生主数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surgeon {
    pub surgeon_id: String,       // 医生ID
    pub name: String,             // 姓名
    pub specialty: Option<String>, // 专科
    pub active: bool,             // 是否在岗可排
}

// ==========================================
// OperatingRoom - 手术室主数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingRoom {
    pub room_id: String,   // 房间ID
    pub name: String,      // 房间名称
    pub room_type: String, // 房间类型 (GENERAL/CARDIAC/NEURO/...)
    pub is_backup: bool,   // 是否备用房间
    pub active: bool,      // 是否可用
}

// ==========================================
// SurgeryType - 手术类型主数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurgeryType {
    pub type_id: String,              // 类型ID
    pub name: String,                 // 类型名称
    pub default_duration_min: i64,    // 默认时长（分钟）
}

// ==========================================
// Surgery - 手术记录
// ==========================================
// 红线: 让位只清空落位字段并回退状态，不删行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surgery {
    // ===== 主键与关联 =====
    pub surgery_id: String,         // 手术ID
    pub patient_id: String,         // 关联患者
    pub surgery_type_id: String,    // 关联手术类型

    // ===== 落位字段（让位时清空）=====
    pub surgeon_id: Option<String>,            // 主刀医生
    pub room_id: Option<String>,               // 手术室
    pub scheduled_start: Option<NaiveDateTime>, // 计划开始
    pub scheduled_end: Option<NaiveDateTime>,   // 计划结束

    // ===== 业务属性 =====
    pub duration_min: i64,        // 预计时长（分钟）
    pub urgency: UrgencyLevel,    // 紧急度（让位候选排序依据）
    pub status: SurgeryStatus,    // 状态

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>, // 记录创建时间
    pub updated_at: DateTime<Utc>, // 记录更新时间
}

impl Surgery {
    /// 判断是否已有完整落位（房间+医生+时间）
    pub fn is_placed(&self) -> bool {
        self.room_id.is_some()
            && self.surgeon_id.is_some()
            && self.scheduled_start.is_some()
            && self.scheduled_end.is_some()
    }
}
