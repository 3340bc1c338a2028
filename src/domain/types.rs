// ==========================================
// 手术室排程系统 - 领域类型定义
// ==========================================
// 红线: 优先级与权重只在本文件定义，禁止散落的权重表
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 急诊优先级分级 (Priority Tier)
// ==========================================
// 红线: 分级制，权重与等待时限是分级的固定属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityTier {
    Immediate, // 立即手术
    Urgent,    // 紧急
    SemiUrgent, // 亚紧急
    Scheduled, // 常规（默认）
}

impl PriorityTier {
    /// 分级权重（用于与存量手术的紧急度权重比较）
    pub fn weight(&self) -> f64 {
        match self {
            PriorityTier::Immediate => 1.0,
            PriorityTier::Urgent => 0.8,
            PriorityTier::SemiUrgent => 0.6,
            PriorityTier::Scheduled => 0.4,
        }
    }

    /// 分级等待时限（分钟）
    pub fn max_wait_minutes(&self) -> i64 {
        match self {
            PriorityTier::Immediate => 15,
            PriorityTier::Urgent => 60,
            PriorityTier::SemiUrgent => 240,
            PriorityTier::Scheduled => 1440,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PriorityTier::Immediate => "IMMEDIATE",
            PriorityTier::Urgent => "URGENT",
            PriorityTier::SemiUrgent => "SEMI_URGENT",
            PriorityTier::Scheduled => "SCHEDULED",
        }
    }

    /// 从字符串解析（未知值回退到常规级）
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "IMMEDIATE" => PriorityTier::Immediate,
            "URGENT" => PriorityTier::Urgent,
            "SEMI_URGENT" => PriorityTier::SemiUrgent,
            _ => PriorityTier::Scheduled,
        }
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 存量手术紧急度 (Urgency Level)
// ==========================================
// 用途: 仅用于让位候选排序，与请求方分级权重相互独立
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UrgencyLevel {
    Emergency, // 急诊
    High,      // 高
    Medium,    // 中
    Low,       // 低
}

impl UrgencyLevel {
    /// 紧急度权重
    pub fn weight(&self) -> f64 {
        match self {
            UrgencyLevel::Emergency => 1.0,
            UrgencyLevel::High => 0.8,
            UrgencyLevel::Medium => 0.5,
            UrgencyLevel::Low => 0.3,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Emergency => "EMERGENCY",
            UrgencyLevel::High => "HIGH",
            UrgencyLevel::Medium => "MEDIUM",
            UrgencyLevel::Low => "LOW",
        }
    }

    /// 从字符串解析（未知值按中等处理）
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "EMERGENCY" => UrgencyLevel::Emergency,
            "HIGH" => UrgencyLevel::High,
            "LOW" => UrgencyLevel::Low,
            _ => UrgencyLevel::Medium,
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 手术状态 (Surgery Status)
// ==========================================
// 红线: 让位只改状态与落位字段，不删手术记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SurgeryStatus {
    AwaitingReschedule, // 待排/待重排
    Scheduled,          // 已排
    Completed,          // 已完成
    Cancelled,          // 已取消
}

impl SurgeryStatus {
    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SurgeryStatus::AwaitingReschedule => "AWAITING_RESCHEDULE",
            SurgeryStatus::Scheduled => "SCHEDULED",
            SurgeryStatus::Completed => "COMPLETED",
            SurgeryStatus::Cancelled => "CANCELLED",
        }
    }

    /// 从字符串解析
    pub fn from_db_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "SCHEDULED" => SurgeryStatus::Scheduled,
            "COMPLETED" => SurgeryStatus::Completed,
            "CANCELLED" => SurgeryStatus::Cancelled,
            _ => SurgeryStatus::AwaitingReschedule,
        }
    }
}

impl fmt::Display for SurgeryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 插台策略 (Insertion Tactic)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsertionTactic {
    BackupRoom,   // 空闲房间插台
    PriorityBump, // 低优先级让位
    Overtime,     // 延时插台
    ManualReview, // 人工协调
}

impl InsertionTactic {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &'static str {
        match self {
            InsertionTactic::BackupRoom => "BACKUP_ROOM",
            InsertionTactic::PriorityBump => "PRIORITY_BUMP",
            InsertionTactic::Overtime => "OVERTIME",
            InsertionTactic::ManualReview => "MANUAL_REVIEW",
        }
    }
}

impl fmt::Display for InsertionTactic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 冲突类型 (Conflict Kind)
// ==========================================
// 用途: 插台结果中的冲突记录标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    PriorityBump, // 低优先级手术被让位
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::PriorityBump => "PRIORITY_BUMP",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 通知渠道 / 通知优先级
// ==========================================
// 说明: 通知优先级只影响投递顺序，不影响成败
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotifyChannel {
    System, // 站内
    Email,  // 邮件
    Sms,    // 短信
}

impl fmt::Display for NotifyChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyChannel::System => write!(f, "SYSTEM"),
            NotifyChannel::Email => write!(f, "EMAIL"),
            NotifyChannel::Sms => write!(f, "SMS"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotifyPriority {
    Urgent, // 紧急
    High,   // 高
    Medium, // 中
    Low,    // 低
}

impl NotifyPriority {
    /// 投递排序用的序号（越小越先投递）
    pub fn rank(&self) -> u8 {
        match self {
            NotifyPriority::Urgent => 0,
            NotifyPriority::High => 1,
            NotifyPriority::Medium => 2,
            NotifyPriority::Low => 3,
        }
    }
}

impl fmt::Display for NotifyPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyPriority::Urgent => write!(f, "URGENT"),
            NotifyPriority::High => write!(f, "HIGH"),
            NotifyPriority::Medium => write!(f, "MEDIUM"),
            NotifyPriority::Low => write!(f, "LOW"),
        }
    }
}
