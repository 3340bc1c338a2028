// ==========================================
// 手术室排程系统 - 领域层
// ==========================================
// 职责: 实体与类型定义，不依赖仓储/引擎
// ==========================================

pub mod outcome;
pub mod request;
pub mod schedule;
pub mod surgery;
pub mod types;

pub use outcome::{
    ConflictRecord, InsertionDecision, InsertionOutcome, Placement, TacticAttempt, TacticResult,
};
pub use request::{EmergencyFlags, EmergencyRequest};
pub use schedule::{DaySnapshot, ScheduleAssignment};
pub use surgery::{OperatingRoom, Patient, Surgeon, Surgery, SurgeryType};
pub use types::{
    ConflictKind, InsertionTactic, NotifyChannel, NotifyPriority, PriorityTier, SurgeryStatus,
    UrgencyLevel,
};
