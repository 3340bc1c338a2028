// ==========================================
// 手术室排程系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 急诊插台与冲突消解决策引擎
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 插台业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 通知分发层 - 提交后副作用
pub mod notify;

// 数据库基础设施（连接初始化/PRAGMA/建表统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ConflictKind, InsertionTactic, NotifyChannel, NotifyPriority, PriorityTier, SurgeryStatus,
    UrgencyLevel,
};

// 领域实体
pub use domain::{
    ConflictRecord, DaySnapshot, EmergencyFlags, EmergencyRequest, InsertionOutcome,
    OperatingRoom, Patient, ScheduleAssignment, Surgeon, Surgery, SurgeryType,
};

// 引擎
pub use engine::{
    AvailabilityChecker, BumpSelector, EmergencyOrchestrator, InsertionApplier, MetricsCalculator,
    OvertimeSlotFinder, SlotFinder,
};

// API
pub use api::EmergencyApi;

// 配置
pub use config::{ConfigManager, SchedulingPolicy};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "手术室排程系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

// ==========================================
// 预编译检查
// ==========================================

// 确保编译时所有模块可见
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
