// ==========================================
// 手术室排程系统 - 引擎层
// ==========================================
// 职责: 实现插台业务规则引擎,不拼 SQL
// 红线: Engine 不拼 SQL, 所有策略放弃必须输出 reason
// ==========================================

pub mod applier;
pub mod availability;
pub mod bump;
pub mod events;
pub mod metrics;
pub mod orchestrator;
pub mod overtime;
pub mod slot_finder;

// 重导出核心引擎
pub use applier::InsertionApplier;
pub use availability::{intervals_conflict, AvailabilityChecker};
pub use bump::BumpSelector;
pub use events::{
    NoOpEventPublisher, OptionalEventPublisher, ScheduleEvent, ScheduleEventPublisher,
    ScheduleEventType,
};
pub use metrics::MetricsCalculator;
pub use orchestrator::{EmergencyOrchestrator, REASON_EXHAUSTED};
pub use overtime::OvertimeSlotFinder;
pub use slot_finder::SlotFinder;
