// ==========================================
// 手术室排程系统 - 配置键全集
// ==========================================
// 红线: 配置键只在本文件定义，禁止散落的字符串字面量
// ==========================================

/// 正常工作日结束时间 (HH:MM)
pub const SCHEDULE_DAY_END_TIME: &str = "schedule.day_end_time";

/// 延时插台准备缓冲（分钟）
pub const SCHEDULE_OVERTIME_BUFFER_MINUTES: &str = "schedule.overtime_buffer_minutes";

/// 延时插台硬截止时间 (HH:MM)
pub const SCHEDULE_OVERTIME_CUTOFF_TIME: &str = "schedule.overtime_cutoff_time";

/// 让位候选与期望开始时间的容许偏差（分钟）
pub const SCHEDULE_BUMP_WINDOW_MINUTES: &str = "schedule.bump_window_minutes";

/// 等待时限覆盖超过分级时限时是否拒绝（默认只告警）
pub const SLA_STRICT_OVERRIDE_CHECK: &str = "sla.strict_override_check";

/// 通知队列容量
pub const NOTIFY_QUEUE_CAPACITY: &str = "notify.queue_capacity";
