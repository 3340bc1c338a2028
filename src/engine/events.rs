// ==========================================
// 手术室排程系统 - 引擎层事件发布
// ==========================================
// 职责: 定义排班事件发布 trait，实现依赖倒置
// 说明: Engine 层定义 trait，上层排程服务实现适配器
//       （如触发基线优化器对被让位手术的重排）
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 排班事件类型
// ==========================================

/// 排班事件触发类型
///
/// Engine 层定义的事件类型，用于通知下游系统
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleEventType {
    /// 急诊插台成功
    EmergencyInserted,
    /// 手术被让位，退回待重排队列
    SurgeryBumped,
    /// 插台失败（策略穷尽）
    InsertionFailed,
}

impl ScheduleEventType {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            ScheduleEventType::EmergencyInserted => "EmergencyInserted",
            ScheduleEventType::SurgeryBumped => "SurgeryBumped",
            ScheduleEventType::InsertionFailed => "InsertionFailed",
        }
    }
}

/// 排班事件
///
/// Engine 层发布的事件，包含关联手术、事件类型和影响日期
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEvent {
    /// 关联手术 ID
    pub surgery_id: String,
    /// 事件类型
    pub event_type: ScheduleEventType,
    /// 事件来源描述
    pub source: Option<String>,
    /// 受影响的排班日期
    pub affected_date: NaiveDate,
}

impl ScheduleEvent {
    pub fn new(
        surgery_id: String,
        event_type: ScheduleEventType,
        source: Option<String>,
        affected_date: NaiveDate,
    ) -> Self {
        Self {
            surgery_id,
            event_type,
            source,
            affected_date,
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 排班事件发布者 Trait
///
/// Engine 层定义，上层排程服务实现
/// 通过 trait 实现依赖倒置，插台引擎不直接依赖优化器
pub trait ScheduleEventPublisher: Send + Sync {
    /// 发布排班事件
    ///
    /// # 返回
    /// - `Ok(())`: 发布成功
    /// - `Err`: 发布失败（调用方只记日志，不回滚排班决定）
    fn publish(&self, event: ScheduleEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
///
/// 用于不需要事件发布的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl ScheduleEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: ScheduleEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - surgery_id={}, event_type={}",
            event.surgery_id,
            event.event_type.as_str()
        );
        Ok(())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn ScheduleEventPublisher>> 的使用
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn ScheduleEventPublisher>>,
}

impl OptionalEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn ScheduleEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布事件）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）
    pub fn publish(&self, event: ScheduleEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(publisher) => publisher.publish(event),
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过事件 - surgery_id={}, event_type={}",
                    event.surgery_id,
                    event.event_type.as_str()
                );
                Ok(())
            }
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}
