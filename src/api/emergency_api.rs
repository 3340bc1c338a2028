// ==========================================
// 手术室排程系统 - 急诊插台 API
// ==========================================
// 职责: 急诊插台全流程编排（校验 → 决策 → 提交 → 指标 → 通知）
// 红线: 校验失败先于任何排班读写；策略穷尽是业务结果不是异常；
//       通知/事件失败只记日志，从不回滚已提交的排班决定
// 并发: 快照读取 → 决策 → 提交 在进程内串行化
//       （跨进程串行化由调用方的独占事务保证）
// ==========================================

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::RequestValidator;
use crate::config::ConfigManager;
use crate::domain::outcome::{InsertionDecision, InsertionOutcome, Placement};
use crate::domain::request::EmergencyRequest;
use crate::domain::types::{NotifyChannel, NotifyPriority, PriorityTier};
use crate::engine::applier::InsertionApplier;
use crate::engine::events::{
    OptionalEventPublisher, ScheduleEvent, ScheduleEventPublisher, ScheduleEventType,
};
use crate::engine::metrics::MetricsCalculator;
use crate::engine::orchestrator::{EmergencyOrchestrator, REASON_EXHAUSTED};
use crate::i18n::{t, t_with_args};
use crate::notify::{Notification, NotificationDispatcher};
use crate::repository::patient_repo::PatientRepository;
use crate::repository::room_repo::OperatingRoomRepository;
use crate::repository::schedule_repo::ScheduleRepository;
use crate::repository::staff_repo::SurgeonRepository;
use crate::repository::surgery_repo::SurgeryRepository;
use tracing::{error, info, warn};

// ==========================================
// EmergencyApi - 急诊插台 API
// ==========================================

/// 急诊插台API
///
/// 职责：
/// 1. 插台请求校验（快速失败）
/// 2. 急诊手术登记（失败时记录保留为未排状态）
/// 3. 插台决策与原子提交
/// 4. 等待时间 / 扰动评分派生
/// 5. 提交后通知与事件分发（尽力而为）
pub struct EmergencyApi {
    surgeon_repo: Arc<SurgeonRepository>,
    room_repo: Arc<OperatingRoomRepository>,
    surgery_repo: Arc<SurgeryRepository>,
    schedule_repo: Arc<ScheduleRepository>,
    config_manager: Arc<ConfigManager>,
    validator: RequestValidator,
    applier: InsertionApplier,
    metrics: MetricsCalculator,
    // 通知分发器（组合根显式注入，不做进程级单例）
    dispatcher: Option<Arc<NotificationDispatcher>>,
    // 事件发布器（依赖倒置: 通过 trait 通知上层排程服务）
    event_publisher: OptionalEventPublisher,
    // 进程内插台串行化: 守住 快照读取 → 决策 → 提交 临界区
    insertion_guard: Mutex<()>,
}

impl EmergencyApi {
    /// 创建新的EmergencyApi实例
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        patient_repo: Arc<PatientRepository>,
        surgeon_repo: Arc<SurgeonRepository>,
        room_repo: Arc<OperatingRoomRepository>,
        surgery_repo: Arc<SurgeryRepository>,
        schedule_repo: Arc<ScheduleRepository>,
        config_manager: Arc<ConfigManager>,
        dispatcher: Option<Arc<NotificationDispatcher>>,
        event_publisher: Option<Arc<dyn ScheduleEventPublisher>>,
    ) -> Self {
        let event_publisher = match event_publisher {
            Some(p) => OptionalEventPublisher::with_publisher(p),
            None => OptionalEventPublisher::none(),
        };

        let validator = RequestValidator::new(
            patient_repo,
            surgery_repo.clone(),
            surgeon_repo.clone(),
        );
        let applier = InsertionApplier::new(schedule_repo.clone());

        Self {
            surgeon_repo,
            room_repo,
            surgery_repo,
            schedule_repo,
            config_manager,
            validator,
            applier,
            metrics: MetricsCalculator::new(),
            dispatcher,
            event_publisher,
            insertion_guard: Mutex::new(()),
        }
    }

    /// 处理一次急诊插台请求
    ///
    /// # 返回
    /// - `Ok(InsertionOutcome)`: 插台结果（含策略穷尽的失败结果）
    /// - `Err(ApiError)`: 校验失败或持久化失败
    pub fn handle_emergency(&self, request: &EmergencyRequest) -> ApiResult<InsertionOutcome> {
        let started = Instant::now();

        let policy = self
            .config_manager
            .load_policy()
            .map_err(|e| ApiError::InternalError(format!("加载排程策略失败: {}", e)))?;

        // ===== Step 1: 快速失败校验（先于任何排班读写）=====
        self.validator.validate(request, &policy)?;

        // ===== Step 2: 登记急诊手术（未排状态，失败时记录保留）=====
        let surgery = self.surgery_repo.register_emergency(request)?;
        info!(
            surgery_id = %surgery.surgery_id,
            patient_id = %request.patient_id,
            tier = %request.tier,
            "急诊手术已登记"
        );

        let orchestrator = EmergencyOrchestrator::new(policy);

        // ===== Step 3: 快照读取 → 决策 → 提交（进程内临界区）=====
        let placement = {
            let _guard = self
                .insertion_guard
                .lock()
                .map_err(|e| ApiError::InternalError(format!("插台锁获取失败: {}", e)))?;

            let snapshot = self
                .schedule_repo
                .find_day_snapshot(request.arrival_at.date())?;

            let rooms = self
                .room_repo
                .find_active_pool(request.room_type_filter.as_deref())?;

            // 指定主刀时候选池只含该医生，否则取全部在岗医生
            let surgeons = match &request.required_surgeon_id {
                Some(surgeon_id) => match self.surgeon_repo.find_by_id(surgeon_id)? {
                    Some(surgeon) => vec![surgeon],
                    None => return Err(ApiError::SurgeonNotFound(surgeon_id.clone())),
                },
                None => self.surgeon_repo.find_active_pool()?,
            };

            match orchestrator.resolve(request, &snapshot, &rooms, &surgeons) {
                InsertionDecision::Placed(placement) => {
                    // 原子提交: 新占用 + 全部让位清位，要么全部生效要么全部回滚
                    self.applier.apply(&surgery.surgery_id, &placement)?;
                    placement
                }
                InsertionDecision::Exhausted {
                    attempts,
                    needs_manual_review,
                } => {
                    info!(
                        surgery_id = %surgery.surgery_id,
                        attempts = attempts.len(),
                        "插台策略穷尽"
                    );
                    for attempt in &attempts {
                        info!(tactic = %attempt.tactic, reason = %attempt.reason, "策略放弃");
                    }
                    let mut outcome = InsertionOutcome::failed(
                        &surgery.surgery_id,
                        REASON_EXHAUSTED,
                        needs_manual_review,
                    );
                    outcome.elapsed_ms = started.elapsed().as_millis() as u64;

                    // 提交后副作用（此处无提交，仅通知失败事件）
                    self.publish_event(
                        &surgery.surgery_id,
                        ScheduleEventType::InsertionFailed,
                        request,
                    );
                    return Ok(outcome);
                }
            }
        };

        // 临界区外执行提交后副作用
        let mut outcome = self.build_success_outcome(&surgery.surgery_id, request, &placement);

        // ===== Step 4: 提交后通知与事件（尽力而为，失败不回滚）=====
        outcome.notified_recipients = self.dispatch_notifications(request, &outcome, &placement);
        self.publish_event(
            &surgery.surgery_id,
            ScheduleEventType::EmergencyInserted,
            request,
        );
        for bumped in &placement.bumped {
            self.publish_event(&bumped.surgery_id, ScheduleEventType::SurgeryBumped, request);
        }

        outcome.elapsed_ms = started.elapsed().as_millis() as u64;
        Ok(outcome)
    }

    /// 组装成功结果并派生指标
    fn build_success_outcome(
        &self,
        surgery_id: &str,
        request: &EmergencyRequest,
        placement: &Placement,
    ) -> InsertionOutcome {
        let wait_minutes = self
            .metrics
            .wait_minutes(request.arrival_at, placement.start_at);
        let disruption_score = self.metrics.disruption_score(
            placement.bumped.len(),
            placement.overtime_required,
            placement.conflicts.len(),
        );

        InsertionOutcome {
            success: true,
            surgery_id: surgery_id.to_string(),
            room_id: Some(placement.room_id.clone()),
            surgeon_id: Some(placement.surgeon_id.clone()),
            scheduled_start: Some(placement.start_at),
            scheduled_end: Some(placement.end_at),
            tactic: Some(placement.tactic),
            overtime_required: placement.overtime_required,
            bumped_surgery_ids: placement.bumped.iter().map(|b| b.surgery_id.clone()).collect(),
            conflicts: placement.conflicts.clone(),
            failure_reason: None,
            needs_manual_review: false,
            wait_minutes: Some(wait_minutes),
            disruption_score,
            affected_surgeon_ids: placement.affected_surgeon_ids.clone(),
            notified_recipients: Vec::new(),
            elapsed_ms: 0,
        }
    }

    /// 提交后通知分发（尽力而为）
    ///
    /// # 返回
    /// 通知对象标识集合（审计用，与投递成败无关）
    fn dispatch_notifications(
        &self,
        request: &EmergencyRequest,
        outcome: &InsertionOutcome,
        placement: &Placement,
    ) -> Vec<String> {
        let mut recipients = Vec::new();

        // 主刀医生: 急诊排台通知
        recipients.push(placement.surgeon_id.clone());
        self.enqueue_notification(Notification::new(
            placement.surgeon_id.clone(),
            t("notify.assigned.subject"),
            t_with_args(
                "notify.assigned.body",
                &[
                    ("surgery_id", outcome.surgery_id.as_str()),
                    ("room_id", placement.room_id.as_str()),
                    ("start_at", &placement.start_at.to_string()),
                ],
            ),
            NotifyChannel::System,
            notify_priority_for(request.tier),
            serde_json::json!({
                "surgery_id": outcome.surgery_id,
                "tactic": placement.tactic.as_str(),
            }),
        ));

        // 被让位手术的主刀: 让位通知
        for bumped in &placement.bumped {
            if bumped.surgeon_id.is_empty() {
                continue;
            }
            recipients.push(bumped.surgeon_id.clone());
            self.enqueue_notification(Notification::new(
                bumped.surgeon_id.clone(),
                t("notify.bumped.subject"),
                t_with_args(
                    "notify.bumped.body",
                    &[("surgery_id", bumped.surgery_id.as_str())],
                ),
                NotifyChannel::System,
                NotifyPriority::High,
                serde_json::json!({
                    "surgery_id": bumped.surgery_id,
                    "bumped_by": outcome.surgery_id,
                }),
            ));
        }

        recipients.sort();
        recipients.dedup();
        recipients
    }

    fn enqueue_notification(&self, notification: Notification) {
        if let Some(dispatcher) = &self.dispatcher {
            if !dispatcher.enqueue(notification) {
                warn!("通知入队失败，已丢弃（不影响排班结果）");
            }
        }
    }

    fn publish_event(
        &self,
        surgery_id: &str,
        event_type: ScheduleEventType,
        request: &EmergencyRequest,
    ) {
        let event = ScheduleEvent::new(
            surgery_id.to_string(),
            event_type,
            Some("EmergencyApi".to_string()),
            request.arrival_at.date(),
        );
        if let Err(e) = self.event_publisher.publish(event) {
            error!(surgery_id, error = %e, "排班事件发布失败（不回滚排班决定）");
        }
    }
}

/// 请求分级到通知优先级的映射
fn notify_priority_for(tier: PriorityTier) -> NotifyPriority {
    match tier {
        PriorityTier::Immediate => NotifyPriority::Urgent,
        PriorityTier::Urgent => NotifyPriority::High,
        PriorityTier::SemiUrgent => NotifyPriority::Medium,
        PriorityTier::Scheduled => NotifyPriority::Low,
    }
}
