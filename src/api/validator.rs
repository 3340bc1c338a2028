// ==========================================
// 手术室排程系统 - 插台请求校验器
// ==========================================
// 职责: 插台前快速失败校验
// 红线: 校验在任何排班读写之前完成；未知患者/手术类型/指定主刀
//       各自返回可区分的校验错误
// 策略: 等待时限覆盖超过分级时限默认只告警，严格模式下拒绝
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::SchedulingPolicy;
use crate::domain::request::EmergencyRequest;
use crate::repository::patient_repo::PatientRepository;
use crate::repository::staff_repo::SurgeonRepository;
use crate::repository::surgery_repo::SurgeryRepository;
use std::sync::Arc;
use tracing::warn;

// ==========================================
// RequestValidator - 插台请求校验器
// ==========================================
pub struct RequestValidator {
    patient_repo: Arc<PatientRepository>,
    surgery_repo: Arc<SurgeryRepository>,
    surgeon_repo: Arc<SurgeonRepository>,
}

impl RequestValidator {
    pub fn new(
        patient_repo: Arc<PatientRepository>,
        surgery_repo: Arc<SurgeryRepository>,
        surgeon_repo: Arc<SurgeonRepository>,
    ) -> Self {
        Self {
            patient_repo,
            surgery_repo,
            surgeon_repo,
        }
    }

    /// 校验插台请求
    ///
    /// 检查顺序:
    /// 1. 时长必须为正
    /// 2. 患者存在
    /// 3. 手术类型存在
    /// 4. 指定主刀（如有）存在
    /// 5. 等待时限覆盖策略检查
    pub fn validate(
        &self,
        request: &EmergencyRequest,
        policy: &SchedulingPolicy,
    ) -> ApiResult<()> {
        if request.duration_min <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "手术时长必须为正: duration_min={}",
                request.duration_min
            )));
        }

        if !self.patient_repo.exists(&request.patient_id)? {
            return Err(ApiError::PatientNotFound(request.patient_id.clone()));
        }

        if self
            .surgery_repo
            .find_type_by_id(&request.surgery_type_id)?
            .is_none()
        {
            return Err(ApiError::SurgeryTypeNotFound(
                request.surgery_type_id.clone(),
            ));
        }

        if let Some(surgeon_id) = &request.required_surgeon_id {
            if self.surgeon_repo.find_by_id(surgeon_id)?.is_none() {
                return Err(ApiError::SurgeonNotFound(surgeon_id.clone()));
            }
        }

        // 覆盖值超过分级时限: 默认只告警放行，严格模式下拒绝
        if let Some(override_min) = request.max_wait_override_min {
            let sla_min = request.tier.max_wait_minutes();
            if override_min > sla_min {
                if policy.strict_sla_override {
                    return Err(ApiError::MaxWaitAboveSla {
                        override_min,
                        sla_min,
                    });
                }
                warn!(
                    tier = %request.tier,
                    override_min,
                    sla_min,
                    "等待时限覆盖超过分级时限，按覆盖值放行"
                );
            }
        }

        Ok(())
    }
}
