// ==========================================
// 手术室排程系统 - 急诊插台请求
// ==========================================
// 生命周期: 到达事件创建，返回插台结果后丢弃，从不落库
// ==========================================

use crate::domain::types::PriorityTier;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// EmergencyFlags - 策略开关
// ==========================================
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EmergencyFlags {
    pub allow_bumping: bool,      // 允许让位
    pub allow_overtime: bool,     // 允许延时
    pub allow_backup_rooms: bool, // 允许使用空闲/备用房间
}

impl Default for EmergencyFlags {
    fn default() -> Self {
        Self {
            allow_bumping: true,
            allow_overtime: true,
            allow_backup_rooms: true,
        }
    }
}

// ==========================================
// EmergencyRequest - 急诊插台请求（不可变）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyRequest {
    pub patient_id: String,                 // 患者
    pub surgery_type_id: String,            // 手术类型
    pub duration_min: i64,                  // 所需时长（分钟）
    pub arrival_at: NaiveDateTime,          // 到达时间
    pub tier: PriorityTier,                 // 优先级分级
    pub required_surgeon_id: Option<String>, // 指定主刀（可选）
    pub preferred_start: Option<NaiveDateTime>, // 期望开始时间（可选）
    pub room_type_filter: Option<String>,   // 房间类型过滤（可选）
    pub flags: EmergencyFlags,              // 策略开关
    pub max_wait_override_min: Option<i64>, // 调用方等待时限覆盖（可选）
}

impl EmergencyRequest {
    /// 有效等待时限（分钟）：调用方覆盖优先，否则取分级时限
    pub fn effective_max_wait_minutes(&self) -> i64 {
        self.max_wait_override_min
            .unwrap_or_else(|| self.tier.max_wait_minutes())
    }

    /// 空闲房间检索的候选开始时间
    ///
    /// 期望开始时间早于到达时间时按到达时间处理
    pub fn candidate_start(&self) -> NaiveDateTime {
        match self.preferred_start {
            Some(preferred) if preferred > self.arrival_at => preferred,
            _ => self.arrival_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn base_request() -> EmergencyRequest {
        EmergencyRequest {
            patient_id: "P001".to_string(),
            surgery_type_id: "T001".to_string(),
            duration_min: 60,
            arrival_at: NaiveDate::from_ymd_opt(2026, 8, 4)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            tier: PriorityTier::Urgent,
            required_surgeon_id: None,
            preferred_start: None,
            room_type_filter: None,
            flags: EmergencyFlags::default(),
            max_wait_override_min: None,
        }
    }

    #[test]
    fn test_effective_max_wait_prefers_override() {
        let mut req = base_request();
        assert_eq!(req.effective_max_wait_minutes(), 60);

        req.max_wait_override_min = Some(90);
        assert_eq!(req.effective_max_wait_minutes(), 90);
    }

    #[test]
    fn test_candidate_start_clamped_to_arrival() {
        let mut req = base_request();
        assert_eq!(req.candidate_start(), req.arrival_at);

        // 期望时间晚于到达时间则生效
        let preferred = req.arrival_at + chrono::Duration::minutes(30);
        req.preferred_start = Some(preferred);
        assert_eq!(req.candidate_start(), preferred);

        // 期望时间早于到达时间则按到达时间
        req.preferred_start = Some(req.arrival_at - chrono::Duration::minutes(30));
        assert_eq!(req.candidate_start(), req.arrival_at);
    }
}
