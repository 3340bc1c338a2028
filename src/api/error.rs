// ==========================================
// 手术室排程系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为用户友好的错误消息
// 红线: 校验错误必须在任何排班读写之前抛出，且各自可区分
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因（可解释性）
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 校验错误（先于任何排班读写）
    // ==========================================
    #[error("患者不存在: patient_id={0}")]
    PatientNotFound(String),

    #[error("手术类型不存在: surgery_type_id={0}")]
    SurgeryTypeNotFound(String),

    #[error("指定主刀医生不存在: surgeon_id={0}")]
    SurgeonNotFound(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    /// 等待时限覆盖超过分级时限（仅严格模式下抛出）
    #[error("等待时限覆盖超过分级时限: override={override_min}min, sla={sla_min}min")]
    MaxWaitAboveSla { override_min: i64, sla_min: i64 },

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

// 实现 From<RepositoryError>
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} with id={}", entity, id))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
