// ==========================================
// 课程指标缓存引擎 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换引擎/仓储错误为调用方可读的错误消息
// 红线: 错误信息必须带课程ID与原因
// ==========================================

use crate::engine::error::MetricsError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("legacy 课程外部更新失败: {0}")]
    LegacyUpdateFailed(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("缓存持久化失败: {0}")]
    PersistenceError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

// ==========================================
// 从 MetricsError 转换
// ==========================================
impl From<MetricsError> for ApiError {
    fn from(err: MetricsError) -> Self {
        match err {
            MetricsError::CourseNotFound { course_id } => {
                ApiError::NotFound(format!("课程(id={})不存在", course_id))
            }
            MetricsError::PersistenceFailure { .. } => ApiError::PersistenceError(err.to_string()),
            MetricsError::LegacyUpdateFailure { .. } => ApiError::LegacyUpdateFailed(err.to_string()),
            MetricsError::LockError { .. } => ApiError::InternalError(err.to_string()),
            MetricsError::QueryFailure { .. } | MetricsError::SelectionFailure { .. } => {
                ApiError::DatabaseError(err.to_string())
            }
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::InternalError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::InvalidInput(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::InvalidInput(format!("外键约束违反: {}", msg))
            }
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_not_found_maps_to_not_found() {
        let err: ApiError = MetricsError::CourseNotFound { course_id: 7 }.into();
        assert!(matches!(err, ApiError::NotFound(ref msg) if msg.contains("id=7")));
    }

    #[test]
    fn test_persistence_failure_keeps_context() {
        let err: ApiError = MetricsError::PersistenceFailure {
            course_id: 12,
            operation: "replace_cached_metrics",
            message: "disk I/O error".to_string(),
        }
        .into();
        let text = err.to_string();
        assert!(text.contains("course_id=12"));
        assert!(text.contains("replace_cached_metrics"));
    }

    #[test]
    fn test_repository_errors_map_by_kind() {
        let duplicate: ApiError =
            RepositoryError::UniqueConstraintViolation("courses.id".to_string()).into();
        assert!(matches!(duplicate, ApiError::InvalidInput(_)));

        let poisoned: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(matches!(poisoned, ApiError::InternalError(ref msg) if msg.contains("poisoned")));

        let missing: ApiError = RepositoryError::NotFound {
            entity: "Course".to_string(),
            id: "9".to_string(),
        }
        .into();
        assert!(matches!(missing, ApiError::NotFound(_)));
    }
}
