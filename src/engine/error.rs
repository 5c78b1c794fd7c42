// ==========================================
// 课程指标缓存引擎 - 引擎层错误类型
// ==========================================
// 红线: 不吞错误, 每个错误都带 course_id 与操作名
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum MetricsError {
    /// 数据访问失败 (查询), 不在本层重试
    #[error("查询失败: course_id={course_id}, operation={operation}: {message}")]
    QueryFailure {
        course_id: i64,
        operation: &'static str,
        message: String,
    },

    /// 持久化失败, 缓存保持旧值
    #[error("持久化失败: course_id={course_id}, operation={operation}: {message}")]
    PersistenceFailure {
        course_id: i64,
        operation: &'static str,
        message: String,
    },

    #[error("课程不存在: course_id={course_id}")]
    CourseNotFound { course_id: i64 },

    /// 外部 legacy 更新器失败
    #[error("legacy 课程外部更新失败: course_id={course_id}: {message}")]
    LegacyUpdateFailure { course_id: i64, message: String },

    #[error("课程锁获取失败: course_id={course_id}: {message}")]
    LockError { course_id: i64, message: String },

    /// 批量调度选取课程集合失败 (尚未涉及具体课程)
    #[error("当前课程选取失败: operation={operation}: {message}")]
    SelectionFailure {
        operation: &'static str,
        message: String,
    },
}

impl MetricsError {
    /// 包装查询类仓储错误
    pub fn query(course_id: i64, operation: &'static str, err: RepositoryError) -> Self {
        MetricsError::QueryFailure {
            course_id,
            operation,
            message: err.to_string(),
        }
    }

    /// 包装写入类仓储错误
    pub fn persistence(course_id: i64, operation: &'static str, err: RepositoryError) -> Self {
        MetricsError::PersistenceFailure {
            course_id,
            operation,
            message: err.to_string(),
        }
    }

    /// 错误关联的课程 ID
    pub fn course_id(&self) -> Option<i64> {
        match self {
            MetricsError::QueryFailure { course_id, .. }
            | MetricsError::PersistenceFailure { course_id, .. }
            | MetricsError::CourseNotFound { course_id }
            | MetricsError::LegacyUpdateFailure { course_id, .. }
            | MetricsError::LockError { course_id, .. } => Some(*course_id),
            MetricsError::SelectionFailure { .. } => None,
        }
    }
}

/// Result 类型别名
pub type MetricsResult<T> = Result<T, MetricsError>;
