// ==========================================
// 课程指标缓存引擎 - API 层
// ==========================================
// 职责: 对外提供课程指标接口, 引擎错误统一转为 ApiError
// ==========================================

pub mod course_metrics_api;
pub mod error;

// 重导出核心类型
pub use course_metrics_api::{CourseMetricsApi, CourseSummary, ManualUpdateOutcome, WikiSettings};
pub use error::{ApiError, ApiResult};
