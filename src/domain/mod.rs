// ==========================================
// 课程指标缓存引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod article;
pub mod course;
pub mod enrollment;
pub mod types;

// 重导出核心类型
pub use article::{Article, ArticleAssociation, Revision};
pub use course::{CachedMetrics, Course, CourseMetrics, NewCourse};
pub use enrollment::{Contributor, Enrollment};
pub use types::{CourseRole, MetricName, MAINSPACE_NAMESPACE};
