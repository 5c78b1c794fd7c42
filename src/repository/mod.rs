// ==========================================
// 课程指标缓存引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod article_repo;
pub mod course_data_repo;
pub mod course_data_repo_impl;
pub mod course_repo;
pub mod enrollment_repo;
pub mod error;
mod in_clause;
pub mod membership_repo;
pub mod revision_repo;

// 重导出核心仓储
pub use article_repo::ArticleRepository;
pub use course_data_repo::CourseDataRepository;
pub use course_data_repo_impl::CourseDataRepositoryImpl;
pub use course_repo::CourseRepository;
pub use enrollment_repo::EnrollmentRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use membership_repo::{MembershipChange, MembershipChangeCounts, MembershipRepository};
pub use revision_repo::RevisionRepository;
