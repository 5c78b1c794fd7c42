// ==========================================
// 课程指标缓存引擎 - 引擎层
// ==========================================
// 职责: 指标聚合 / 缓存控制 / 批量重算 / 成员清理
// 红线: Engine 不拼 SQL, 数据访问只经 CourseDataRepository
// ==========================================

pub mod aggregator;
pub mod batch;
pub mod cache_controller;
pub mod cleanup;
pub mod course_locks;
pub mod error;
pub mod legacy;

#[cfg(test)]
pub(crate) mod test_fixtures;

// 重导出核心引擎
pub use aggregator::MetricsAggregator;
pub use batch::{
    BatchIsolationMode, BatchRecomputeReport, BatchRecomputeScheduler, CourseRecomputeOutcome,
    CourseRecomputeStatus,
};
pub use cache_controller::CourseCacheController;
pub use cleanup::{CleanupReport, MembershipCleanupEngine};
pub use course_locks::CourseLockRegistry;
pub use error::{MetricsError, MetricsResult};
pub use legacy::{LegacyCourseUpdater, NoOpLegacyUpdater, RefreshOutcome, SharedLegacyUpdater};
