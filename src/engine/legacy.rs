// ==========================================
// 课程指标缓存引擎 - legacy 课程外部更新接口
// ==========================================
// 职责: legacy 课程不走聚合器重算, 交给外部更新器
// 说明: Engine 层定义 trait, 外部导入模块实现
// ==========================================

use crate::domain::course::{Course, CourseMetrics};
use crate::engine::cache_controller::CourseCacheController;
use crate::engine::error::{MetricsError, MetricsResult};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

/// legacy 课程外部更新器 Trait
///
/// 实现方负责从 wiki 侧拉取并写回课程数据, 对本引擎不透明
pub trait LegacyCourseUpdater: Send + Sync {
    /// 更新 legacy 课程
    ///
    /// # 参数
    /// - `course`: 待更新课程 (legacy = true)
    fn update_from_wiki(&self, course: &Course) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作更新器
///
/// 用于未接入外部导入模块的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpLegacyUpdater;

impl LegacyCourseUpdater for NoOpLegacyUpdater {
    fn update_from_wiki(&self, course: &Course) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            course_id = course.id,
            "NoOpLegacyUpdater: 未配置外部更新器，跳过 legacy 课程更新"
        );
        Ok(())
    }
}

/// 共享更新器句柄
pub type SharedLegacyUpdater = Arc<dyn LegacyCourseUpdater>;

// ==========================================
// 刷新分派: legacy → 外部更新器, 其余 → 聚合重算
// ==========================================

/// 一次刷新的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefreshOutcome {
    /// 经聚合器重算并已持久化
    Recomputed { metrics: CourseMetrics },
    /// 已交给外部 legacy 更新器
    LegacyDelegated,
}

/// 按课程分类刷新 (批量调度与成员清理共用)
///
/// 调用方必须已持有该课程的锁
pub(crate) fn refresh_course(
    cache: &CourseCacheController,
    legacy_updater: &dyn LegacyCourseUpdater,
    course: &Course,
) -> MetricsResult<RefreshOutcome> {
    if course.legacy {
        legacy_updater
            .update_from_wiki(course)
            .map_err(|e| MetricsError::LegacyUpdateFailure {
                course_id: course.id,
                message: e.to_string(),
            })?;
        tracing::info!(course_id = course.id, "legacy 课程已交给外部更新器");
        return Ok(RefreshOutcome::LegacyDelegated);
    }

    let metrics = cache.recompute_course(course)?;
    Ok(RefreshOutcome::Recomputed { metrics })
}
