// ==========================================
// 课程指标缓存引擎 - 缓存控制器
// ==========================================
// 职责: 惰性读取 / 强制重算 / 原子持久化
// 红线: 七个缓存指标整体替换, 不允许部分写入
// 红线: 持久化失败时缓存保持旧值, 错误上抛
// ==========================================

use crate::domain::course::{CachedMetrics, Course, CourseMetrics};
use crate::domain::types::MetricName;
use crate::engine::aggregator::MetricsAggregator;
use crate::engine::course_locks::CourseLockRegistry;
use crate::engine::error::{MetricsError, MetricsResult};
use crate::repository::CourseDataRepository;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// CourseCacheController - 缓存控制器
// ==========================================
pub struct CourseCacheController {
    data: Arc<dyn CourseDataRepository>,
    aggregator: MetricsAggregator,
    locks: Arc<CourseLockRegistry>,
}

impl CourseCacheController {
    /// 创建缓存控制器
    ///
    /// # 参数
    /// - `data`: 数据访问能力
    /// - `locks`: 课程锁表 (与清理引擎/批量调度共享)
    pub fn new(data: Arc<dyn CourseDataRepository>, locks: Arc<CourseLockRegistry>) -> Self {
        Self {
            data,
            aggregator: MetricsAggregator::new(),
            locks,
        }
    }

    /// 共享的课程锁表
    pub fn locks(&self) -> &Arc<CourseLockRegistry> {
        &self.locks
    }

    /// 读取单个指标
    ///
    /// 已计算 (含 0) 直接返回缓存值; 未计算时做一次完整重算后返回
    #[instrument(skip(self), fields(metric = %name))]
    pub fn get_metric(&self, course_id: i64, name: MetricName) -> MetricsResult<i64> {
        self.locks.with_course(course_id, || {
            let course = self.load_course(course_id)?;
            if let Some(value) = course.cached.get(name) {
                return Ok(value);
            }

            tracing::debug!(course_id, metric = %name, "缓存未计算，执行完整重算");
            let metrics = self.recompute_course(&course)?;
            Ok(metrics.get(name))
        })
    }

    /// 读取课程当前缓存 (不触发重算)
    pub fn get_cached_metrics(&self, course_id: i64) -> MetricsResult<CachedMetrics> {
        Ok(self.load_course(course_id)?.cached)
    }

    /// 强制重算 (忽略缓存状态)
    #[instrument(skip(self))]
    pub fn force_recompute(&self, course_id: i64) -> MetricsResult<CourseMetrics> {
        self.locks.with_course(course_id, || {
            let course = self.load_course(course_id)?;
            self.recompute_course(&course)
        })
    }

    /// 加载课程
    pub(crate) fn load_course(&self, course_id: i64) -> MetricsResult<Course> {
        self.data
            .find_course(course_id)
            .map_err(|e| MetricsError::query(course_id, "find_course", e))?
            .ok_or(MetricsError::CourseNotFound { course_id })
    }

    /// 聚合 + 持久化
    ///
    /// 调用方必须已持有该课程的锁
    pub(crate) fn recompute_course(&self, course: &Course) -> MetricsResult<CourseMetrics> {
        let metrics = self.aggregator.compute(course, self.data.as_ref())?;

        self.data
            .replace_cached_metrics(course.id, &metrics)
            .map_err(|e| {
                tracing::error!(course_id = course.id, error = %e, "缓存指标写入失败，保留旧缓存");
                MetricsError::persistence(course.id, "replace_cached_metrics", e)
            })?;

        tracing::info!(
            course_id = course.id,
            character_sum = metrics.character_sum,
            view_sum = metrics.view_sum,
            user_count = metrics.user_count,
            revision_count = metrics.revision_count,
            article_count = metrics.article_count,
            "课程指标已重算"
        );
        Ok(metrics)
    }
}
