// ==========================================
// 课程指标缓存引擎 - 课程指标 API
// ==========================================
// 职责: 指标读取、强制重算、批量重算、成员移除、手动更新
// 说明: 调用方提供 now, 本层不读系统时钟
// ==========================================

use std::sync::Arc;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::course::{CachedMetrics, Course, CourseMetrics};
use crate::domain::types::MetricName;
use crate::engine::batch::{BatchRecomputeReport, BatchRecomputeScheduler};
use crate::engine::cache_controller::CourseCacheController;
use crate::engine::cleanup::{CleanupReport, MembershipCleanupEngine};
use crate::engine::legacy::{refresh_course, RefreshOutcome, SharedLegacyUpdater};

/// 手动更新结果
pub type ManualUpdateOutcome = RefreshOutcome;

/// wiki 地址配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiSettings {
    pub language: String,
    pub course_prefix: String,
}

impl Default for WikiSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            course_prefix: "Wikipedia:Wiki_Ed".to_string(),
        }
    }
}

// ==========================================
// CourseMetricsApi - 课程指标 API
// ==========================================

/// 课程指标API
///
/// 职责：
/// 1. 惰性读取单个指标 / 读取当前缓存
/// 2. 强制重算 / 手动更新
/// 3. 批量重算当前课程
/// 4. 成员移除后的关联清理
pub struct CourseMetricsApi {
    cache: Arc<CourseCacheController>,
    scheduler: Arc<BatchRecomputeScheduler>,
    cleanup: Arc<MembershipCleanupEngine>,
    legacy_updater: SharedLegacyUpdater,
    wiki: WikiSettings,
}

impl CourseMetricsApi {
    /// 创建新的CourseMetricsApi实例
    pub fn new(
        cache: Arc<CourseCacheController>,
        scheduler: Arc<BatchRecomputeScheduler>,
        cleanup: Arc<MembershipCleanupEngine>,
        legacy_updater: SharedLegacyUpdater,
        wiki: WikiSettings,
    ) -> Self {
        Self {
            cache,
            scheduler,
            cleanup,
            legacy_updater,
            wiki,
        }
    }

    /// 读取单个指标 (未计算时触发一次完整重算)
    pub fn get_metric(&self, course_id: i64, name: MetricName) -> ApiResult<i64> {
        Ok(self.cache.get_metric(course_id, name)?)
    }

    /// 按指标名读取
    ///
    /// # 参数
    /// - metric: 指标列名, 如 "character_sum"
    pub fn get_metric_by_name(&self, course_id: i64, metric: &str) -> ApiResult<i64> {
        let name = MetricName::parse(metric)
            .ok_or_else(|| ApiError::InvalidInput(format!("未知指标: {}", metric)))?;
        self.get_metric(course_id, name)
    }

    /// 读取课程当前缓存 (不触发重算)
    pub fn get_cached_metrics(&self, course_id: i64) -> ApiResult<CachedMetrics> {
        Ok(self.cache.get_cached_metrics(course_id)?)
    }

    /// 强制重算
    pub fn force_recompute(&self, course_id: i64) -> ApiResult<CourseMetrics> {
        Ok(self.cache.force_recompute(course_id)?)
    }

    /// 批量重算当前课程
    ///
    /// # 参数
    /// - now: 调用方时钟
    /// - grace_period: 结束后仍视为当前的宽限期
    pub fn run_batch_recompute(
        &self,
        now: NaiveDateTime,
        grace_period: Duration,
    ) -> ApiResult<BatchRecomputeReport> {
        if grace_period < Duration::zero() {
            return Err(ApiError::InvalidInput("宽限期不能为负".to_string()));
        }
        Ok(self.scheduler.run_batch_recompute(now, grace_period)?)
    }

    /// 选课记录已删除后的清理
    pub fn on_enrollment_removed(
        &self,
        contributor_id: i64,
        course_id: i64,
    ) -> ApiResult<CleanupReport> {
        Ok(self.cleanup.on_enrollment_removed(contributor_id, course_id)?)
    }

    /// 移除贡献者并清理
    pub fn remove_contributor(&self, contributor_id: i64, course_id: i64) -> ApiResult<CleanupReport> {
        Ok(self.cleanup.remove_contributor(contributor_id, course_id)?)
    }

    /// 手动更新: legacy 交给外部更新器, 其余强制重算
    pub fn manual_update(&self, course_id: i64) -> ApiResult<ManualUpdateOutcome> {
        let outcome = self.cache.locks().with_course(course_id, || {
            let course = self.cache.load_course(course_id)?;
            refresh_course(&self.cache, self.legacy_updater.as_ref(), &course)
        })?;
        Ok(outcome)
    }

    /// 课程概要 (含 wiki 地址)
    pub fn get_course_summary(&self, course_id: i64) -> ApiResult<CourseSummary> {
        let course = self.cache.load_course(course_id)?;
        Ok(CourseSummary::from_course(&course, &self.wiki))
    }
}

// ==========================================
// DTO 类型
// ==========================================

/// 课程概要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub legacy: bool,
    pub wiki_title: String,
    pub url: String,
    pub cached: CachedMetrics,
}

impl CourseSummary {
    fn from_course(course: &Course, wiki: &WikiSettings) -> Self {
        Self {
            id: course.id,
            title: course.title.clone(),
            slug: course.slug.clone(),
            start: course.start,
            end: course.end,
            legacy: course.legacy,
            wiki_title: course.wiki_title(&wiki.course_prefix),
            url: course.url(&wiki.language, &wiki.course_prefix),
            cached: course.cached,
        }
    }
}
