// ==========================================
// 课程指标缓存引擎 - 批量重算调度
// ==========================================
// 职责: 选取"当前"课程并逐个刷新缓存
// 当前课程: end > (now - 宽限期)
// 隔离模式:
// - PER_COURSE: 每门课程独立, 失败逐条上报, 其余继续
// - SINGLE_UNIT: 首个失败即中止, 剩余课程标记 ABORTED
// ==========================================

use crate::domain::course::{Course, CourseMetrics};
use crate::engine::cache_controller::CourseCacheController;
use crate::engine::error::{MetricsError, MetricsResult};
use crate::engine::legacy::{refresh_course, RefreshOutcome, SharedLegacyUpdater};
use crate::repository::CourseDataRepository;
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

// ==========================================
// BatchIsolationMode - 批量隔离模式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchIsolationMode {
    #[default]
    PerCourse,  // 每门课程独立
    SingleUnit, // 整批一个单元
}

impl BatchIsolationMode {
    pub fn as_str(&self) -> &str {
        match self {
            BatchIsolationMode::PerCourse => "PER_COURSE",
            BatchIsolationMode::SingleUnit => "SINGLE_UNIT",
        }
    }

    /// 解析配置值, 无法识别时回落 PER_COURSE
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "SINGLE_UNIT" => BatchIsolationMode::SingleUnit,
            _ => BatchIsolationMode::PerCourse,
        }
    }
}

impl fmt::Display for BatchIsolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 单课程结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseRecomputeStatus {
    Recomputed { metrics: CourseMetrics },
    LegacyDelegated,
    Failed { reason: String },
    /// 整批模式下因前序失败未执行
    Aborted,
}

impl From<RefreshOutcome> for CourseRecomputeStatus {
    fn from(outcome: RefreshOutcome) -> Self {
        match outcome {
            RefreshOutcome::Recomputed { metrics } => CourseRecomputeStatus::Recomputed { metrics },
            RefreshOutcome::LegacyDelegated => CourseRecomputeStatus::LegacyDelegated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecomputeOutcome {
    pub course_id: i64,
    pub status: CourseRecomputeStatus,
}

impl CourseRecomputeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            CourseRecomputeStatus::Recomputed { .. } | CourseRecomputeStatus::LegacyDelegated
        )
    }
}

// ==========================================
// BatchRecomputeReport - 批量重算报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRecomputeReport {
    pub run_id: String,
    pub mode: BatchIsolationMode,
    pub cutoff: NaiveDate,             // 结束日期需晚于该日
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    pub aborted: bool,                 // 整批模式下是否中止
    pub outcomes: Vec<CourseRecomputeOutcome>,
}

impl BatchRecomputeReport {
    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, CourseRecomputeStatus::Failed { .. }))
            .count()
    }

    pub fn aborted_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == CourseRecomputeStatus::Aborted)
            .count()
    }

    /// 全部课程成功
    pub fn is_success(&self) -> bool {
        !self.aborted && self.failed_count() == 0
    }

    pub fn outcome_for(&self, course_id: i64) -> Option<&CourseRecomputeOutcome> {
        self.outcomes.iter().find(|o| o.course_id == course_id)
    }
}

// ==========================================
// BatchRecomputeScheduler - 批量重算调度器
// ==========================================
pub struct BatchRecomputeScheduler {
    data: Arc<dyn CourseDataRepository>,
    cache: Arc<CourseCacheController>,
    legacy_updater: SharedLegacyUpdater,
    mode: BatchIsolationMode,
}

impl BatchRecomputeScheduler {
    pub fn new(
        data: Arc<dyn CourseDataRepository>,
        cache: Arc<CourseCacheController>,
        legacy_updater: SharedLegacyUpdater,
        mode: BatchIsolationMode,
    ) -> Self {
        Self {
            data,
            cache,
            legacy_updater,
            mode,
        }
    }

    pub fn mode(&self) -> BatchIsolationMode {
        self.mode
    }

    /// 截止日: (now - 宽限期) 所在日期
    pub fn cutoff_date(now: NaiveDateTime, grace_period: Duration) -> NaiveDate {
        (now - grace_period).date()
    }

    /// 选取当前课程
    pub fn select_current_courses(
        &self,
        now: NaiveDateTime,
        grace_period: Duration,
    ) -> MetricsResult<Vec<Course>> {
        let cutoff = Self::cutoff_date(now, grace_period);
        let courses = self
            .data
            .find_courses_ending_after(cutoff)
            .map_err(|e| MetricsError::SelectionFailure {
                operation: "find_courses_ending_after",
                message: e.to_string(),
            })?;

        // 数据源口径与截止规则保持一致
        Ok(courses
            .into_iter()
            .filter(|c| c.is_current_as_of(cutoff))
            .collect())
    }

    /// 执行一次批量重算
    ///
    /// # 返回
    /// - Ok(report): 每门课程一条结果
    /// - Err: 仅在选取课程集合失败时返回
    #[instrument(skip(self), fields(mode = %self.mode))]
    pub fn run_batch_recompute(
        &self,
        now: NaiveDateTime,
        grace_period: Duration,
    ) -> MetricsResult<BatchRecomputeReport> {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now().naive_utc();
        let cutoff = Self::cutoff_date(now, grace_period);
        let courses = self.select_current_courses(now, grace_period)?;

        tracing::info!(
            run_id = %run_id,
            cutoff = %cutoff,
            course_count = courses.len(),
            "开始批量重算课程缓存"
        );

        let mut outcomes = Vec::with_capacity(courses.len());
        let mut aborted = false;

        for course in &courses {
            if aborted {
                outcomes.push(CourseRecomputeOutcome {
                    course_id: course.id,
                    status: CourseRecomputeStatus::Aborted,
                });
                continue;
            }

            let result = self.cache.locks().with_course(course.id, || {
                refresh_course(&self.cache, self.legacy_updater.as_ref(), course)
            });

            let status = match result {
                Ok(outcome) => outcome.into(),
                Err(e) => {
                    tracing::warn!(run_id = %run_id, course_id = course.id, error = %e, "课程重算失败");
                    if self.mode == BatchIsolationMode::SingleUnit {
                        aborted = true;
                    }
                    CourseRecomputeStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };

            outcomes.push(CourseRecomputeOutcome {
                course_id: course.id,
                status,
            });
        }

        let report = BatchRecomputeReport {
            run_id,
            mode: self.mode,
            cutoff,
            started_at,
            finished_at: Utc::now().naive_utc(),
            aborted,
            outcomes,
        };

        if report.aborted {
            tracing::error!(
                run_id = %report.run_id,
                succeeded = report.succeeded_count(),
                failed = report.failed_count(),
                aborted = report.aborted_count(),
                "批量重算已中止: 整批模式下出现失败"
            );
        } else {
            tracing::info!(
                run_id = %report.run_id,
                succeeded = report.succeeded_count(),
                failed = report.failed_count(),
                "批量重算完成"
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::course_locks::CourseLockRegistry;
    use crate::engine::legacy::NoOpLegacyUpdater;
    use crate::engine::test_fixtures::{date, Fixture};

    fn scheduler(fx: &Fixture, mode: BatchIsolationMode) -> BatchRecomputeScheduler {
        let cache = Arc::new(CourseCacheController::new(
            fx.data.clone(),
            Arc::new(CourseLockRegistry::new()),
        ));
        BatchRecomputeScheduler::new(fx.data.clone(), cache, Arc::new(NoOpLegacyUpdater), mode)
    }

    #[test]
    fn test_isolation_mode_parse() {
        assert_eq!(BatchIsolationMode::from_str("single_unit"), BatchIsolationMode::SingleUnit);
        assert_eq!(BatchIsolationMode::from_str("PER_COURSE"), BatchIsolationMode::PerCourse);
        assert_eq!(BatchIsolationMode::from_str("???"), BatchIsolationMode::PerCourse);
    }

    #[test]
    fn test_cutoff_date() {
        let now = date("2016-03-15").and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(
            BatchRecomputeScheduler::cutoff_date(now, Duration::days(14)),
            date("2016-03-01")
        );
    }

    #[test]
    fn test_course_ending_on_cutoff_is_excluded() {
        let fx = Fixture::new();
        fx.course_between(10001, date("2016-01-01"), date("2016-03-01"));
        fx.course_between(10002, date("2016-01-01"), date("2016-03-02"));

        let now = date("2016-03-15").and_hms_opt(12, 0, 0).unwrap();
        let ids: Vec<i64> = scheduler(&fx, BatchIsolationMode::PerCourse)
            .select_current_courses(now, Duration::days(14))
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![10002]);
    }

    #[test]
    fn test_report_serializes_outcomes() {
        let fx = Fixture::new();
        fx.course_between(10001, date("2016-01-01"), date("2016-04-01"));

        let now = date("2016-03-15").and_hms_opt(12, 0, 0).unwrap();
        let report = scheduler(&fx, BatchIsolationMode::PerCourse)
            .run_batch_recompute(now, Duration::days(14))
            .unwrap();
        assert!(report.is_success());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "PER_COURSE");
        assert_eq!(json["outcomes"][0]["status"], "RECOMPUTED");
        assert_eq!(json["outcomes"][0]["metrics"]["user_count"], 0);
    }
}
