// ==========================================
// 课程指标缓存引擎 - 成员移除清理
// ==========================================
// 职责: 贡献者退出课程后, 删除失去课程编辑者的条目关联
// 流程:
// 1. 窗口内该贡献者编辑过的条目
// 2. 与课程当前关联条目取交集 → 候选
// 3. 候选条目若无其他编辑者, 或其他编辑者均非课程学生 → 孤立
// 4. 单事务提交: 选课删除 (remove_contributor) + 孤立关联删除 + 缓存作废
// 5. 有删除时刷新课程 (legacy 交给外部更新器)
// 红线: 全流程在课程锁内完成
// ==========================================

use crate::domain::course::Course;
use crate::engine::cache_controller::CourseCacheController;
use crate::engine::error::{MetricsError, MetricsResult};
use crate::engine::legacy::{refresh_course, RefreshOutcome, SharedLegacyUpdater};
use crate::repository::{CourseDataRepository, MembershipChange};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// CleanupReport - 清理报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub course_id: i64,
    pub contributor_id: i64,
    /// 本次删除的选课记录数 (仅 remove_contributor 可能非零)
    pub enrollments_removed: usize,
    pub candidate_article_ids: Vec<i64>,
    pub orphaned_article_ids: Vec<i64>,
    /// 关联存在但条目记录缺失 (也计入 orphaned)
    pub missing_article_ids: Vec<i64>,
    pub associations_deleted: usize,
    /// 未删除任何关联时为 None
    pub refresh: Option<RefreshOutcome>,
}

impl CleanupReport {
    fn empty(course_id: i64, contributor_id: i64) -> Self {
        Self {
            course_id,
            contributor_id,
            enrollments_removed: 0,
            candidate_article_ids: Vec::new(),
            orphaned_article_ids: Vec::new(),
            missing_article_ids: Vec::new(),
            associations_deleted: 0,
            refresh: None,
        }
    }
}

// ==========================================
// MembershipCleanupEngine - 成员清理引擎
// ==========================================
pub struct MembershipCleanupEngine {
    data: Arc<dyn CourseDataRepository>,
    cache: Arc<CourseCacheController>,
    legacy_updater: SharedLegacyUpdater,
}

impl MembershipCleanupEngine {
    pub fn new(
        data: Arc<dyn CourseDataRepository>,
        cache: Arc<CourseCacheController>,
        legacy_updater: SharedLegacyUpdater,
    ) -> Self {
        Self {
            data,
            cache,
            legacy_updater,
        }
    }

    /// 选课记录已被删除后的清理
    ///
    /// 每次移除调用一次; 引擎本身不保存状态
    #[instrument(skip(self))]
    pub fn on_enrollment_removed(
        &self,
        contributor_id: i64,
        course_id: i64,
    ) -> MetricsResult<CleanupReport> {
        self.cache
            .locks()
            .with_course(course_id, || self.cleanup_locked(contributor_id, course_id, false))
    }

    /// 删除贡献者的选课记录并清理 (同一锁范围, 同一事务)
    ///
    /// 清理只依据当前数据计算, 失败后重试会补齐上次未完成的部分
    #[instrument(skip(self))]
    pub fn remove_contributor(
        &self,
        contributor_id: i64,
        course_id: i64,
    ) -> MetricsResult<CleanupReport> {
        self.cache
            .locks()
            .with_course(course_id, || self.cleanup_locked(contributor_id, course_id, true))
    }

    /// 清理主体, 调用方必须已持有课程锁
    fn cleanup_locked(
        &self,
        contributor_id: i64,
        course_id: i64,
        remove_enrollment: bool,
    ) -> MetricsResult<CleanupReport> {
        let course = self.cache.load_course(course_id)?;
        let mut report = CleanupReport::empty(course_id, contributor_id);

        self.collect_orphans(&course, contributor_id, &mut report)?;

        if !remove_enrollment && report.orphaned_article_ids.is_empty() {
            return Ok(report);
        }

        // ===== 4. 单事务提交: 选课删除 + 孤立关联删除 + 缓存作废 =====
        let change = MembershipChange {
            course_id,
            remove_contributor_id: remove_enrollment.then_some(contributor_id),
            orphaned_article_ids: report.orphaned_article_ids.clone(),
            // legacy 课程缓存由外部更新器维护
            invalidate_cache: !course.legacy,
        };
        let counts = self
            .data
            .apply_membership_change(&change)
            .map_err(|e| MetricsError::persistence(course_id, "apply_membership_change", e))?;

        report.enrollments_removed = counts.enrollments_removed;
        report.associations_deleted = counts.associations_deleted;

        if remove_enrollment && counts.enrollments_removed == 0 {
            tracing::info!(course_id, contributor_id, "贡献者已不在课程中，按当前数据补做清理");
        }
        if counts.associations_deleted > 0 {
            tracing::info!(
                course_id,
                contributor_id,
                deleted = counts.associations_deleted,
                cache_invalidated = counts.cache_invalidated,
                "已删除孤立条目关联"
            );
        }

        // ===== 5. 刷新课程 =====
        // 刷新失败时缓存已是未计算状态, 之后的惰性读取会重新聚合
        if counts.associations_deleted > 0 {
            report.refresh = Some(refresh_course(
                &self.cache,
                self.legacy_updater.as_ref(),
                &course,
            )?);
        }

        Ok(report)
    }

    /// 步骤 1-3: 判定孤立条目, 结果写入 report
    fn collect_orphans(
        &self,
        course: &Course,
        contributor_id: i64,
        report: &mut CleanupReport,
    ) -> MetricsResult<()> {
        let course_id = course.id;

        // ===== 1. 窗口内编辑过的条目 =====
        let touched: HashSet<i64> = self
            .data
            .find_edited_article_ids(contributor_id, course.start, course.end)
            .map_err(|e| MetricsError::query(course_id, "find_edited_article_ids", e))?
            .into_iter()
            .collect();

        if touched.is_empty() {
            tracing::debug!(course_id, contributor_id, "窗口内无编辑记录，无需清理关联");
            return Ok(());
        }

        // ===== 2. 候选 = touched ∩ 当前关联 =====
        let candidates: BTreeSet<i64> = self
            .data
            .find_associations(course_id)
            .map_err(|e| MetricsError::query(course_id, "find_associations", e))?
            .into_iter()
            .map(|a| a.article_id)
            .filter(|id| touched.contains(id))
            .collect();
        report.candidate_article_ids = candidates.iter().copied().collect();

        if candidates.is_empty() {
            return Ok(());
        }

        // ===== 3. 判定孤立 =====
        let remaining_students: HashSet<i64> = self
            .data
            .find_enrollments(course_id, None)
            .map_err(|e| MetricsError::query(course_id, "find_enrollments", e))?
            .into_iter()
            .filter(|e| e.role.counts_as_contributor() && e.contributor_id != contributor_id)
            .map(|e| e.contributor_id)
            .collect();

        let existing: HashSet<i64> = self
            .data
            .find_articles(&report.candidate_article_ids)
            .map_err(|e| MetricsError::query(course_id, "find_articles", e))?
            .into_iter()
            .map(|a| a.id)
            .collect();

        for &article_id in &candidates {
            if !existing.contains(&article_id) {
                tracing::warn!(
                    course_id,
                    article_id,
                    "条目记录缺失但关联仍在 (InconsistentAssociation)，按孤立处理"
                );
                report.missing_article_ids.push(article_id);
                report.orphaned_article_ids.push(article_id);
                continue;
            }

            let other_editors: Vec<i64> = self
                .data
                .find_article_editor_ids(article_id)
                .map_err(|e| MetricsError::query(course_id, "find_article_editor_ids", e))?
                .into_iter()
                .filter(|id| *id != contributor_id)
                .collect();

            let has_course_editor = other_editors
                .iter()
                .any(|id| remaining_students.contains(id));

            if other_editors.is_empty() || !has_course_editor {
                report.orphaned_article_ids.push(article_id);
            }
        }

        if report.orphaned_article_ids.is_empty() {
            tracing::info!(course_id, contributor_id, "候选条目均有其他课程编辑者，保留关联");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{CourseRole, MAINSPACE_NAMESPACE};
    use crate::engine::course_locks::CourseLockRegistry;
    use crate::engine::legacy::NoOpLegacyUpdater;
    use crate::engine::test_fixtures::Fixture;

    fn engine(fx: &Fixture) -> MembershipCleanupEngine {
        let cache = Arc::new(CourseCacheController::new(
            fx.data.clone(),
            Arc::new(CourseLockRegistry::new()),
        ));
        MembershipCleanupEngine::new(fx.data.clone(), cache, Arc::new(NoOpLegacyUpdater))
    }

    #[test]
    fn test_no_edits_in_window_is_noop() {
        let fx = Fixture::new();
        fx.course(10001);
        fx.contributor(1, false);
        fx.article(100, MAINSPACE_NAMESPACE, false);
        fx.associate(10001, 100, 10, true, false);
        fx.revision(1, 1, 100, "2014-12-01 10:00:00", 50);

        let report = engine(&fx).on_enrollment_removed(1, 10001).unwrap();
        assert!(report.candidate_article_ids.is_empty());
        assert_eq!(report.associations_deleted, 0);
        assert!(report.refresh.is_none());
        assert_eq!(fx.articles.find_associations_by_course(10001).unwrap().len(), 1);
    }

    #[test]
    fn test_other_editor_outside_course_does_not_keep_article() {
        let fx = Fixture::new();
        fx.course(10001);
        fx.contributor(1, false);
        fx.contributor(2, false);
        fx.enroll(10001, 1, CourseRole::Student);
        fx.article(100, MAINSPACE_NAMESPACE, false);
        fx.associate(10001, 100, 10, true, false);
        fx.revision(1, 1, 100, "2015-02-01 10:00:00", 50);
        // 2 号编辑过但不是课程学生
        fx.revision(2, 2, 100, "2015-02-02 10:00:00", 20);

        let report = engine(&fx).remove_contributor(1, 10001).unwrap();
        assert_eq!(report.enrollments_removed, 1);
        assert_eq!(report.orphaned_article_ids, vec![100]);
        assert_eq!(report.associations_deleted, 1);
    }

    #[test]
    fn test_repeated_removal_is_idempotent() {
        let fx = Fixture::new();
        fx.course(10001);
        fx.contributor(1, false);
        fx.enroll(10001, 1, CourseRole::Student);
        fx.article(100, MAINSPACE_NAMESPACE, false);
        fx.associate(10001, 100, 10, true, false);
        fx.revision(1, 1, 100, "2015-02-01 10:00:00", 50);

        let engine = engine(&fx);
        let first = engine.remove_contributor(1, 10001).unwrap();
        assert_eq!(first.enrollments_removed, 1);
        assert_eq!(first.associations_deleted, 1);
        assert!(fx.reload(10001).cached.is_complete());

        let second = engine.remove_contributor(1, 10001).unwrap();
        assert_eq!(second.enrollments_removed, 0);
        assert!(second.candidate_article_ids.is_empty());
        assert_eq!(second.associations_deleted, 0);
        assert!(second.refresh.is_none());
        assert!(fx.reload(10001).cached.is_complete());
    }
}
