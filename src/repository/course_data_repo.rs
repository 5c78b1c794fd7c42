// ==========================================
// 课程指标缓存引擎 - 课程数据访问接口
// ==========================================
// 职责: 定义引擎层所需的查询/持久化能力（不包含实现）
// 实现者: CourseDataRepositoryImpl（SQLite）
// 红线: 不包含业务逻辑
// ==========================================

use crate::domain::article::{Article, ArticleAssociation, Revision};
use crate::domain::course::{Course, CourseMetrics};
use crate::domain::enrollment::{Contributor, Enrollment};
use crate::domain::types::CourseRole;
use crate::repository::error::RepositoryResult;
use crate::repository::membership_repo::{MembershipChange, MembershipChangeCounts};
use chrono::NaiveDate;

// ==========================================
// CourseDataRepository Trait
// ==========================================
// 用途: 聚合器 / 缓存控制器 / 批量调度 / 成员清理 共用的数据访问接口
pub trait CourseDataRepository: Send + Sync {
    // ===== 查询能力 =====

    /// 按 ID 查询课程
    fn find_course(&self, course_id: i64) -> RepositoryResult<Option<Course>>;

    /// 查询结束日期晚于截止日的课程
    fn find_courses_ending_after(&self, cutoff: NaiveDate) -> RepositoryResult<Vec<Course>>;

    /// 查询课程的选课关系 (role = None 表示全部角色)
    fn find_enrollments(
        &self,
        course_id: i64,
        role: Option<CourseRole>,
    ) -> RepositoryResult<Vec<Enrollment>>;

    /// 按 ID 批量查询贡献者
    fn find_contributors(&self, contributor_ids: &[i64]) -> RepositoryResult<Vec<Contributor>>;

    /// 查询一组贡献者在日期窗口内的编辑记录
    fn find_revisions_in_window(
        &self,
        contributor_ids: &[i64],
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<Revision>>;

    /// 查询单个贡献者在日期窗口内编辑过的条目 ID
    fn find_edited_article_ids(
        &self,
        contributor_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<i64>>;

    /// 查询条目的全部编辑者 ID (不限窗口)
    fn find_article_editor_ids(&self, article_id: i64) -> RepositoryResult<Vec<i64>>;

    /// 查询课程的条目关联
    fn find_associations(&self, course_id: i64) -> RepositoryResult<Vec<ArticleAssociation>>;

    /// 按 ID 批量查询条目 (缺失的 ID 不返回)
    fn find_articles(&self, article_ids: &[i64]) -> RepositoryResult<Vec<Article>>;

    // ===== 持久化能力 =====

    /// 原子替换课程的全部缓存指标
    fn replace_cached_metrics(&self, course_id: i64, metrics: &CourseMetrics) -> RepositoryResult<()>;

    /// 单事务提交成员清理 (删除选课 + 删除孤立关联 + 作废缓存)
    fn apply_membership_change(
        &self,
        change: &MembershipChange,
    ) -> RepositoryResult<MembershipChangeCounts>;
}
