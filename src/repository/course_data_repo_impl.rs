// ==========================================
// 课程指标缓存引擎 - 课程数据访问实现（SQLite）
// ==========================================
// 职责: 组合各表仓储, 实现 CourseDataRepository
// 红线: 不含业务逻辑
// ==========================================

use crate::domain::article::{Article, ArticleAssociation, Revision};
use crate::domain::course::{Course, CourseMetrics};
use crate::domain::enrollment::{Contributor, Enrollment};
use crate::domain::types::CourseRole;
use crate::repository::article_repo::ArticleRepository;
use crate::repository::course_data_repo::CourseDataRepository;
use crate::repository::course_repo::CourseRepository;
use crate::repository::enrollment_repo::EnrollmentRepository;
use crate::repository::error::RepositoryResult;
use crate::repository::membership_repo::{
    MembershipChange, MembershipChangeCounts, MembershipRepository,
};
use crate::repository::revision_repo::RevisionRepository;
use chrono::NaiveDate;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

// ==========================================
// CourseDataRepositoryImpl
// ==========================================
pub struct CourseDataRepositoryImpl {
    course_repo: Arc<CourseRepository>,
    enrollment_repo: Arc<EnrollmentRepository>,
    revision_repo: Arc<RevisionRepository>,
    article_repo: Arc<ArticleRepository>,
    membership_repo: Arc<MembershipRepository>,
}

impl CourseDataRepositoryImpl {
    /// 由各表仓储组合
    ///
    /// membership_repo 的事务覆盖多张表, 各仓储应共用同一连接
    pub fn new(
        course_repo: Arc<CourseRepository>,
        enrollment_repo: Arc<EnrollmentRepository>,
        revision_repo: Arc<RevisionRepository>,
        article_repo: Arc<ArticleRepository>,
        membership_repo: Arc<MembershipRepository>,
    ) -> Self {
        Self {
            course_repo,
            enrollment_repo,
            revision_repo,
            article_repo,
            membership_repo,
        }
    }

    /// 从共享连接创建 (各仓储共用同一连接)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self::new(
            Arc::new(CourseRepository::from_connection(conn.clone())),
            Arc::new(EnrollmentRepository::from_connection(conn.clone())),
            Arc::new(RevisionRepository::from_connection(conn.clone())),
            Arc::new(ArticleRepository::from_connection(conn.clone())),
            Arc::new(MembershipRepository::from_connection(conn)),
        )
    }
}

impl CourseDataRepository for CourseDataRepositoryImpl {
    fn find_course(&self, course_id: i64) -> RepositoryResult<Option<Course>> {
        self.course_repo.find_by_id(course_id)
    }

    fn find_courses_ending_after(&self, cutoff: NaiveDate) -> RepositoryResult<Vec<Course>> {
        self.course_repo.find_current_and_future(cutoff)
    }

    fn find_enrollments(
        &self,
        course_id: i64,
        role: Option<CourseRole>,
    ) -> RepositoryResult<Vec<Enrollment>> {
        self.enrollment_repo.find_by_course(course_id, role)
    }

    fn find_contributors(&self, contributor_ids: &[i64]) -> RepositoryResult<Vec<Contributor>> {
        self.enrollment_repo.find_contributors_by_ids(contributor_ids)
    }

    fn find_revisions_in_window(
        &self,
        contributor_ids: &[i64],
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<Revision>> {
        self.revision_repo
            .find_by_contributors_in_window(contributor_ids, start, end)
    }

    fn find_edited_article_ids(
        &self,
        contributor_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<i64>> {
        self.revision_repo
            .find_article_ids_by_contributor_in_window(contributor_id, start, end)
    }

    fn find_article_editor_ids(&self, article_id: i64) -> RepositoryResult<Vec<i64>> {
        self.revision_repo.find_editor_ids_by_article(article_id)
    }

    fn find_associations(&self, course_id: i64) -> RepositoryResult<Vec<ArticleAssociation>> {
        self.article_repo.find_associations_by_course(course_id)
    }

    fn find_articles(&self, article_ids: &[i64]) -> RepositoryResult<Vec<Article>> {
        self.article_repo.find_by_ids(article_ids)
    }

    fn replace_cached_metrics(&self, course_id: i64, metrics: &CourseMetrics) -> RepositoryResult<()> {
        self.course_repo.replace_cached_metrics(course_id, metrics)
    }

    fn apply_membership_change(
        &self,
        change: &MembershipChange,
    ) -> RepositoryResult<MembershipChangeCounts> {
        self.membership_repo.apply(change)
    }
}
