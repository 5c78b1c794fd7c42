// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use course_metrics::domain::{
    Article, ArticleAssociation, Contributor, Course, CourseMetrics, Enrollment, NewCourse,
    Revision,
};
use course_metrics::domain::CourseRole;
use course_metrics::repository::{
    ArticleRepository, CourseDataRepository, CourseDataRepositoryImpl, CourseRepository,
    EnrollmentRepository, MembershipChange, MembershipChangeCounts, MembershipRepository,
    RepositoryError, RepositoryResult, RevisionRepository,
};
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

pub const LEGACY_MAX_ID: i64 = 9999;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_test_connection(&db_path)?;
    course_metrics::db::ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库连接（统一 PRAGMA）
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(course_metrics::db::open_sqlite_connection(db_path)?)
}

/// 写入 global 配置项
pub fn insert_test_config(conn: &Connection, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    conn.execute(
        r#"
        INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
        ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2
        "#,
        params![key, value],
    )?;
    Ok(())
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

// ==========================================
// TestWorld - 共享连接上的仓储集合
// ==========================================
pub struct TestWorld {
    pub conn: Arc<Mutex<Connection>>,
    pub courses: Arc<CourseRepository>,
    pub enrollments: Arc<EnrollmentRepository>,
    pub revisions: Arc<RevisionRepository>,
    pub articles: Arc<ArticleRepository>,
    pub data: Arc<CourseDataRepositoryImpl>,
}

impl TestWorld {
    pub fn open(db_path: &str) -> Self {
        let conn = Arc::new(Mutex::new(open_test_connection(db_path).unwrap()));
        let courses = Arc::new(CourseRepository::from_connection(conn.clone()));
        let enrollments = Arc::new(EnrollmentRepository::from_connection(conn.clone()));
        let revisions = Arc::new(RevisionRepository::from_connection(conn.clone()));
        let articles = Arc::new(ArticleRepository::from_connection(conn.clone()));
        let data = Arc::new(CourseDataRepositoryImpl::new(
            courses.clone(),
            enrollments.clone(),
            revisions.clone(),
            articles.clone(),
            Arc::new(MembershipRepository::from_connection(conn.clone())),
        ));
        Self {
            conn,
            courses,
            enrollments,
            revisions,
            articles,
            data,
        }
    }

    // ===== 数据播种 =====

    pub fn course(&self, id: i64, start: &str, end: &str) -> Course {
        self.courses
            .create(
                &NewCourse {
                    id,
                    title: format!("Course {}", id),
                    slug: format!("Test University/Course {} (Spring)", id),
                    school: Some("Test University".to_string()),
                    term: Some("Spring".to_string()),
                    start: date(start),
                    end: date(end),
                    listed: true,
                    submitted: false,
                },
                LEGACY_MAX_ID,
            )
            .unwrap()
    }

    pub fn reload(&self, id: i64) -> Course {
        self.courses.find_by_id(id).unwrap().unwrap()
    }

    pub fn contributor(&self, id: i64, trained: bool) {
        self.enrollments
            .upsert_contributor(&Contributor {
                id,
                username: format!("editor{}", id),
                trained,
            })
            .unwrap();
    }

    pub fn enroll(&self, course_id: i64, contributor_id: i64, role: CourseRole) {
        self.enrollments
            .enroll(&Enrollment::new(course_id, contributor_id, role))
            .unwrap();
    }

    /// 创建贡献者并以学生身份加入
    pub fn student(&self, course_id: i64, contributor_id: i64) {
        self.contributor(contributor_id, false);
        self.enroll(course_id, contributor_id, CourseRole::Student);
    }

    pub fn article(&self, id: i64, namespace: i32) {
        self.articles
            .upsert_article(&Article {
                id,
                title: format!("Article_{}", id),
                namespace,
                deleted: false,
            })
            .unwrap();
    }

    pub fn associate(&self, course_id: i64, article_id: i64, views: i64, new_article: bool) {
        self.articles
            .upsert_association(&ArticleAssociation {
                article_id,
                course_id,
                view_count: views,
                live: true,
                new_article,
            })
            .unwrap();
    }

    pub fn revision(&self, id: i64, contributor_id: i64, article_id: i64, at: &str, characters: i64) {
        self.revisions
            .insert(&Revision {
                id,
                contributor_id,
                article_id,
                date: datetime(at),
                characters,
            })
            .unwrap();
    }

    pub fn associated_article_ids(&self, course_id: i64) -> Vec<i64> {
        self.articles
            .find_associations_by_course(course_id)
            .unwrap()
            .into_iter()
            .map(|a| a.article_id)
            .collect()
    }
}

// ==========================================
// InstrumentedRepository - 可注入故障/可计数的数据访问包装
// ==========================================
// fail_persistence: replace_cached_metrics 失败
// fail_queries: find_associations / find_courses_ending_after 失败
pub struct InstrumentedRepository {
    inner: Arc<dyn CourseDataRepository>,
    pub fail_persistence: AtomicBool,
    pub fail_queries: AtomicBool,
    pub replace_calls: AtomicUsize,
}

impl InstrumentedRepository {
    pub fn new(inner: Arc<dyn CourseDataRepository>) -> Self {
        Self {
            inner,
            fail_persistence: AtomicBool::new(false),
            fail_queries: AtomicBool::new(false),
            replace_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_fail_persistence(&self, fail: bool) {
        self.fail_persistence.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    fn check_query(&self) -> RepositoryResult<()> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(RepositoryError::DatabaseQueryError(
                "simulated database is locked".to_string(),
            ));
        }
        Ok(())
    }

    pub fn replace_count(&self) -> usize {
        self.replace_calls.load(Ordering::SeqCst)
    }
}

impl CourseDataRepository for InstrumentedRepository {
    fn find_course(&self, course_id: i64) -> RepositoryResult<Option<Course>> {
        self.inner.find_course(course_id)
    }

    fn find_courses_ending_after(&self, cutoff: NaiveDate) -> RepositoryResult<Vec<Course>> {
        self.check_query()?;
        self.inner.find_courses_ending_after(cutoff)
    }

    fn find_enrollments(
        &self,
        course_id: i64,
        role: Option<CourseRole>,
    ) -> RepositoryResult<Vec<Enrollment>> {
        self.inner.find_enrollments(course_id, role)
    }

    fn find_contributors(&self, contributor_ids: &[i64]) -> RepositoryResult<Vec<Contributor>> {
        self.inner.find_contributors(contributor_ids)
    }

    fn find_revisions_in_window(
        &self,
        contributor_ids: &[i64],
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<Revision>> {
        self.inner.find_revisions_in_window(contributor_ids, start, end)
    }

    fn find_edited_article_ids(
        &self,
        contributor_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<i64>> {
        self.inner.find_edited_article_ids(contributor_id, start, end)
    }

    fn find_article_editor_ids(&self, article_id: i64) -> RepositoryResult<Vec<i64>> {
        self.inner.find_article_editor_ids(article_id)
    }

    fn find_associations(&self, course_id: i64) -> RepositoryResult<Vec<ArticleAssociation>> {
        self.check_query()?;
        self.inner.find_associations(course_id)
    }

    fn find_articles(&self, article_ids: &[i64]) -> RepositoryResult<Vec<Article>> {
        self.inner.find_articles(article_ids)
    }

    fn replace_cached_metrics(&self, course_id: i64, metrics: &CourseMetrics) -> RepositoryResult<()> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_persistence.load(Ordering::SeqCst) {
            return Err(RepositoryError::DatabaseQueryError(
                "simulated disk I/O error".to_string(),
            ));
        }
        self.inner.replace_cached_metrics(course_id, metrics)
    }

    fn apply_membership_change(
        &self,
        change: &MembershipChange,
    ) -> RepositoryResult<MembershipChangeCounts> {
        self.inner.apply_membership_change(change)
    }
}
