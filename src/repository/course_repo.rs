// ==========================================
// 课程指标缓存引擎 - 课程数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 缓存指标列只能七列整体替换, 不允许单列写入
// ==========================================

use crate::domain::course::{CachedMetrics, Course, CourseMetrics, NewCourse};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const COURSE_COLUMNS: &str = r#"
    id, title, slug, school, term, start_date, end_date,
    legacy, listed, submitted,
    character_sum, view_sum, user_count, trained_count,
    revision_count, article_count, new_article_count,
    created_at, updated_at
"#;

// ==========================================
// CourseRepository - 课程仓储
// ==========================================
/// 课程仓储
/// 职责: 管理 courses 表的读写
pub struct CourseRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CourseRepository {
    /// 创建新的 CourseRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建课程
    ///
    /// # 参数
    /// - `course`: 课程入参
    /// - `legacy_course_max_id`: legacy 判定阈值 (id ≤ 阈值 即 legacy)
    ///
    /// # 说明
    /// legacy 在此处一次性写入, 之后阈值配置变化不影响已有课程
    pub fn create(&self, course: &NewCourse, legacy_course_max_id: i64) -> RepositoryResult<Course> {
        let now = Utc::now().naive_utc();
        let legacy = course.is_legacy_under(legacy_course_max_id);

        {
            let conn = self.get_conn()?;
            conn.execute(
                r#"
                INSERT INTO courses (
                    id, title, slug, school, term, start_date, end_date,
                    legacy, listed, submitted, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
                "#,
                params![
                    course.id,
                    course.title,
                    course.slug,
                    course.school,
                    course.term,
                    course.start,
                    course.end,
                    legacy,
                    course.listed,
                    course.submitted,
                    now,
                ],
            )?;
        }

        self.find_by_id(course.id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "Course".to_string(),
            id: course.id.to_string(),
        })
    }

    /// 按主键查询
    pub fn find_by_id(&self, course_id: i64) -> RepositoryResult<Option<Course>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM courses WHERE id = ?1", COURSE_COLUMNS);
        let course = conn
            .query_row(&sql, params![course_id], map_course_row)
            .optional()?;
        Ok(course)
    }

    /// 查询全部课程
    pub fn find_all(&self) -> RepositoryResult<Vec<Course>> {
        self.query_courses("1 = 1", &[])
    }

    /// 查询结束日期晚于截止日的课程 (当前及未来课程)
    ///
    /// # 参数
    /// - `cutoff`: 截止日 (通常为 今天 - 宽限期)
    pub fn find_current_and_future(&self, cutoff: NaiveDate) -> RepositoryResult<Vec<Course>> {
        self.query_courses("end_date > ?1", &[&cutoff])
    }

    /// 查询当前课程: 已开课, 且结束日期晚于截止日
    pub fn find_current(&self, cutoff: NaiveDate, today: NaiveDate) -> RepositoryResult<Vec<Course>> {
        self.query_courses("end_date > ?1 AND start_date < ?2", &[&cutoff, &today])
    }

    /// 查询公开列出的课程
    pub fn find_listed(&self) -> RepositoryResult<Vec<Course>> {
        self.query_courses("listed = 1", &[])
    }

    /// 查询已列出但未提交的非 legacy 课程
    pub fn find_unsubmitted_listed(&self) -> RepositoryResult<Vec<Course>> {
        self.query_courses("listed = 1 AND submitted = 0 AND legacy = 0", &[])
    }

    /// 查询已列出且已提交的课程
    pub fn find_submitted_listed(&self) -> RepositoryResult<Vec<Course>> {
        self.query_courses("listed = 1 AND submitted = 1", &[])
    }

    /// 取消列出
    pub fn delist(&self, course_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE courses SET listed = 0, updated_at = ?2 WHERE id = ?1",
            params![course_id, Utc::now().naive_utc()],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Course".to_string(),
                id: course_id.to_string(),
            });
        }
        Ok(())
    }

    /// 整体替换七个缓存指标列
    ///
    /// 单条 UPDATE + 事务, 要么全部写入, 要么全部不变
    pub fn replace_cached_metrics(
        &self,
        course_id: i64,
        metrics: &CourseMetrics,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let affected = tx.execute(
            r#"
            UPDATE courses
            SET character_sum = ?2,
                view_sum = ?3,
                user_count = ?4,
                trained_count = ?5,
                revision_count = ?6,
                article_count = ?7,
                new_article_count = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
            params![
                course_id,
                metrics.character_sum,
                metrics.view_sum,
                metrics.user_count,
                metrics.trained_count,
                metrics.revision_count,
                metrics.article_count,
                metrics.new_article_count,
                Utc::now().naive_utc(),
            ],
        )?;

        if affected == 0 {
            // tx 在 drop 时回滚
            return Err(RepositoryError::NotFound {
                entity: "Course".to_string(),
                id: course_id.to_string(),
            });
        }

        tx.commit()?;
        Ok(())
    }

    fn query_courses(
        &self,
        filter: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> RepositoryResult<Vec<Course>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM courses WHERE {} ORDER BY id ASC",
            COURSE_COLUMNS, filter
        );
        let mut stmt = conn.prepare(&sql)?;
        let courses = stmt
            .query_map(args, map_course_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(courses)
    }
}

// ==========================================
// 辅助函数
// ==========================================

fn map_course_row(row: &Row<'_>) -> SqliteResult<Course> {
    Ok(Course {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        school: row.get(3)?,
        term: row.get(4)?,
        start: row.get(5)?,
        end: row.get(6)?,
        legacy: row.get(7)?,
        listed: row.get(8)?,
        submitted: row.get(9)?,
        cached: CachedMetrics {
            character_sum: row.get(10)?,
            view_sum: row.get(11)?,
            user_count: row.get(12)?,
            trained_count: row.get(13)?,
            revision_count: row.get(14)?,
            article_count: row.get(15)?,
            new_article_count: row.get(16)?,
        },
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}
