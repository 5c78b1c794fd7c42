// ==========================================
// 课程指标缓存引擎 - 选课数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 存储: contributors / courses_users
// ==========================================

use crate::domain::enrollment::{Contributor, Enrollment};
use crate::domain::types::CourseRole;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::in_clause::{placeholders, IN_CLAUSE_CHUNK_SIZE};
use rusqlite::{params, params_from_iter, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// EnrollmentRepository - 选课仓储
// ==========================================
pub struct EnrollmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EnrollmentRepository {
    /// 创建新的 EnrollmentRepository 实例
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

    // ===== 贡献者 =====

    /// 新增或更新贡献者
    pub fn upsert_contributor(&self, contributor: &Contributor) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO contributors (id, username, trained) VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET username = ?2, trained = ?3
            "#,
            params![contributor.id, contributor.username, contributor.trained],
        )?;
        Ok(())
    }

    /// 按 ID 批量查询贡献者 (ID 过多时分块查询)
    pub fn find_contributors_by_ids(&self, ids: &[i64]) -> RepositoryResult<Vec<Contributor>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let mut contributors = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(IN_CLAUSE_CHUNK_SIZE) {
            let sql = format!(
                "SELECT id, username, trained FROM contributors WHERE id IN ({})",
                placeholders(chunk.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), |row| {
                    Ok(Contributor {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        trained: row.get(2)?,
                    })
                })?
                .collect::<SqliteResult<Vec<_>>>()?;
            contributors.extend(rows);
        }

        contributors.sort_by_key(|c| c.id);
        contributors.dedup_by_key(|x| x.id);
        Ok(contributors)
    }

    // ===== 选课关系 =====

    /// 新增选课关系 (同角色重复加入时忽略)
    pub fn enroll(&self, enrollment: &Enrollment) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR IGNORE INTO courses_users (course_id, contributor_id, role)
            VALUES (?1, ?2, ?3)
            "#,
            params![
                enrollment.course_id,
                enrollment.contributor_id,
                enrollment.role.to_db_code()
            ],
        )?;
        Ok(())
    }

    /// 删除贡献者在课程中的全部选课关系 (所有角色)
    ///
    /// # 返回
    /// - Ok(usize): 删除的行数
    pub fn remove(&self, course_id: i64, contributor_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM courses_users WHERE course_id = ?1 AND contributor_id = ?2",
            params![course_id, contributor_id],
        )?;
        Ok(affected)
    }

    /// 查询课程的选课关系
    ///
    /// # 参数
    /// - `role`: None 表示全部角色
    pub fn find_by_course(
        &self,
        course_id: i64,
        role: Option<CourseRole>,
    ) -> RepositoryResult<Vec<Enrollment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT course_id, contributor_id, role
            FROM courses_users
            WHERE course_id = ?1
            ORDER BY contributor_id ASC, role ASC
            "#,
        )?;

        let enrollments = stmt
            .query_map(params![course_id], |row| {
                Ok(Enrollment {
                    course_id: row.get(0)?,
                    contributor_id: row.get(1)?,
                    role: CourseRole::from_db_code(row.get(2)?),
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        // 角色过滤放在映射之后: 志愿者是 role > 1 的区间, 不能用等值过滤
        Ok(match role {
            Some(r) => enrollments.into_iter().filter(|e| e.role == r).collect(),
            None => enrollments,
        })
    }
}
