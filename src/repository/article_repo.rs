// ==========================================
// 课程指标缓存引擎 - 条目/课程关联数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 本仓储不删除条目 (articles); 关联删除见 membership_repo
// ==========================================

use crate::domain::article::{Article, ArticleAssociation};
use crate::repository::in_clause::{placeholders, IN_CLAUSE_CHUNK_SIZE};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, params_from_iter, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// ArticleRepository - 条目仓储
// ==========================================
pub struct ArticleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ArticleRepository {
    /// 创建新的 ArticleRepository 实例
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

    // ===== 条目 =====

    /// 新增或更新条目
    pub fn upsert_article(&self, article: &Article) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO articles (id, title, namespace, deleted) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET title = ?2, namespace = ?3, deleted = ?4
            "#,
            params![article.id, article.title, article.namespace, article.deleted],
        )?;
        Ok(())
    }

    /// 按 ID 批量查询条目
    ///
    /// 不存在的 ID 不会出现在结果中; ID 过多时分块查询
    pub fn find_by_ids(&self, ids: &[i64]) -> RepositoryResult<Vec<Article>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let mut articles = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(IN_CLAUSE_CHUNK_SIZE) {
            let sql = format!(
                "SELECT id, title, namespace, deleted FROM articles WHERE id IN ({})",
                placeholders(chunk.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), |row| {
                    Ok(Article {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        namespace: row.get(2)?,
                        deleted: row.get(3)?,
                    })
                })?
                .collect::<SqliteResult<Vec<_>>>()?;
            articles.extend(rows);
        }

        articles.sort_by_key(|a| a.id);
        articles.dedup_by_key(|x| x.id);
        Ok(articles)
    }

    // ===== 课程关联 =====

    /// 新增或覆盖课程关联
    pub fn upsert_association(&self, association: &ArticleAssociation) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO articles_courses (article_id, course_id, view_count, live, new_article)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(article_id, course_id)
            DO UPDATE SET view_count = ?3, live = ?4, new_article = ?5
            "#,
            params![
                association.article_id,
                association.course_id,
                association.view_count,
                association.live,
                association.new_article,
            ],
        )?;
        Ok(())
    }

    /// 查询课程的全部条目关联
    pub fn find_associations_by_course(
        &self,
        course_id: i64,
    ) -> RepositoryResult<Vec<ArticleAssociation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT article_id, course_id, view_count, live, new_article
            FROM articles_courses
            WHERE course_id = ?1
            ORDER BY article_id ASC
            "#,
        )?;

        let associations = stmt
            .query_map(params![course_id], |row| {
                Ok(ArticleAssociation {
                    article_id: row.get(0)?,
                    course_id: row.get(1)?,
                    view_count: row.get(2)?,
                    live: row.get(3)?,
                    new_article: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(associations)
    }
}
