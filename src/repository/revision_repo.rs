// ==========================================
// 课程指标缓存引擎 - 编辑记录数据仓储
// ==========================================
// 红线: revisions 只追加, 不提供更新/删除
// 窗口口径: date(revisions.date) 落在 [start, end] 闭区间
// ==========================================

use crate::domain::article::Revision;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::in_clause::{placeholders, IN_CLAUSE_CHUNK_SIZE};
use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, types::Value, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// RevisionRepository - 编辑记录仓储
// ==========================================
pub struct RevisionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RevisionRepository {
    /// 创建新的 RevisionRepository 实例
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

    /// 追加编辑记录
    pub fn insert(&self, revision: &Revision) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO revisions (id, contributor_id, article_id, date, characters)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                revision.id,
                revision.contributor_id,
                revision.article_id,
                revision.date,
                revision.characters,
            ],
        )?;
        Ok(())
    }

    /// 查询一组贡献者在窗口内的编辑记录
    ///
    /// 贡献者过多时分块查询, 合并后按 (date, id) 排序
    pub fn find_by_contributors_in_window(
        &self,
        contributor_ids: &[i64],
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<Revision>> {
        if contributor_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let mut revisions = Vec::new();

        for chunk in contributor_ids.chunks(IN_CLAUSE_CHUNK_SIZE) {
            let n = chunk.len();
            let sql = format!(
                r#"
                SELECT id, contributor_id, article_id, date, characters
                FROM revisions
                WHERE contributor_id IN ({})
                  AND date(date) >= ?{}
                  AND date(date) <= ?{}
                "#,
                placeholders(n),
                n + 1,
                n + 2
            );

            let mut args: Vec<Value> = chunk.iter().map(|id| Value::Integer(*id)).collect();
            args.push(Value::Text(start.to_string()));
            args.push(Value::Text(end.to_string()));

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(args.iter()), |row| {
                    Ok(Revision {
                        id: row.get(0)?,
                        contributor_id: row.get(1)?,
                        article_id: row.get(2)?,
                        date: row.get(3)?,
                        characters: row.get(4)?,
                    })
                })?
                .collect::<SqliteResult<Vec<_>>>()?;
            revisions.extend(rows);
        }

        revisions.sort_by_key(|r| (r.date, r.id));
        revisions.dedup_by_key(|x| x.id);
        Ok(revisions)
    }

    /// 查询贡献者在窗口内编辑过的条目 ID (去重)
    pub fn find_article_ids_by_contributor_in_window(
        &self,
        contributor_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT article_id
            FROM revisions
            WHERE contributor_id = ?1
              AND date(date) >= ?2
              AND date(date) <= ?3
            ORDER BY article_id ASC
            "#,
        )?;

        let ids = stmt
            .query_map(params![contributor_id, start, end], |row| row.get(0))?
            .collect::<SqliteResult<Vec<i64>>>()?;
        Ok(ids)
    }

    /// 查询条目的全部编辑者 (不限时间窗口, 去重)
    pub fn find_editor_ids_by_article(&self, article_id: i64) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT contributor_id
            FROM revisions
            WHERE article_id = ?1
            ORDER BY contributor_id ASC
            "#,
        )?;

        let ids = stmt
            .query_map(params![article_id], |row| row.get(0))?
            .collect::<SqliteResult<Vec<i64>>>()?;
        Ok(ids)
    }
}
