// ==========================================
// 课程指标缓存引擎 - 成员变更提交仓储
// ==========================================
// 职责: 成员清理的全部写入在同一事务内提交
// 涉及: courses_users (选课) / articles_courses (关联) / courses (缓存作废)
// 红线: 任一语句失败整体回滚, 不留下"选课已删但关联未删"的中间状态
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

/// 一次成员清理需要提交的变更
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipChange {
    pub course_id: i64,
    /// Some 时删除该贡献者在课程中的全部选课记录 (所有角色)
    pub remove_contributor_id: Option<i64>,
    pub orphaned_article_ids: Vec<i64>,
    /// 删除了关联时同时把课程缓存置为未计算
    pub invalidate_cache: bool,
}

/// 提交结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MembershipChangeCounts {
    pub enrollments_removed: usize,
    pub associations_deleted: usize,
    pub cache_invalidated: bool,
}

// ==========================================
// MembershipRepository
// ==========================================
pub struct MembershipRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MembershipRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 单事务提交成员变更
    ///
    /// 缓存只在确有关联被删除时作废; 作废后由惰性读取或后续刷新重新填充
    pub fn apply(&self, change: &MembershipChange) -> RepositoryResult<MembershipChangeCounts> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let mut counts = MembershipChangeCounts::default();

        if let Some(contributor_id) = change.remove_contributor_id {
            counts.enrollments_removed = tx.execute(
                "DELETE FROM courses_users WHERE course_id = ?1 AND contributor_id = ?2",
                params![change.course_id, contributor_id],
            )?;
        }

        for article_id in &change.orphaned_article_ids {
            counts.associations_deleted += tx.execute(
                "DELETE FROM articles_courses WHERE course_id = ?1 AND article_id = ?2",
                params![change.course_id, article_id],
            )?;
        }

        if change.invalidate_cache && counts.associations_deleted > 0 {
            tx.execute(
                r#"
                UPDATE courses
                SET character_sum = NULL,
                    view_sum = NULL,
                    user_count = NULL,
                    trained_count = NULL,
                    revision_count = NULL,
                    article_count = NULL,
                    new_article_count = NULL,
                    updated_at = ?2
                WHERE id = ?1
                "#,
                params![change.course_id, Utc::now().naive_utc()],
            )?;
            counts.cache_invalidated = true;
        }

        tx.commit()?;
        Ok(counts)
    }
}
