// ==========================================
// 课程指标缓存引擎 - 条目/编辑领域模型
// ==========================================
// 对齐: articles / articles_courses / revisions 表
// 红线: Revision 只追加, 本引擎不修改不删除
// 红线: 孤立清理只删除 ArticleAssociation, 不删除 Article
// ==========================================

use crate::domain::types::MAINSPACE_NAMESPACE;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Article - 条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub namespace: i32,
    pub deleted: bool, // 已删除/重定向
}

impl Article {
    pub fn is_live(&self) -> bool {
        !self.deleted
    }

    pub fn is_mainspace(&self) -> bool {
        self.namespace == MAINSPACE_NAMESPACE
    }
}

// ==========================================
// ArticleAssociation - 条目与课程的关联
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleAssociation {
    pub article_id: i64,
    pub course_id: i64,
    pub view_count: i64,    // 浏览量快照
    pub live: bool,         // 条目当前是否存活
    pub new_article: bool,  // 条目是否在课程窗口内新建
}

// ==========================================
// Revision - 编辑记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub id: i64,
    pub contributor_id: i64,
    pub article_id: i64,
    pub date: NaiveDateTime,
    pub characters: i64, // 字节增量 (可为负)
}
