// ==========================================
// 课程指标缓存引擎 - 课程领域模型
// ==========================================
// 对齐: courses 表
// 红线: 缓存指标列只由 CacheController 写入
// 红线: legacy 在创建时确定, 之后不再重新判定
// ==========================================

use crate::domain::types::MetricName;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// legacy 课程页面前缀 (EducationProgram 扩展导入的课程)
pub const LEGACY_WIKI_PREFIX: &str = "Education_Program:";

// ==========================================
// CachedMetrics - 课程缓存指标
// ==========================================
// None 表示从未计算, Some(0) 表示已计算且结果为 0
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedMetrics {
    pub character_sum: Option<i64>,
    pub view_sum: Option<i64>,
    pub user_count: Option<i64>,
    pub trained_count: Option<i64>,
    pub revision_count: Option<i64>,
    pub article_count: Option<i64>,
    pub new_article_count: Option<i64>,
}

impl CachedMetrics {
    /// 读取单个缓存指标
    pub fn get(&self, name: MetricName) -> Option<i64> {
        match name {
            MetricName::CharacterSum => self.character_sum,
            MetricName::ViewSum => self.view_sum,
            MetricName::UserCount => self.user_count,
            MetricName::TrainedCount => self.trained_count,
            MetricName::RevisionCount => self.revision_count,
            MetricName::ArticleCount => self.article_count,
            MetricName::NewArticleCount => self.new_article_count,
        }
    }

    /// 所有指标都已计算
    pub fn is_complete(&self) -> bool {
        MetricName::ALL.iter().all(|m| self.get(*m).is_some())
    }

    /// 没有任何指标被计算过
    pub fn is_unset(&self) -> bool {
        MetricName::ALL.iter().all(|m| self.get(*m).is_none())
    }
}

impl From<CourseMetrics> for CachedMetrics {
    fn from(m: CourseMetrics) -> Self {
        Self {
            character_sum: Some(m.character_sum),
            view_sum: Some(m.view_sum),
            user_count: Some(m.user_count),
            trained_count: Some(m.trained_count),
            revision_count: Some(m.revision_count),
            article_count: Some(m.article_count),
            new_article_count: Some(m.new_article_count),
        }
    }
}

// ==========================================
// CourseMetrics - 一次完整重算的结果
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseMetrics {
    pub character_sum: i64,     // 学生编辑字节增量合计 (含负增量)
    pub view_sum: i64,          // live 关联的浏览量合计
    pub user_count: i64,        // 学生人数 (不含兼任教师)
    pub trained_count: i64,     // 已培训学生人数
    pub revision_count: i64,    // 窗口内学生编辑次数
    pub article_count: i64,     // 主命名空间 live 条目数
    pub new_article_count: i64, // 主命名空间 live 新建条目数
}

impl CourseMetrics {
    pub fn get(&self, name: MetricName) -> i64 {
        match name {
            MetricName::CharacterSum => self.character_sum,
            MetricName::ViewSum => self.view_sum,
            MetricName::UserCount => self.user_count,
            MetricName::TrainedCount => self.trained_count,
            MetricName::RevisionCount => self.revision_count,
            MetricName::ArticleCount => self.article_count,
            MetricName::NewArticleCount => self.new_article_count,
        }
    }
}

// ==========================================
// Course - 课程
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    // ===== 主键 =====
    pub id: i64,

    // ===== 描述信息 =====
    pub title: String,
    pub slug: String,
    pub school: Option<String>,
    pub term: Option<String>,

    // ===== 时间窗口 (闭区间) =====
    pub start: NaiveDate,
    pub end: NaiveDate,

    // ===== 分类与状态 =====
    pub legacy: bool,    // 创建时确定
    pub listed: bool,    // 是否公开列出
    pub submitted: bool, // 是否已提交审核

    // ===== 缓存指标 =====
    pub cached: CachedMetrics,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Course {
    /// 是否为"当前"课程: 结束日期晚于截止日
    pub fn is_current_as_of(&self, cutoff: NaiveDate) -> bool {
        self.end > cutoff
    }

    /// wiki 页面标题
    ///
    /// legacy 课程使用 `Education_Program:` 前缀, 其余使用配置的课程前缀
    pub fn wiki_title(&self, course_prefix: &str) -> String {
        let escaped_slug = self.slug.replace(' ', "_");
        if self.legacy {
            format!("{}{}", LEGACY_WIKI_PREFIX, escaped_slug)
        } else {
            format!("{}/{}", course_prefix, escaped_slug)
        }
    }

    /// wiki 页面地址
    pub fn url(&self, wiki_language: &str, course_prefix: &str) -> String {
        format!(
            "https://{}.wikipedia.org/wiki/{}",
            wiki_language,
            self.wiki_title(course_prefix)
        )
    }
}

// ==========================================
// NewCourse - 创建课程入参
// ==========================================
// legacy 不由调用方指定, 由仓储在创建时按阈值判定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub school: Option<String>,
    pub term: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub listed: bool,
    pub submitted: bool,
}

impl NewCourse {
    /// 按 legacy 阈值判定分类
    pub fn is_legacy_under(&self, legacy_course_max_id: i64) -> bool {
        self.id <= legacy_course_max_id
    }
}
