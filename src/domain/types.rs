// ==========================================
// 课程指标缓存引擎 - 领域类型定义
// ==========================================
// 职责: 选课角色 / 指标名称 / 命名空间常量
// 红线: 角色不用整数比较,只用具名谓词
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 主条目命名空间 (article_count / new_article_count 只统计该命名空间)
pub const MAINSPACE_NAMESPACE: i32 = 0;

// ==========================================
// 选课角色 (Course Role)
// ==========================================
// 存储: courses_users.role 整数编码 (0=学生, 1=教师, >1=志愿者)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseRole {
    Student,    // 学生
    Instructor, // 教师
    Volunteer,  // 志愿者
}

impl CourseRole {
    /// 从数据库整数编码解析
    ///
    /// 负数按学生处理 (历史数据中不存在, 仅兜底)
    pub fn from_db_code(code: i64) -> Self {
        match code {
            i64::MIN..=0 => CourseRole::Student,
            1 => CourseRole::Instructor,
            _ => CourseRole::Volunteer,
        }
    }

    /// 转换为数据库整数编码
    pub fn to_db_code(self) -> i64 {
        match self {
            CourseRole::Student => 0,
            CourseRole::Instructor => 1,
            CourseRole::Volunteer => 2,
        }
    }

    pub fn is_student(self) -> bool {
        self == CourseRole::Student
    }

    pub fn is_instructor(self) -> bool {
        self == CourseRole::Instructor
    }

    /// 是否计入贡献类指标 (字符数/编辑数/学生人数)
    pub fn counts_as_contributor(self) -> bool {
        self.is_student()
    }
}

impl fmt::Display for CourseRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CourseRole::Student => write!(f, "STUDENT"),
            CourseRole::Instructor => write!(f, "INSTRUCTOR"),
            CourseRole::Volunteer => write!(f, "VOLUNTEER"),
        }
    }
}

// ==========================================
// 指标名称 (Metric Name)
// ==========================================
// 与 courses 表缓存列一一对应
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    CharacterSum,    // 字符增量合计
    ViewSum,         // 浏览量合计
    UserCount,       // 学生人数 (不含兼任教师)
    TrainedCount,    // 已培训学生人数
    RevisionCount,   // 编辑次数
    ArticleCount,    // 涉及条目数
    NewArticleCount, // 新建条目数
}

impl MetricName {
    pub const ALL: [MetricName; 7] = [
        MetricName::CharacterSum,
        MetricName::ViewSum,
        MetricName::UserCount,
        MetricName::TrainedCount,
        MetricName::RevisionCount,
        MetricName::ArticleCount,
        MetricName::NewArticleCount,
    ];

    /// 对应的缓存列名
    pub fn column(self) -> &'static str {
        match self {
            MetricName::CharacterSum => "character_sum",
            MetricName::ViewSum => "view_sum",
            MetricName::UserCount => "user_count",
            MetricName::TrainedCount => "trained_count",
            MetricName::RevisionCount => "revision_count",
            MetricName::ArticleCount => "article_count",
            MetricName::NewArticleCount => "new_article_count",
        }
    }

    /// 从列名解析 (大小写不敏感)
    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase();
        MetricName::ALL.into_iter().find(|m| m.column() == key)
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}
