// ==========================================
// 课程指标缓存引擎 - 选课领域模型
// ==========================================
// 对齐: contributors 表 / courses_users 表
// ==========================================

use crate::domain::types::CourseRole;
use serde::{Deserialize, Serialize};

/// 贡献者
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub id: i64,
    pub username: String,
    pub trained: bool, // 外部培训标记
}

/// 选课关系
///
/// 同一贡献者可以以不同角色多次加入同一课程 (例如教师兼学生)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub course_id: i64,
    pub contributor_id: i64,
    pub role: CourseRole,
}

impl Enrollment {
    pub fn new(course_id: i64, contributor_id: i64, role: CourseRole) -> Self {
        Self {
            course_id,
            contributor_id,
            role,
        }
    }
}
