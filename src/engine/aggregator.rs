// ==========================================
// 课程指标缓存引擎 - 指标聚合器
// ==========================================
// 职责: 根据当前关联数据计算课程的全部缓存指标
// 输入: 课程 + 数据访问能力
// 输出: CourseMetrics (无副作用)
// 红线: Engine 不拼 SQL
// ==========================================

use crate::domain::course::{Course, CourseMetrics};
use crate::engine::error::{MetricsError, MetricsResult};
use crate::repository::CourseDataRepository;
use std::collections::{BTreeSet, HashMap};
use tracing::instrument;

// ==========================================
// MetricsAggregator - 指标聚合器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct MetricsAggregator;

impl MetricsAggregator {
    pub fn new() -> Self {
        Self
    }

    /// 计算课程的全部指标
    ///
    /// # 口径
    /// - character_sum: 学生窗口内编辑的字节增量合计, 负增量照常累加
    /// - view_sum: live 关联的浏览量合计
    /// - user_count: 学生人数, 兼任教师的学生不计
    /// - trained_count: user_count 中已培训人数
    /// - revision_count: 学生窗口内编辑次数
    /// - article_count: 主命名空间且存活的关联条目数
    /// - new_article_count: 关联 live + new_article 且条目在主命名空间
    #[instrument(skip(self, course, data), fields(course_id = course.id))]
    pub fn compute(
        &self,
        course: &Course,
        data: &dyn CourseDataRepository,
    ) -> MetricsResult<CourseMetrics> {
        let course_id = course.id;

        // ===== 选课 =====
        let enrollments = data
            .find_enrollments(course_id, None)
            .map_err(|e| MetricsError::query(course_id, "find_enrollments", e))?;

        let mut student_ids: BTreeSet<i64> = BTreeSet::new();
        let mut instructor_ids: BTreeSet<i64> = BTreeSet::new();
        for enrollment in &enrollments {
            if enrollment.role.counts_as_contributor() {
                student_ids.insert(enrollment.contributor_id);
            } else if enrollment.role.is_instructor() {
                instructor_ids.insert(enrollment.contributor_id);
            }
        }

        let countable_ids: Vec<i64> = student_ids.difference(&instructor_ids).copied().collect();
        let contributors = data
            .find_contributors(&countable_ids)
            .map_err(|e| MetricsError::query(course_id, "find_contributors", e))?;
        let user_count = countable_ids.len() as i64;
        let trained_count = contributors.iter().filter(|c| c.trained).count() as i64;

        // ===== 编辑记录 (窗口由查询按日期闭区间限定) =====
        let student_id_list: Vec<i64> = student_ids.iter().copied().collect();
        let revisions = data
            .find_revisions_in_window(&student_id_list, course.start, course.end)
            .map_err(|e| MetricsError::query(course_id, "find_revisions_in_window", e))?;

        let (character_sum, revision_count) = revisions
            .iter()
            .fold((0i64, 0i64), |(sum, count), r| (sum + r.characters, count + 1));

        // ===== 条目关联 =====
        let associations = data
            .find_associations(course_id)
            .map_err(|e| MetricsError::query(course_id, "find_associations", e))?;

        let view_sum: i64 = associations
            .iter()
            .filter(|a| a.live)
            .map(|a| a.view_count)
            .sum();

        let article_ids: Vec<i64> = associations.iter().map(|a| a.article_id).collect();
        let articles: HashMap<i64, _> = data
            .find_articles(&article_ids)
            .map_err(|e| MetricsError::query(course_id, "find_articles", e))?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        let article_count = associations
            .iter()
            .filter_map(|a| articles.get(&a.article_id))
            .filter(|article| article.is_live() && article.is_mainspace())
            .map(|article| article.id)
            .collect::<BTreeSet<_>>()
            .len() as i64;

        let new_article_count = associations
            .iter()
            .filter(|a| a.live && a.new_article)
            .filter(|a| {
                articles
                    .get(&a.article_id)
                    .map(|article| article.is_mainspace())
                    .unwrap_or(false)
            })
            .count() as i64;

        let metrics = CourseMetrics {
            character_sum,
            view_sum,
            user_count,
            trained_count,
            revision_count,
            article_count,
            new_article_count,
        };

        tracing::debug!(?metrics, "课程指标计算完成");
        Ok(metrics)
    }
}
