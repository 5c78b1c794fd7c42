// ==========================================
// MetricsAggregator 集成测试
// ==========================================
// 测试目标: 各指标口径 (文件数据库 + 完整仓储栈)
// ==========================================

mod test_helpers;

use course_metrics::domain::{Article, ArticleAssociation, CourseRole, MAINSPACE_NAMESPACE};
use course_metrics::engine::MetricsAggregator;
use course_metrics::logging;
use test_helpers::{create_test_db, TestWorld};

/// 字节增量按原值累加, 删除内容的负增量会抵减总数
///
/// 该口径是否应改为绝对值尚待产品确认, 本测试锁定当前行为
#[test]
fn test_character_sum_adds_negative_deltas_literally() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let world = TestWorld::open(&db_path);

    let course = world.course(10001, "2015-01-10", "2015-05-10");
    world.student(10001, 1);
    world.article(100, MAINSPACE_NAMESPACE);
    world.revision(1, 1, 100, "2015-02-01 10:00:00", -50);
    world.revision(2, 1, 100, "2015-02-02 10:00:00", 200);

    let metrics = MetricsAggregator::new().compute(&course, world.data.as_ref()).unwrap();
    assert_eq!(metrics.character_sum, 150);
    assert_eq!(metrics.revision_count, 2);
}

#[test]
fn test_only_student_revisions_inside_window_count() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let world = TestWorld::open(&db_path);

    let course = world.course(10001, "2015-01-10", "2015-05-10");
    world.student(10001, 1);
    world.contributor(2, false);
    world.enroll(10001, 2, CourseRole::Instructor);
    world.contributor(3, false);
    world.enroll(10001, 3, CourseRole::Volunteer);
    world.article(100, MAINSPACE_NAMESPACE);

    world.revision(1, 1, 100, "2015-01-10 00:00:00", 10); // 首日
    world.revision(2, 1, 100, "2015-05-10 23:59:59", 20); // 末日
    world.revision(3, 1, 100, "2015-05-11 00:00:00", 40); // 窗口外
    world.revision(4, 1, 100, "2015-01-09 23:59:59", 80); // 窗口外
    world.revision(5, 2, 100, "2015-02-01 10:00:00", 160); // 教师
    world.revision(6, 3, 100, "2015-02-01 10:00:00", 320); // 志愿者

    let metrics = MetricsAggregator::new().compute(&course, world.data.as_ref()).unwrap();
    assert_eq!(metrics.character_sum, 30);
    assert_eq!(metrics.revision_count, 2);
    assert_eq!(metrics.user_count, 1);
}

#[test]
fn test_article_counts_respect_namespace_and_liveness() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let world = TestWorld::open(&db_path);

    let course = world.course(10001, "2015-01-10", "2015-05-10");

    world.article(1, MAINSPACE_NAMESPACE);
    world.article(2, 2); // User 命名空间
    world
        .articles
        .upsert_article(&Article {
            id: 3,
            title: "Deleted".to_string(),
            namespace: MAINSPACE_NAMESPACE,
            deleted: true,
        })
        .unwrap();

    world.associate(10001, 1, 100, true);
    world.associate(10001, 2, 10, true);
    world.associate(10001, 3, 1, false);
    // 关联已标记非 live: 浏览量与新建数都不计
    world
        .articles
        .upsert_association(&ArticleAssociation {
            article_id: 4,
            course_id: 10001,
            view_count: 1000,
            live: false,
            new_article: true,
        })
        .unwrap();

    let metrics = MetricsAggregator::new().compute(&course, world.data.as_ref()).unwrap();
    assert_eq!(metrics.article_count, 1);
    assert_eq!(metrics.new_article_count, 1);
    assert_eq!(metrics.view_sum, 111);
}

#[test]
fn test_trained_count_excludes_instructor_students() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let world = TestWorld::open(&db_path);

    let course = world.course(10001, "2015-01-10", "2015-05-10");
    world.contributor(1, true);
    world.contributor(2, true);
    world.contributor(3, false);
    world.enroll(10001, 1, CourseRole::Student);
    world.enroll(10001, 2, CourseRole::Student);
    world.enroll(10001, 2, CourseRole::Instructor);
    world.enroll(10001, 3, CourseRole::Student);

    let metrics = MetricsAggregator::new().compute(&course, world.data.as_ref()).unwrap();
    assert_eq!(metrics.user_count, 2);
    assert_eq!(metrics.trained_count, 1);
}
