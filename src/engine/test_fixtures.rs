// ==========================================
// 引擎层单元测试夹具
// ==========================================
// 内存 SQLite + 统一建表 + 数据播种
// ==========================================

use crate::domain::article::{Article, ArticleAssociation, Revision};
use crate::domain::course::{Course, NewCourse};
use crate::domain::enrollment::{Contributor, Enrollment};
use crate::domain::types::CourseRole;
use crate::repository::{
    ArticleRepository, CourseDataRepositoryImpl, CourseRepository, EnrollmentRepository,
    MembershipRepository, RevisionRepository,
};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub const LEGACY_MAX_ID: i64 = 9999;

pub struct Fixture {
    pub conn: Arc<Mutex<Connection>>,
    pub courses: Arc<CourseRepository>,
    pub enrollments: Arc<EnrollmentRepository>,
    pub revisions: Arc<RevisionRepository>,
    pub articles: Arc<ArticleRepository>,
    pub data: Arc<CourseDataRepositoryImpl>,
}

impl Fixture {
    pub fn new() -> Self {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        let courses = Arc::new(CourseRepository::from_connection(conn.clone()));
        let enrollments = Arc::new(EnrollmentRepository::from_connection(conn.clone()));
        let revisions = Arc::new(RevisionRepository::from_connection(conn.clone()));
        let articles = Arc::new(ArticleRepository::from_connection(conn.clone()));
        let data = Arc::new(CourseDataRepositoryImpl::new(
            courses.clone(),
            enrollments.clone(),
            revisions.clone(),
            articles.clone(),
            Arc::new(MembershipRepository::from_connection(conn.clone())),
        ));

        Self {
            conn,
            courses,
            enrollments,
            revisions,
            articles,
            data,
        }
    }

    /// 创建 2015-01-10 ~ 2015-05-10 的课程
    pub fn course(&self, id: i64) -> Course {
        self.course_between(id, date("2015-01-10"), date("2015-05-10"))
    }

    pub fn course_between(&self, id: i64, start: NaiveDate, end: NaiveDate) -> Course {
        let new_course = NewCourse {
            id,
            title: format!("Course {}", id),
            slug: format!("School/Course {}", id),
            school: Some("School".to_string()),
            term: None,
            start,
            end,
            listed: true,
            submitted: false,
        };
        self.courses.create(&new_course, LEGACY_MAX_ID).unwrap()
    }

    pub fn reload(&self, id: i64) -> Course {
        self.courses.find_by_id(id).unwrap().unwrap()
    }

    pub fn contributor(&self, id: i64, trained: bool) {
        self.enrollments
            .upsert_contributor(&Contributor {
                id,
                username: format!("user{}", id),
                trained,
            })
            .unwrap();
    }

    pub fn enroll(&self, course_id: i64, contributor_id: i64, role: CourseRole) {
        self.enrollments
            .enroll(&Enrollment::new(course_id, contributor_id, role))
            .unwrap();
    }

    pub fn article(&self, id: i64, namespace: i32, deleted: bool) {
        self.articles
            .upsert_article(&Article {
                id,
                title: format!("Article {}", id),
                namespace,
                deleted,
            })
            .unwrap();
    }

    pub fn associate(&self, course_id: i64, article_id: i64, views: i64, live: bool, new_article: bool) {
        self.articles
            .upsert_association(&ArticleAssociation {
                article_id,
                course_id,
                view_count: views,
                live,
                new_article,
            })
            .unwrap();
    }

    pub fn revision(&self, id: i64, contributor_id: i64, article_id: i64, at: &str, characters: i64) {
        self.revisions
            .insert(&Revision {
                id,
                contributor_id,
                article_id,
                date: NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M:%S").unwrap(),
                characters,
            })
            .unwrap();
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}
