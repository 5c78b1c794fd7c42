// ==========================================
// 课程指标缓存引擎 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::api::{ApiResult, CourseMetricsApi, WikiSettings};
use crate::config::{ConfigManager, MetricsConfigReader};
use crate::domain::course::{Course, NewCourse};
use crate::engine::{
    BatchIsolationMode, BatchRecomputeReport, BatchRecomputeScheduler, CourseCacheController,
    CourseLockRegistry, MembershipCleanupEngine, NoOpLegacyUpdater, SharedLegacyUpdater,
};
use crate::repository::{
    ArticleRepository, CourseDataRepository, CourseDataRepositoryImpl, CourseRepository,
    EnrollmentRepository, MembershipRepository, RevisionRepository,
};

// ==========================================
// AppSettings - 启动时读取的配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    pub update_length_days: i64,
    pub legacy_course_max_id: i64,
    pub batch_isolation_mode: BatchIsolationMode,
    pub batch_interval_minutes: u64,
    pub wiki: WikiSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            update_length_days: 7,
            legacy_course_max_id: 9999,
            batch_isolation_mode: BatchIsolationMode::PerCourse,
            batch_interval_minutes: 60,
            wiki: WikiSettings::default(),
        }
    }
}

impl AppSettings {
    /// 从配置读取器加载
    pub async fn load(config: &dyn MetricsConfigReader) -> Result<Self, String> {
        Ok(Self {
            update_length_days: config
                .get_update_length_days()
                .await
                .map_err(|e| format!("读取 update_length_days 失败: {}", e))?,
            legacy_course_max_id: config
                .get_legacy_course_max_id()
                .await
                .map_err(|e| format!("读取 legacy_course_max_id 失败: {}", e))?,
            batch_isolation_mode: config
                .get_batch_isolation_mode()
                .await
                .map_err(|e| format!("读取 batch_isolation_mode 失败: {}", e))?,
            batch_interval_minutes: config
                .get_batch_interval_minutes()
                .await
                .map_err(|e| format!("读取 batch_interval_minutes 失败: {}", e))?,
            wiki: WikiSettings {
                language: config
                    .get_wiki_language()
                    .await
                    .map_err(|e| format!("读取 wiki_language 失败: {}", e))?,
                course_prefix: config
                    .get_course_prefix()
                    .await
                    .map_err(|e| format!("读取 course_prefix 失败: {}", e))?,
            },
        })
    }

    /// 当前课程宽限期
    pub fn grace_period(&self) -> Duration {
        Duration::days(self.update_length_days)
    }
}

/// 应用状态
///
/// 包含所有API实例和共享资源, 所有仓储共用一个连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 启动时读取的配置
    pub settings: AppSettings,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 课程指标API
    pub metrics_api: Arc<CourseMetricsApi>,

    // 仓储 (数据同步侧写入)
    pub course_repo: Arc<CourseRepository>,
    pub enrollment_repo: Arc<EnrollmentRepository>,
    pub article_repo: Arc<ArticleRepository>,
    pub revision_repo: Arc<RevisionRepository>,
}

impl AppState {
    /// 创建新的AppState实例 (不接外部 legacy 更新器)
    pub async fn new(db_path: String) -> Result<Self, String> {
        Self::with_legacy_updater(db_path, Arc::new(NoOpLegacyUpdater)).await
    }

    /// 创建AppState并接入外部 legacy 更新器
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并建表
    /// 2. 读取配置
    /// 3. 初始化仓储/引擎/API
    pub async fn with_legacy_updater(
        db_path: String,
        legacy_updater: SharedLegacyUpdater,
    ) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "初始化AppState");

        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::db::ensure_schema(&conn).map_err(|e| format!("建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 配置
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let settings = AppSettings::load(config_manager.as_ref()).await?;
        tracing::info!(
            update_length_days = settings.update_length_days,
            legacy_course_max_id = settings.legacy_course_max_id,
            batch_isolation_mode = %settings.batch_isolation_mode,
            "配置已加载"
        );

        // ==========================================
        // Repository层
        // ==========================================
        let course_repo = Arc::new(CourseRepository::from_connection(conn.clone()));
        let enrollment_repo = Arc::new(EnrollmentRepository::from_connection(conn.clone()));
        let article_repo = Arc::new(ArticleRepository::from_connection(conn.clone()));
        let revision_repo = Arc::new(RevisionRepository::from_connection(conn.clone()));
        let data: Arc<dyn CourseDataRepository> = Arc::new(CourseDataRepositoryImpl::new(
            course_repo.clone(),
            enrollment_repo.clone(),
            revision_repo.clone(),
            article_repo.clone(),
            Arc::new(MembershipRepository::from_connection(conn.clone())),
        ));

        // ==========================================
        // Engine层
        // ==========================================
        let locks = Arc::new(CourseLockRegistry::new());
        let cache = Arc::new(CourseCacheController::new(data.clone(), locks));
        let scheduler = Arc::new(BatchRecomputeScheduler::new(
            data.clone(),
            cache.clone(),
            legacy_updater.clone(),
            settings.batch_isolation_mode,
        ));
        let cleanup = Arc::new(MembershipCleanupEngine::new(
            data,
            cache.clone(),
            legacy_updater.clone(),
        ));

        // ==========================================
        // API层
        // ==========================================
        let metrics_api = Arc::new(CourseMetricsApi::new(
            cache,
            scheduler,
            cleanup,
            legacy_updater,
            settings.wiki.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            settings,
            config_manager,
            metrics_api,
            course_repo,
            enrollment_repo,
            article_repo,
            revision_repo,
        })
    }

    /// 创建课程, 按配置阈值判定 legacy
    ///
    /// 重复 ID 返回 InvalidInput
    pub fn create_course(&self, course: &NewCourse) -> ApiResult<Course> {
        Ok(self
            .course_repo
            .create(course, self.settings.legacy_course_max_id)?)
    }

    /// 以配置的宽限期执行一次批量重算
    pub fn run_scheduled_batch(&self, now: NaiveDateTime) -> ApiResult<BatchRecomputeReport> {
        self.metrics_api
            .run_batch_recompute(now, self.settings.grace_period())
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 COURSE_METRICS_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("COURSE_METRICS_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./course_metrics.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("course-metrics");
        // 目录创建失败时回退当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("course_metrics.db");
        }
    }

    path.to_string_lossy().to_string()
}
