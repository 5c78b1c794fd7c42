// ==========================================
// 课程指标缓存引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 课程级指标聚合、缓存与失效
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 聚合/缓存/批量/清理
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 对外接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CourseRole, MetricName};

// 领域实体
pub use domain::{CachedMetrics, Course, CourseMetrics, NewCourse};

// 引擎
pub use engine::{
    BatchIsolationMode, BatchRecomputeReport, BatchRecomputeScheduler, CleanupReport,
    CourseCacheController, LegacyCourseUpdater, MembershipCleanupEngine, MetricsAggregator,
    MetricsError,
};

// API
pub use api::{ApiError, CourseMetricsApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "课程指标缓存引擎";
