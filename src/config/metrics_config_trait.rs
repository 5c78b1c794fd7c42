// ==========================================
// 课程指标缓存引擎 - 指标配置读取 Trait
// ==========================================
// 职责: 定义引擎/调度所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::engine::batch::BatchIsolationMode;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// MetricsConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait MetricsConfigReader: Send + Sync {
    // ===== 批量重算 =====

    /// 当前课程宽限天数
    ///
    /// # 默认值
    /// - 7
    async fn get_update_length_days(&self) -> Result<i64, Box<dyn Error>>;

    /// 批量隔离模式
    ///
    /// # 默认值
    /// - PER_COURSE
    async fn get_batch_isolation_mode(&self) -> Result<BatchIsolationMode, Box<dyn Error>>;

    /// 常驻模式下批量重算间隔 (分钟)
    ///
    /// # 默认值
    /// - 60
    async fn get_batch_interval_minutes(&self) -> Result<u64, Box<dyn Error>>;

    // ===== 课程分类 =====

    /// legacy 课程 ID 上限 (含)
    ///
    /// # 默认值
    /// - 9999
    async fn get_legacy_course_max_id(&self) -> Result<i64, Box<dyn Error>>;

    // ===== wiki 地址 =====

    async fn get_wiki_language(&self) -> Result<String, Box<dyn Error>>;

    async fn get_course_prefix(&self) -> Result<String, Box<dyn Error>>;
}
