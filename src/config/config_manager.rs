// ==========================================
// 课程指标缓存引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::metrics_config_trait::MetricsConfigReader;
use crate::db::open_sqlite_connection;
use crate::engine::batch::BatchIsolationMode;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值 (UPSERT)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')
            "#,
            params![GLOBAL_SCOPE, key, value],
        )?;

        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 读取配置值，缺失时使用默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 解析数值配置，格式错误时告警并回落默认值
    fn parse_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: std::str::FromStr + Copy + std::fmt::Display,
    {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置值格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 获取所有 global 配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 批量重算报告 / 启动日志记录当时生效的配置
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// MetricsConfigReader Trait 实现
// ==========================================
#[async_trait]
impl MetricsConfigReader for ConfigManager {
    async fn get_update_length_days(&self) -> Result<i64, Box<dyn Error>> {
        let days = self.parse_or_default(config_keys::UPDATE_LENGTH_DAYS, 7i64)?;
        Ok(days.max(0))
    }

    async fn get_batch_isolation_mode(&self) -> Result<BatchIsolationMode, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::BATCH_ISOLATION_MODE, "PER_COURSE")?;
        let mode = BatchIsolationMode::from_str(&value);
        if !mode.as_str().eq_ignore_ascii_case(value.trim()) {
            tracing::warn!(value = %value, fallback = %mode, "无法识别的批量隔离模式, 使用默认值");
        }
        Ok(mode)
    }

    async fn get_batch_interval_minutes(&self) -> Result<u64, Box<dyn Error>> {
        let minutes = self.parse_or_default(config_keys::BATCH_INTERVAL_MINUTES, 60u64)?;
        Ok(minutes.max(1))
    }

    async fn get_legacy_course_max_id(&self) -> Result<i64, Box<dyn Error>> {
        self.parse_or_default(config_keys::LEGACY_COURSE_MAX_ID, 9999i64)
    }

    async fn get_wiki_language(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::WIKI_LANGUAGE, "en")
    }

    async fn get_course_prefix(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::COURSE_PREFIX, "Wikipedia:Wiki_Ed")
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 批量重算
    pub const UPDATE_LENGTH_DAYS: &str = "update_length_days";
    pub const BATCH_ISOLATION_MODE: &str = "batch_isolation_mode";
    pub const BATCH_INTERVAL_MINUTES: &str = "batch_interval_minutes";

    // 课程分类
    pub const LEGACY_COURSE_MAX_ID: &str = "legacy_course_max_id";

    // wiki 地址
    pub const WIKI_LANGUAGE: &str = "wiki_language";
    pub const COURSE_PREFIX: &str = "course_prefix";
}
