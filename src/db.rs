// ==========================================
// 课程指标缓存引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表 (幂等)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 创建课程指标相关表（幂等）
///
/// 说明：
/// - articles_courses.article_id 不加外键: 条目记录可能被外部删除, 清理流程需要能看到悬挂关联
/// - 缓存指标列允许 NULL, NULL 表示从未计算
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS courses (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT NOT NULL,
            school TEXT,
            term TEXT,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            legacy INTEGER NOT NULL DEFAULT 0,
            listed INTEGER NOT NULL DEFAULT 1,
            submitted INTEGER NOT NULL DEFAULT 0,
            character_sum INTEGER,
            view_sum INTEGER,
            user_count INTEGER,
            trained_count INTEGER,
            revision_count INTEGER,
            article_count INTEGER,
            new_article_count INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_courses_end ON courses(end_date);

        CREATE TABLE IF NOT EXISTS contributors (
            id INTEGER PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            trained INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS courses_users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_id INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            contributor_id INTEGER NOT NULL REFERENCES contributors(id) ON DELETE CASCADE,
            role INTEGER NOT NULL DEFAULT 0,
            UNIQUE(course_id, contributor_id, role)
        );
        CREATE INDEX IF NOT EXISTS idx_courses_users_course ON courses_users(course_id, role);

        CREATE TABLE IF NOT EXISTS articles (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            namespace INTEGER NOT NULL DEFAULT 0,
            deleted INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS articles_courses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            article_id INTEGER NOT NULL,
            course_id INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            view_count INTEGER NOT NULL DEFAULT 0,
            live INTEGER NOT NULL DEFAULT 1,
            new_article INTEGER NOT NULL DEFAULT 0,
            UNIQUE(article_id, course_id)
        );
        CREATE INDEX IF NOT EXISTS idx_articles_courses_course ON articles_courses(course_id);

        CREATE TABLE IF NOT EXISTS revisions (
            id INTEGER PRIMARY KEY,
            contributor_id INTEGER NOT NULL,
            article_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            characters INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_revisions_contributor_date ON revisions(contributor_id, date);
        CREATE INDEX IF NOT EXISTS idx_revisions_article ON revisions(article_id);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
