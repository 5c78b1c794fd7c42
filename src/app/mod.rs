// ==========================================
// 课程指标缓存引擎 - 应用层
// ==========================================
// 职责: 组装仓储/引擎/API, 供入口程序使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppSettings, AppState};
