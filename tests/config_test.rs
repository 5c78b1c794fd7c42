// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证配置读取功能的正确性
// ==========================================

mod test_helpers;

use course_metrics::app::AppSettings;
use course_metrics::config::{config_keys, ConfigManager, MetricsConfigReader};
use course_metrics::engine::BatchIsolationMode;
use test_helpers::{create_test_db, insert_test_config, open_test_connection};

#[tokio::test]
async fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[tokio::test]
async fn test_reads_stored_values() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).expect("Failed to open db");
    insert_test_config(&conn, config_keys::UPDATE_LENGTH_DAYS, "14").unwrap();
    insert_test_config(&conn, config_keys::LEGACY_COURSE_MAX_ID, "500").unwrap();
    insert_test_config(&conn, config_keys::BATCH_ISOLATION_MODE, "SINGLE_UNIT").unwrap();
    insert_test_config(&conn, config_keys::BATCH_INTERVAL_MINUTES, "15").unwrap();
    insert_test_config(&conn, config_keys::WIKI_LANGUAGE, "es").unwrap();

    let config = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    assert_eq!(config.get_update_length_days().await.unwrap(), 14);
    assert_eq!(config.get_legacy_course_max_id().await.unwrap(), 500);
    assert_eq!(
        config.get_batch_isolation_mode().await.unwrap(),
        BatchIsolationMode::SingleUnit
    );
    assert_eq!(config.get_batch_interval_minutes().await.unwrap(), 15);
    assert_eq!(config.get_wiki_language().await.unwrap(), "es");
    assert_eq!(config.get_course_prefix().await.unwrap(), "Wikipedia:Wiki_Ed");
}

#[tokio::test]
async fn test_app_settings_load() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).expect("Failed to open db");
    insert_test_config(&conn, config_keys::UPDATE_LENGTH_DAYS, "14").unwrap();
    insert_test_config(&conn, config_keys::BATCH_ISOLATION_MODE, "bogus").unwrap();

    let config = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    let settings = AppSettings::load(&config).await.unwrap();

    assert_eq!(settings.grace_period(), chrono::Duration::days(14));
    // 无法识别的模式回落 PER_COURSE
    assert_eq!(settings.batch_isolation_mode, BatchIsolationMode::PerCourse);
    assert_eq!(settings.legacy_course_max_id, 9999);
}

#[tokio::test]
async fn test_negative_grace_is_clamped() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    config
        .set_global_config_value(config_keys::UPDATE_LENGTH_DAYS, "-3")
        .unwrap();

    assert_eq!(config.get_update_length_days().await.unwrap(), 0);
}
