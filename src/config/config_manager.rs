// ==========================================
// 代发货库存管理后端 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::pipeline_config_trait::PipelineConfigReader;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取正整数配置（非法值回落到默认值）
    fn get_usize_or_default(&self, key: &str, default: usize) -> RepositoryResult<usize> {
        let raw = self.get_global_config_value(key)?;
        let value = raw
            .as_deref()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| *v > 0);
        if raw.is_some() && value.is_none() {
            tracing::warn!(key, raw = ?raw, default, "配置值非法，使用默认值");
        }
        Ok(value.unwrap_or(default))
    }

    /// 获取所有 global 配置的快照（JSON 格式，按键排序）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

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

impl PipelineConfigReader for ConfigManager {
    fn get_export_dir(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::EXPORT_DIR, defaults::EXPORT_DIR)
    }

    fn get_export_currency(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::EXPORT_CURRENCY, defaults::EXPORT_CURRENCY)
    }

    fn get_import_error_detail_limit(&self) -> RepositoryResult<usize> {
        self.get_usize_or_default(
            config_keys::IMPORT_ERROR_DETAIL_LIMIT,
            defaults::IMPORT_ERROR_DETAIL_LIMIT,
        )
    }

    fn get_import_error_store_limit(&self) -> RepositoryResult<usize> {
        self.get_usize_or_default(
            config_keys::IMPORT_ERROR_STORE_LIMIT,
            defaults::IMPORT_ERROR_STORE_LIMIT,
        )
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 导出
    pub const EXPORT_DIR: &str = "export_dir";
    pub const EXPORT_CURRENCY: &str = "export_currency";

    // 导入
    pub const IMPORT_ERROR_DETAIL_LIMIT: &str = "import_error_detail_limit";
    pub const IMPORT_ERROR_STORE_LIMIT: &str = "import_error_store_limit";
}

// ==========================================
// 默认值
// ==========================================
pub mod defaults {
    pub const EXPORT_DIR: &str = "media/exports";
    pub const EXPORT_CURRENCY: &str = "AUD";
    pub const IMPORT_ERROR_DETAIL_LIMIT: usize = 10;
    pub const IMPORT_ERROR_STORE_LIMIT: usize = 1000;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn manager() -> ConfigManager {
        let conn = Arc::new(Mutex::new(open_in_memory().unwrap()));
        ConfigManager::from_connection(conn).unwrap()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = manager();
        assert_eq!(config.get_export_dir().unwrap(), "media/exports");
        assert_eq!(config.get_export_currency().unwrap(), "AUD");
        assert_eq!(config.get_import_error_detail_limit().unwrap(), 10);
        assert_eq!(config.get_import_error_store_limit().unwrap(), 1000);
    }

    #[test]
    fn test_set_value_overrides_default() {
        let config = manager();
        config
            .set_global_config_value(config_keys::EXPORT_CURRENCY, "NZD")
            .unwrap();
        config
            .set_global_config_value(config_keys::IMPORT_ERROR_DETAIL_LIMIT, "3")
            .unwrap();
        assert_eq!(config.get_export_currency().unwrap(), "NZD");
        assert_eq!(config.get_import_error_detail_limit().unwrap(), 3);

        // 覆盖写
        config
            .set_global_config_value(config_keys::EXPORT_CURRENCY, "USD")
            .unwrap();
        assert_eq!(config.get_export_currency().unwrap(), "USD");
    }

    #[test]
    fn test_invalid_limit_falls_back() {
        let config = manager();
        config
            .set_global_config_value(config_keys::IMPORT_ERROR_DETAIL_LIMIT, "abc")
            .unwrap();
        assert_eq!(config.get_import_error_detail_limit().unwrap(), 10);
        config
            .set_global_config_value(config_keys::IMPORT_ERROR_STORE_LIMIT, "0")
            .unwrap();
        assert_eq!(config.get_import_error_store_limit().unwrap(), 1000);
    }

    #[test]
    fn test_snapshot_sorted_json() {
        let config = manager();
        config.set_global_config_value("b_key", "2").unwrap();
        config.set_global_config_value("a_key", "1").unwrap();
        assert_eq!(
            config.get_config_snapshot().unwrap(),
            r#"{"a_key":"1","b_key":"2"}"#
        );
    }
}
