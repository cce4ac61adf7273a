// ==========================================
// 独立音乐人收入看板 - 配置管理器
// ==========================================
// 职责: 运行期配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 配置键
pub mod config_keys {
    /// 额外数值列（逗号分隔，大小写不敏感）
    pub const EXTRA_NUMERIC_COLUMNS: &str = "aggregator_extra_numeric_columns";
    /// 上传大小上限（字节）
    pub const MAX_UPLOAD_BYTES: &str = "import_max_upload_bytes";
    /// 默认是否提取资产（true/false）
    pub const EXTRACT_ASSETS_DEFAULT: &str = "import_extract_assets_default";
}

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
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            crate::db::ensure_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, "配置已更新");
        Ok(())
    }

    /// 列出 global scope 全部配置
    pub fn list_global_config(&self) -> Result<BTreeMap<String, String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
impl ImportConfigReader for ConfigManager {
    fn get_extra_numeric_columns(&self) -> Result<Vec<String>, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::EXTRA_NUMERIC_COLUMNS, "")?;
        Ok(value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }

    fn get_max_upload_bytes(&self) -> Result<Option<u64>, Box<dyn Error>> {
        let Some(value) = self.get_config_value(config_keys::MAX_UPLOAD_BYTES)? else {
            return Ok(None);
        };
        match value.trim().parse::<u64>() {
            Ok(limit) if limit > 0 => Ok(Some(limit)),
            _ => {
                tracing::warn!(
                    config_key = config_keys::MAX_UPLOAD_BYTES,
                    raw_value = %value,
                    "上传上限配置格式错误，使用启动参数"
                );
                Ok(None)
            }
        }
    }

    fn get_extract_assets_default(&self) -> Result<bool, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::EXTRACT_ASSETS_DEFAULT, "true")?;
        match value.trim().to_lowercase().as_str() {
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_absent() {
        let cm = manager();
        assert!(cm.get_extra_numeric_columns().unwrap().is_empty());
        assert_eq!(cm.get_max_upload_bytes().unwrap(), None);
        assert!(cm.get_extract_assets_default().unwrap());
    }

    #[test]
    fn test_overrides() {
        let cm = manager();
        cm.set_global_config_value(config_keys::EXTRA_NUMERIC_COLUMNS, " Plays, ,Downloads ")
            .unwrap();
        cm.set_global_config_value(config_keys::MAX_UPLOAD_BYTES, "2048")
            .unwrap();
        cm.set_global_config_value(config_keys::EXTRACT_ASSETS_DEFAULT, "off")
            .unwrap();

        assert_eq!(
            cm.get_extra_numeric_columns().unwrap(),
            vec!["Plays".to_string(), "Downloads".to_string()]
        );
        assert_eq!(cm.get_max_upload_bytes().unwrap(), Some(2048));
        assert!(!cm.get_extract_assets_default().unwrap());
        assert_eq!(cm.list_global_config().unwrap().len(), 3);
    }

    #[test]
    fn test_invalid_upload_limit_is_ignored() {
        let cm = manager();
        cm.set_global_config_value(config_keys::MAX_UPLOAD_BYTES, "lots")
            .unwrap();
        assert_eq!(cm.get_max_upload_bytes().unwrap(), None);
    }
}
