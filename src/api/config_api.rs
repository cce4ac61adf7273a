// ==========================================
// 独立音乐人收入看板 - 运行期配置 API
// ==========================================
// 职责: config_kv（global scope）查询与更新
// 说明: 只接受已知配置键，写入前校验值格式
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::{config_keys, ConfigManager};

/// 可写入的配置键
pub const KNOWN_CONFIG_KEYS: [&str; 3] = [
    config_keys::EXTRA_NUMERIC_COLUMNS,
    config_keys::MAX_UPLOAD_BYTES,
    config_keys::EXTRACT_ASSETS_DEFAULT,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigItem {
    pub key: String,
    pub value: String,
}

pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 查询全部已写入的配置（未写入的键使用默认值，不出现在结果中）
    pub fn list_configs(&self) -> ApiResult<Vec<ConfigItem>> {
        let configs = self
            .config_manager
            .list_global_config()
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(configs
            .into_iter()
            .map(|(key, value)| ConfigItem { key, value })
            .collect())
    }

    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<ConfigItem> {
        let value = value.trim();
        validate_config_value(key, value)?;
        self.config_manager
            .set_global_config_value(key, value)
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(ConfigItem {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

fn validate_config_value(key: &str, value: &str) -> ApiResult<()> {
    match key {
        config_keys::MAX_UPLOAD_BYTES => match value.parse::<u64>() {
            Ok(limit) if limit > 0 => Ok(()),
            _ => Err(ApiError::InvalidInput(format!(
                "{} 必须是正整数: {}",
                key, value
            ))),
        },
        config_keys::EXTRACT_ASSETS_DEFAULT => {
            match value.to_lowercase().as_str() {
                "true" | "false" | "1" | "0" | "yes" | "no" | "on" | "off" => Ok(()),
                _ => Err(ApiError::InvalidInput(format!(
                    "{} 必须是布尔值: {}",
                    key, value
                ))),
            }
        }
        config_keys::EXTRA_NUMERIC_COLUMNS => Ok(()),
        _ => Err(ApiError::InvalidInput(format!(
            "未知配置键: {}（可选: {}）",
            key,
            KNOWN_CONFIG_KEYS.join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfigReader;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn setup() -> (ConfigApi, Arc<ConfigManager>) {
        let conn = Connection::open_in_memory().unwrap();
        let manager = Arc::new(ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap());
        (ConfigApi::new(manager.clone()), manager)
    }

    #[test]
    fn test_update_known_keys() {
        let (api, manager) = setup();
        api.update_config(config_keys::EXTRA_NUMERIC_COLUMNS, " Fees, Tax ")
            .unwrap();
        api.update_config(config_keys::EXTRACT_ASSETS_DEFAULT, "off")
            .unwrap();

        assert_eq!(
            manager.get_extra_numeric_columns().unwrap(),
            vec!["Fees".to_string(), "Tax".to_string()]
        );
        assert!(!manager.get_extract_assets_default().unwrap());
        assert_eq!(api.list_configs().unwrap().len(), 2);
    }

    #[test]
    fn test_rejects_unknown_key_and_bad_values() {
        let (api, _) = setup();
        assert!(matches!(
            api.update_config("theme", "dark"),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(api.update_config(config_keys::MAX_UPLOAD_BYTES, "0").is_err());
        assert!(api.update_config(config_keys::MAX_UPLOAD_BYTES, "ten").is_err());
        assert!(api
            .update_config(config_keys::EXTRACT_ASSETS_DEFAULT, "maybe")
            .is_err());
    }
}
