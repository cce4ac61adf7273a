// ==========================================
// 独立音乐人收入看板 - 配置层
// ==========================================
// 职责: 进程启动配置（命令行 / 环境变量）+ 运行期配置（config_kv 表）
// ==========================================

pub mod app_config;
pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置
pub use app_config::{ServerConfig, DEFAULT_MAX_UPLOAD_BYTES};
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::ImportConfigReader;
