// ==========================================
// 独立音乐人收入看板 - 进程启动配置
// ==========================================
// 职责: 命令行参数 / 环境变量 → ServerConfig
// 说明: 运行期可调项放在 config_kv（见 ConfigManager）
// ==========================================

use crate::logging::LogFormat;
use clap::Parser;
use std::path::PathBuf;

/// 默认上传上限: 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// 默认数据库文件名（位于用户数据目录下）
pub const DEFAULT_DB_FILE: &str = "artist_revenue.db";

#[derive(Parser, Debug, Clone)]
#[command(name = "artist-revenue")]
#[command(about = "Revenue dashboard backend for independent music artists")]
#[command(version)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1", env = "REVENUE_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "REVENUE_PORT")]
    pub port: u16,

    /// SQLite database path (defaults to the user data directory)
    #[arg(long, env = "REVENUE_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Directory for in-flight uploads (defaults to the system temp directory)
    #[arg(long, env = "REVENUE_UPLOAD_DIR")]
    pub upload_dir: Option<PathBuf>,

    /// Upload size cap in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, env = "REVENUE_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: u64,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, env = "REVENUE_LOG_FORMAT")]
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// 数据库路径（未指定时: <data_dir>/artist-revenue/artist_revenue.db）
    pub fn resolved_db_path(&self) -> PathBuf {
        match &self.db_path {
            Some(path) => path.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("artist-revenue")
                .join(DEFAULT_DB_FILE),
        }
    }

    /// 上传暂存目录（未指定时: <temp>/artist-revenue-uploads）
    pub fn resolved_upload_dir(&self) -> PathBuf {
        match &self.upload_dir {
            Some(path) => path.clone(),
            None => std::env::temp_dir().join("artist-revenue-uploads"),
        }
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ServerConfig::parse_from(["artist-revenue"]);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(cfg.resolved_db_path().ends_with(DEFAULT_DB_FILE));
        assert!(cfg.resolved_upload_dir().ends_with("artist-revenue-uploads"));
    }

    #[test]
    fn test_explicit_paths() {
        let cfg = ServerConfig::parse_from([
            "artist-revenue",
            "--db-path",
            "/tmp/r.db",
            "--port",
            "9000",
            "--log-format",
            "json",
        ]);
        assert_eq!(cfg.resolved_db_path(), PathBuf::from("/tmp/r.db"));
        assert_eq!(cfg.bind_address(), ("127.0.0.1".to_string(), 9000));
        assert_eq!(cfg.log_format, LogFormat::Json);
    }
}
