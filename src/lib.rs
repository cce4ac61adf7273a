// ==========================================
// 独立音乐人收入看板 - 核心库
// ==========================================
// 技术栈: actix-web + Rust + SQLite
// 系统定位: 收入录入、表格导入、模板化历史视图
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 历史视图聚合
pub mod engine;

// 导入层 - 外部表格
pub mod importer;

// 配置层 - 启动参数 + 运行期配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/schema 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - HTTP 集成
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ColumnRole, RevenueSourceKind};

// 领域实体
pub use domain::{Asset, AssetRevenue, ImportPayload, ImportTemplate, RevenueEntry};

// 引擎
pub use engine::{Aggregator, DisplayTable, HistoryMode};

// API
pub use api::{ApiError, ApiResult};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "artist-revenue";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
