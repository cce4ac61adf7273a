// ==========================================
// 独立音乐人收入看板 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供 HTTP 路由调用
// 说明: 全部为同步接口，HTTP 层在阻塞线程池中调用
// ==========================================

pub mod asset_api;
pub mod catalog_api;
pub mod config_api;
pub mod dashboard_api;
pub mod error;
pub mod import_api;
pub mod revenue_api;
pub mod template_api;
pub mod validator;

// 重导出核心类型
pub use asset_api::AssetApi;
pub use catalog_api::CatalogApi;
pub use config_api::{ConfigApi, ConfigItem};
pub use dashboard_api::{DashboardApi, DashboardMetrics};
pub use error::{ApiError, ApiResult};
pub use import_api::ImportApi;
pub use revenue_api::RevenueApi;
pub use template_api::{TemplateApi, TemplateMetaUpdate};
