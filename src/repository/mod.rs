// ==========================================
// 独立音乐人收入看板 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约束: 所有仓储共享同一个 Arc<Mutex<Connection>>
// ==========================================

pub mod asset_repo;
pub mod catalog_repo;
pub mod dashboard_repo;
pub mod error;
pub mod revenue_entry_repo;
pub mod revenue_import_repo;
pub mod revenue_source_repo;
pub mod template_repo;

// 重导出核心仓储
pub use asset_repo::AssetRepository;
pub use catalog_repo::CatalogRepository;
pub use dashboard_repo::{DashboardCounts, DashboardRepository, PeriodRevenue, SourceRevenue};
pub use error::{RepositoryError, RepositoryResult};
pub use revenue_entry_repo::RevenueEntryRepository;
pub use revenue_import_repo::{RevenueImportRepository, RevenueImportRepositoryImpl};
pub use revenue_source_repo::RevenueSourceRepository;
pub use template_repo::ImportTemplateRepository;
