// ==========================================
// 独立音乐人收入看板 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 全部仓储共享同一个 SQLite 连接
// ==========================================

use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::{
    AssetApi, CatalogApi, ConfigApi, DashboardApi, ImportApi, RevenueApi, TemplateApi,
};
use crate::config::ConfigManager;
use crate::db::open_and_migrate;
use crate::repository::{
    AssetRepository, CatalogRepository, DashboardRepository, ImportTemplateRepository,
    RevenueEntryRepository, RevenueImportRepositoryImpl, RevenueSourceRepository,
};

/// 应用状态
///
/// 在 HTTP 服务中以 web::Data 共享
pub struct AppState {
    /// 作品目录API
    pub catalog_api: Arc<CatalogApi>,

    /// 收入记录API
    pub revenue_api: Arc<RevenueApi>,

    /// 导入模板API
    pub template_api: Arc<TemplateApi>,

    /// 表格导入API
    pub import_api: Arc<ImportApi>,

    /// 资产API
    pub asset_api: Arc<AssetApi>,

    /// 看板API
    pub dashboard_api: Arc<DashboardApi>,

    /// 运行期配置API
    pub config_api: Arc<ConfigApi>,

    /// 上传文件暂存目录
    pub upload_dir: PathBuf,
}

impl AppState {
    /// 打开（必要时创建并迁移）数据库并构建全部 API
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - upload_dir: 上传暂存目录（不存在时创建）
    /// - max_upload_bytes: 启动参数给出的上传上限
    pub fn new(
        db_path: &str,
        upload_dir: PathBuf,
        max_upload_bytes: u64,
    ) -> Result<Self, String> {
        tracing::info!(db_path, upload_dir = %upload_dir.display(), "初始化AppState");

        let conn = open_and_migrate(db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        std::fs::create_dir_all(&upload_dir)
            .map_err(|e| format!("无法创建上传目录 {}: {}", upload_dir.display(), e))?;

        Self::from_connection(conn, upload_dir, max_upload_bytes)
    }

    /// 基于已打开的连接构建（测试使用内存数据库）
    pub fn from_connection(
        conn: Connection,
        upload_dir: PathBuf,
        max_upload_bytes: u64,
    ) -> Result<Self, String> {
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let catalog_repo = Arc::new(
            CatalogRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建CatalogRepository: {}", e))?,
        );
        let source_repo = Arc::new(
            RevenueSourceRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建RevenueSourceRepository: {}", e))?,
        );
        let entry_repo = Arc::new(
            RevenueEntryRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建RevenueEntryRepository: {}", e))?,
        );
        let template_repo = Arc::new(
            ImportTemplateRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ImportTemplateRepository: {}", e))?,
        );
        let asset_repo = Arc::new(
            AssetRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建AssetRepository: {}", e))?,
        );
        let dashboard_repo = Arc::new(
            DashboardRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建DashboardRepository: {}", e))?,
        );
        let import_repo = Arc::new(
            RevenueImportRepositoryImpl::from_connection(conn.clone())
                .map_err(|e| format!("无法创建RevenueImportRepository: {}", e))?,
        );
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 创建API实例
        // ==========================================
        let state = Self {
            catalog_api: Arc::new(CatalogApi::new(catalog_repo)),
            revenue_api: Arc::new(RevenueApi::new(source_repo, entry_repo.clone())),
            template_api: Arc::new(TemplateApi::new(
                template_repo,
                entry_repo,
                config_manager.clone(),
            )),
            import_api: Arc::new(ImportApi::new(
                import_repo,
                config_manager.clone(),
                max_upload_bytes,
            )),
            asset_api: Arc::new(AssetApi::new(asset_repo.clone())),
            dashboard_api: Arc::new(DashboardApi::new(dashboard_repo, asset_repo)),
            config_api: Arc::new(ConfigApi::new(config_manager)),
            upload_dir,
        };

        tracing::info!("AppState初始化完成");
        Ok(state)
    }
}

