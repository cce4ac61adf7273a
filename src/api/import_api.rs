// ==========================================
// 独立音乐人收入看板 - 导入 API
// ==========================================
// 职责: 上传文件的格式 / 大小校验 + 调用导入器（预览 / 导入 / 追加）
// ==========================================

use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::importer::error::ImportError;
use crate::importer::file_parser::SpreadsheetFormat;
use crate::importer::{
    AnnexOutcome, ImportOutcome, ImportRequest, PreviewReport, RevenueImporter,
    RevenueImporterImpl,
};
use crate::repository::RevenueImportRepositoryImpl;

pub type DefaultRevenueImporter = RevenueImporterImpl<RevenueImportRepositoryImpl, ConfigManager>;

pub struct ImportApi {
    importer: DefaultRevenueImporter,
    config_manager: Arc<ConfigManager>,
    /// 启动参数给出的上传上限（config_kv 中的覆盖值优先）
    default_max_upload_bytes: u64,
}

impl ImportApi {
    pub fn new(
        import_repo: Arc<RevenueImportRepositoryImpl>,
        config_manager: Arc<ConfigManager>,
        default_max_upload_bytes: u64,
    ) -> Self {
        Self {
            importer: RevenueImporterImpl::new(import_repo, config_manager.clone()),
            config_manager,
            default_max_upload_bytes,
        }
    }

    /// 当前生效的上传大小上限
    pub fn max_upload_bytes(&self) -> u64 {
        match self.config_manager.get_max_upload_bytes() {
            Ok(Some(limit)) => limit,
            Ok(None) => self.default_max_upload_bytes,
            Err(e) => {
                warn!(error = %e, "读取上传上限配置失败，使用启动参数");
                self.default_max_upload_bytes
            }
        }
    }

    /// 按原始文件名校验扩展名（仅 .csv / .xls / .xlsx）
    pub fn check_filename(&self, original_filename: &str) -> ApiResult<SpreadsheetFormat> {
        let ext = Path::new(original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        SpreadsheetFormat::from_extension(ext)
            .ok_or_else(|| ApiError::from(ImportError::UnsupportedFormat(original_filename.to_string())))
    }

    fn check_size(&self, path: &Path) -> ApiResult<()> {
        let size = std::fs::metadata(path)
            .map_err(|_| ImportError::FileNotFound(path.display().to_string()))?
            .len();
        let limit = self.max_upload_bytes();
        if size > limit {
            return Err(ImportError::FileTooLarge { size, limit }.into());
        }
        Ok(())
    }

    // ==========================================
    // 导入接口
    // ==========================================

    /// 预览文件: 各 sheet 表头 / 行数、模板匹配结果、推荐映射（不落库）
    pub fn preview_file(&self, path: &Path) -> ApiResult<PreviewReport> {
        self.check_size(path)?;
        Ok(self.importer.preview_file(path)?)
    }

    /// 导入文件
    ///
    /// 表头未匹配且未指定模板时返回 TemplateRequired（不是错误）
    pub fn import_file(
        &self,
        path: &Path,
        original_filename: &str,
        request: &ImportRequest,
    ) -> ApiResult<ImportOutcome> {
        self.check_filename(original_filename)?;
        self.check_size(path)?;

        let outcome = self.importer.import_file(path, original_filename, request)?;
        match &outcome {
            ImportOutcome::Imported(summary) => info!(
                file = %original_filename,
                entry_id = %summary.entry.entry_id,
                rows = summary.imported_rows,
                skipped = summary.skipped_rows,
                "文件导入完成"
            ),
            ImportOutcome::TemplateRequired { headers, .. } => info!(
                file = %original_filename,
                columns = headers.len(),
                "新表格结构，等待确认模板"
            ),
        }
        Ok(outcome)
    }

    /// 将文件追加到已有收入记录
    pub fn annex_file(
        &self,
        entry_id: &str,
        path: &Path,
        original_filename: &str,
        extract_assets: Option<bool>,
    ) -> ApiResult<AnnexOutcome> {
        self.check_filename(original_filename)?;
        self.check_size(path)?;
        Ok(self
            .importer
            .annex_file(entry_id, path, original_filename, extract_assets)?)
    }
}
