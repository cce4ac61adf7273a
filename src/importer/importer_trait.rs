// ==========================================
// 独立音乐人收入看板 - 导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// ==========================================

use crate::importer::error::ImportResult;
use crate::importer::file_parser::ParsedSheet;
use crate::importer::revenue_importer::{AnnexOutcome, ImportOutcome, ImportRequest, PreviewReport};
use std::path::Path;

// ==========================================
// SpreadsheetReader Trait
// ==========================================
// 用途: 文件读取接口（阶段 0）
// 实现者: CsvReader, ExcelReader, UniversalReader
pub trait SpreadsheetReader: Send + Sync {
    /// 读取文件中的全部 sheet
    ///
    /// # 返回
    /// - Ok(Vec<ParsedSheet>): 每个非空 sheet 的表头与数据行
    /// - Err: 文件不存在、格式错误
    fn read_sheets(&self, path: &Path) -> ImportResult<Vec<ParsedSheet>>;
}

// ==========================================
// RevenueImporter Trait
// ==========================================
// 用途: 收入表格导入主接口
// 实现者: RevenueImporterImpl
pub trait RevenueImporter: Send + Sync {
    /// 预览文件（不落库）
    ///
    /// # 返回
    /// - 各 sheet 表头与行数、模板匹配结果、推荐映射
    fn preview_file(&self, path: &Path) -> ImportResult<PreviewReport>;

    /// 导入文件，生成一条收入记录
    ///
    /// # 导入流程
    /// 1. 读取文件（全部 sheet）
    /// 2. 模板匹配（首个 sheet 表头）
    /// 3. 未匹配时: 返回 TemplateRequired 或按推荐映射新建模板
    /// 4. 按模板表头重建行字典，跳过金额/日期无法解析的行
    /// 5. 落库（收入记录 + 可选资产收入，同一事务）
    fn import_file(
        &self,
        path: &Path,
        original_filename: &str,
        request: &ImportRequest,
    ) -> ImportResult<ImportOutcome>;

    /// 将文件追加到已有收入记录（Annex）
    ///
    /// # 说明
    /// - 使用记录关联的模板；记录无模板时按文件表头匹配
    /// - 只为新追加的行提取资产
    fn annex_file(
        &self,
        entry_id: &str,
        path: &Path,
        original_filename: &str,
        extract_assets: Option<bool>,
    ) -> ImportResult<AnnexOutcome>;
}
