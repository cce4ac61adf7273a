// ==========================================
// 独立音乐人收入看板 - 导入层
// ==========================================
// 职责: 收入表格导入（读取 → 模板匹配 → 映射 → 校验 → 落库）
// 支持: Excel (.xlsx/.xls), CSV
// ==========================================

// 模块声明
pub mod asset_extractor;
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;
pub mod revenue_importer;
pub mod template_matcher;

// 重导出核心类型
pub use asset_extractor::AssetExtractor;
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{
    CsvReader, ExcelReader, ParsedSheet, ParsedWorkbook, SpreadsheetFormat, UniversalReader,
};
pub use revenue_importer::{
    AnnexOutcome, ImportOutcome, ImportRequest, ImportSummary, PreviewReport, RevenueImporterImpl,
    SheetPreview,
};
pub use template_matcher::{TemplateMatch, TemplateMatcher};

// 重导出 Trait 接口
pub use importer_trait::{RevenueImporter, SpreadsheetReader};
