// ==========================================
// 独立音乐人收入看板 - 收入表格导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到数据库
// 流程: 读取 → 模板匹配 → (新结构: 推荐映射) → 行重建 → 校验 → 资产提取 → 落库
// 说明: 无法解析的行只计数跳过，不是错误
// ==========================================

use crate::config::ImportConfigReader;
use crate::db::now_timestamp;
use crate::domain::asset::AssetContribution;
use crate::domain::revenue::{ImportPayload, ImportSheet, RevenueEntry};
use crate::domain::template::ImportTemplate;
use crate::domain::types::{is_valid_quarter, ColumnRole};
use crate::importer::asset_extractor::AssetExtractor;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{ParsedSheet, SpreadsheetFormat, UniversalReader};
use crate::importer::importer_trait::RevenueImporter;
use crate::importer::template_matcher::{TemplateMatch, TemplateMatcher};
use crate::repository::RevenueImportRepository;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// 请求 / 结果
// ==========================================

/// 导入请求（上传表单中的 json 字段）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportRequest {
    pub source_id: i64,
    /// 显式指定模板（跳过表头匹配，按该模板表头位置解析）
    pub template_id: Option<String>,
    /// 未匹配时按推荐映射新建模板
    pub create_template_name: Option<String>,
    /// 新建模板的分类（同时作为资产分类）
    pub category: Option<String>,
    pub year: Option<i32>,
    pub quarter: Option<u8>,
    pub description: Option<String>,
    pub entry_date: Option<NaiveDate>,
    /// 是否提取资产收入（未指定时读取配置）
    pub extract_assets: Option<bool>,
    pub album_id: Option<String>,
    pub track_id: Option<String>,
    pub campaign_id: Option<String>,
}

/// 成功导入的汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub entry: RevenueEntry,
    pub template: ImportTemplate,
    pub template_created: bool,
    pub sheet_count: usize,
    pub imported_rows: usize,
    pub skipped_rows: usize,
    pub assets_linked: usize,
}

/// 导入结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportOutcome {
    Imported(ImportSummary),
    /// 新结构且未要求新建模板: 未写入任何数据
    TemplateRequired {
        headers: Vec<String>,
        suggested_mappings: BTreeMap<String, ColumnRole>,
    },
}

/// Annex 结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnexOutcome {
    pub entry: RevenueEntry,
    pub template_name: String,
    pub sheet_count: usize,
    pub imported_rows: usize,
    pub skipped_rows: usize,
    pub added_amount: f64,
    pub assets_linked: usize,
}

/// 单个 sheet 的预览
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetPreview {
    pub title: String,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// 文件预览
#[derive(Debug, Clone, Serialize)]
pub struct PreviewReport {
    pub format: SpreadsheetFormat,
    pub sheets: Vec<SheetPreview>,
    pub match_result: TemplateMatch,
    pub suggested_mappings: BTreeMap<String, ColumnRole>,
}

/// 行校验后的 sheet
struct ValidatedSheets {
    sheets: Vec<ImportSheet>,
    imported_rows: usize,
    skipped_rows: usize,
    amount: f64,
    latest_date: Option<NaiveDate>,
}

// ==========================================
// RevenueImporterImpl - 收入导入器实现
// ==========================================
pub struct RevenueImporterImpl<R, C>
where
    R: RevenueImportRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    import_repo: Arc<R>,

    // 配置读取器
    config: Arc<C>,

    // 导入组件
    reader: UniversalReader,
    matcher: TemplateMatcher<R>,
    field_mapper: FieldMapper,
    data_cleaner: DataCleaner,
    asset_extractor: AssetExtractor,
}

impl<R, C> RevenueImporterImpl<R, C>
where
    R: RevenueImportRepository,
    C: ImportConfigReader,
{
    /// 创建新的 RevenueImporter 实例
    ///
    /// # 参数
    /// - import_repo: 导入数据仓储
    /// - config: 配置读取器
    pub fn new(import_repo: Arc<R>, config: Arc<C>) -> Self {
        Self {
            matcher: TemplateMatcher::new(import_repo.clone()),
            import_repo,
            config,
            reader: UniversalReader,
            field_mapper: FieldMapper,
            data_cleaner: DataCleaner,
            asset_extractor: AssetExtractor::new(),
        }
    }

    fn extract_assets_default(&self) -> ImportResult<bool> {
        self.config
            .get_extract_assets_default()
            .map_err(|e| ImportError::InternalError(format!("读取配置失败: {}", e)))
    }

    fn validate_request(&self, request: &ImportRequest) -> ImportResult<()> {
        if let Some(q) = request.quarter {
            if !is_valid_quarter(q) {
                return Err(ImportError::InvalidRequest(format!(
                    "季度必须在 1..=4 之间: {}",
                    q
                )));
            }
        }
        if let Some(name) = &request.create_template_name {
            if name.trim().is_empty() {
                return Err(ImportError::InvalidRequest("模板名称不能为空".to_string()));
            }
        }
        if !self.import_repo.source_exists(request.source_id)? {
            return Err(ImportError::InvalidRequest(format!(
                "收入来源不存在: {}",
                request.source_id
            )));
        }
        Ok(())
    }

    /// 按推荐映射推断新模板
    fn infer_template(&self, name: &str, category: Option<String>, headers: &[String]) -> ImportTemplate {
        let now = now_timestamp();
        ImportTemplate {
            template_id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            category,
            headers: headers.to_vec(),
            mappings: self.field_mapper.suggest_mappings(headers),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// 按模板表头重建行字典并校验
    ///
    /// 金额列（Amount > Net > Gross）或日期列已映射但无法解析时跳过该行
    fn validate_sheets(
        &self,
        template: &ImportTemplate,
        parsed: &[ParsedSheet],
        original_filename: &str,
    ) -> ValidatedSheets {
        let amount_col = template.amount_column();
        let date_col = template.date_column();

        let mut result = ValidatedSheets {
            sheets: Vec::new(),
            imported_rows: 0,
            skipped_rows: 0,
            amount: 0.0,
            latest_date: None,
        };

        for sheet in parsed {
            let mut rows = Vec::with_capacity(sheet.rows.len());

            for (idx, cells) in sheet.rows.iter().enumerate() {
                let record = self.field_mapper.row_to_record(&template.headers, cells);

                let amount = match amount_col {
                    Some(col) => {
                        match record
                            .get(col)
                            .and_then(|v| self.data_cleaner.parse_amount(v, sheet.decimal_comma))
                        {
                            Some(v) => v,
                            None => {
                                debug!(sheet = %sheet.title, row = idx + 1, column = col, "金额无法解析，跳过");
                                result.skipped_rows += 1;
                                continue;
                            }
                        }
                    }
                    None => 0.0,
                };

                if let Some(col) = date_col {
                    match record.get(col).and_then(|v| self.data_cleaner.parse_date(v)) {
                        Some(d) => {
                            if result.latest_date.map_or(true, |latest| d > latest) {
                                result.latest_date = Some(d);
                            }
                        }
                        None => {
                            debug!(sheet = %sheet.title, row = idx + 1, column = col, "日期无法解析，跳过");
                            result.skipped_rows += 1;
                            continue;
                        }
                    }
                }

                result.amount += amount;
                result.imported_rows += 1;
                rows.push(record);
            }

            if rows.is_empty() {
                continue;
            }
            result.sheets.push(ImportSheet {
                title: sheet.title.clone(),
                filename: original_filename.to_string(),
                template_name: template.name.clone(),
                headers: template.headers.clone(),
                rows,
                decimal_comma: sheet.decimal_comma,
            });
        }

        result
    }
}

impl<R, C> RevenueImporter for RevenueImporterImpl<R, C>
where
    R: RevenueImportRepository,
    C: ImportConfigReader,
{
    fn preview_file(&self, path: &Path) -> ImportResult<PreviewReport> {
        let workbook = self.reader.read(path)?;
        let headers = workbook.first_headers().unwrap_or(&[]).to_vec();
        let match_result = self.matcher.match_headers(&headers)?;
        let suggested_mappings = match match_result.template() {
            Some(template) => template.mappings.clone(),
            None => self.field_mapper.suggest_mappings(&headers),
        };

        Ok(PreviewReport {
            format: workbook.format,
            sheets: workbook
                .sheets
                .iter()
                .map(|s| SheetPreview {
                    title: s.title.clone(),
                    headers: s.headers.clone(),
                    row_count: s.rows.len(),
                })
                .collect(),
            match_result,
            suggested_mappings,
        })
    }

    #[instrument(skip(self, path, request))]
    fn import_file(
        &self,
        path: &Path,
        original_filename: &str,
        request: &ImportRequest,
    ) -> ImportResult<ImportOutcome> {
        self.validate_request(request)?;

        // === 步骤 1: 读取文件 ===
        let workbook = self.reader.read(path)?;
        let headers = workbook.first_headers().unwrap_or(&[]).to_vec();
        info!(
            format = ?workbook.format,
            sheets = workbook.sheets.len(),
            headers = headers.len(),
            "开始导入收入表格"
        );

        // === 步骤 2: 确定模板 ===
        let (template, new_template) = match &request.template_id {
            Some(template_id) => {
                let template = self
                    .import_repo
                    .find_template(template_id)?
                    .ok_or_else(|| ImportError::TemplateNotFound(template_id.clone()))?;
                if template.headers != headers {
                    warn!(template_id = %template_id, "文件表头与指定模板不一致，按模板表头位置解析");
                }
                (template, false)
            }
            None => match self.matcher.match_headers(&headers)? {
                TemplateMatch::Matched { template } => (template, false),
                TemplateMatch::NewStructure { headers } => match &request.create_template_name {
                    Some(name) => (
                        self.infer_template(name, request.category.clone(), &headers),
                        true,
                    ),
                    None => {
                        info!("新表格结构，等待用户确认模板");
                        return Ok(ImportOutcome::TemplateRequired {
                            suggested_mappings: self.field_mapper.suggest_mappings(&headers),
                            headers,
                        });
                    }
                },
            },
        };

        // === 步骤 3: 行重建 + 校验 ===
        let validated = self.validate_sheets(&template, &workbook.sheets, original_filename);
        info!(
            template = %template.name,
            imported_rows = validated.imported_rows,
            skipped_rows = validated.skipped_rows,
            amount = validated.amount,
            "行校验完成"
        );

        // === 步骤 4: 资产提取 ===
        let extract = match request.extract_assets {
            Some(flag) => flag,
            None => self.extract_assets_default()?,
        };
        let assets: Vec<AssetContribution> = if extract {
            self.asset_extractor.extract(&template, &validated.sheets)
        } else {
            Vec::new()
        };

        // === 步骤 5: 落库 ===
        let now = now_timestamp();
        let entry_date = request
            .entry_date
            .or(validated.latest_date)
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let entry = RevenueEntry {
            entry_id: Uuid::new_v4().to_string(),
            source_id: request.source_id,
            amount: validated.amount,
            entry_date,
            description: request
                .description
                .clone()
                .unwrap_or_else(|| format!("Imported {}", original_filename)),
            year: request.year,
            quarter: request.quarter,
            file_name: Some(original_filename.to_string()),
            template_id: Some(template.template_id.clone()),
            album_id: request.album_id.clone(),
            track_id: request.track_id.clone(),
            campaign_id: request.campaign_id.clone(),
            payload: Some(ImportPayload {
                sheets: validated.sheets.clone(),
            }),
            created_at: now.clone(),
            updated_at: now,
        };

        let category = template.category.clone().or_else(|| request.category.clone());
        let assets_linked = self.import_repo.save_import(
            if new_template { Some(&template) } else { None },
            &entry,
            &assets,
            category.as_deref(),
        )?;

        info!(
            entry_id = %entry.entry_id,
            template_created = new_template,
            assets_linked,
            "收入表格导入完成"
        );

        Ok(ImportOutcome::Imported(ImportSummary {
            sheet_count: validated.sheets.len(),
            imported_rows: validated.imported_rows,
            skipped_rows: validated.skipped_rows,
            entry: RevenueEntry {
                payload: None,
                ..entry
            },
            template,
            template_created: new_template,
            assets_linked,
        }))
    }

    #[instrument(skip(self, path))]
    fn annex_file(
        &self,
        entry_id: &str,
        path: &Path,
        original_filename: &str,
        extract_assets: Option<bool>,
    ) -> ImportResult<AnnexOutcome> {
        let entry = self
            .import_repo
            .find_entry_with_payload(entry_id)?
            .ok_or_else(|| ImportError::EntryNotFound(entry_id.to_string()))?;

        let workbook = self.reader.read(path)?;
        let headers = workbook.first_headers().unwrap_or(&[]).to_vec();

        // 记录关联的模板优先；模板已删除或手工记录时按文件表头匹配
        let linked = match &entry.template_id {
            Some(template_id) => self.import_repo.find_template(template_id)?,
            None => None,
        };
        let template = match linked {
            Some(t) => t,
            None => self.matcher.match_headers(&headers)?.template().cloned().ok_or_else(|| {
                ImportError::InvalidRequest("记录未关联模板，且文件表头未匹配任何模板".to_string())
            })?,
        };
        if template.headers != headers {
            warn!(template = %template.name, "追加文件表头与模板不一致，按模板表头位置解析");
        }

        let validated = self.validate_sheets(&template, &workbook.sheets, original_filename);

        let extract = match extract_assets {
            Some(flag) => flag,
            None => self.extract_assets_default()?,
        };
        let assets = if extract {
            self.asset_extractor.extract(&template, &validated.sheets)
        } else {
            Vec::new()
        };

        let mut payload = entry.payload.clone().unwrap_or_default();
        payload.annex(validated.sheets.clone());

        let (updated, assets_linked) = self.import_repo.save_annex(
            entry_id,
            &payload,
            validated.amount,
            &assets,
            template.category.as_deref(),
        )?;

        info!(
            entry_id,
            imported_rows = validated.imported_rows,
            skipped_rows = validated.skipped_rows,
            added_amount = validated.amount,
            "追加导入完成"
        );

        Ok(AnnexOutcome {
            entry: updated,
            template_name: template.name,
            sheet_count: validated.sheets.len(),
            imported_rows: validated.imported_rows,
            skipped_rows: validated.skipped_rows,
            added_amount: validated.amount,
            assets_linked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use crate::repository::RevenueImportRepositoryImpl;
    use rusqlite::Connection;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::{Builder, NamedTempFile};

    type Importer = RevenueImporterImpl<RevenueImportRepositoryImpl, ConfigManager>;

    fn setup() -> (Arc<Mutex<Connection>>, Importer) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let repo = Arc::new(RevenueImportRepositoryImpl::from_connection(conn.clone()).unwrap());
        let config = Arc::new(ConfigManager::from_connection(conn.clone()).unwrap());
        (conn, RevenueImporterImpl::new(repo, config))
    }

    fn csv(content: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const STATEMENT: &str = "Sale Date,Song,Store,Net Revenue\n\
        2024-01-15,Song A,Spotify,1.25\n\
        2024-02-20,Song B,Apple,2.75\n\
        bad date,Song A,Spotify,1.00\n\
        2024-03-01,Song A,Spotify,n/a\n\
        2024-03-05, Song A ,Tidal,1.00\n";

    fn request() -> ImportRequest {
        ImportRequest {
            source_id: 4,
            ..Default::default()
        }
    }

    fn imported(outcome: ImportOutcome) -> ImportSummary {
        match outcome {
            ImportOutcome::Imported(summary) => summary,
            other => panic!("expected import, got {:?}", other),
        }
    }

    #[test]
    fn test_new_structure_requires_template() {
        let (conn, importer) = setup();
        let file = csv(STATEMENT);

        let outcome = importer.import_file(file.path(), "jan.csv", &request()).unwrap();
        match outcome {
            ImportOutcome::TemplateRequired {
                headers,
                suggested_mappings,
            } => {
                assert_eq!(headers.len(), 4);
                assert_eq!(suggested_mappings.get("Net Revenue"), Some(&ColumnRole::Net));
                assert_eq!(suggested_mappings.get("Sale Date"), Some(&ColumnRole::Date));
            }
            other => panic!("unexpected {:?}", other),
        }

        let entries: i64 = conn
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM revenue_entries", [], |r| r.get(0))
            .unwrap();
        assert_eq!(entries, 0);
    }

    #[test]
    fn test_import_with_template_creation() {
        let (_conn, importer) = setup();
        let file = csv(STATEMENT);
        let req = ImportRequest {
            create_template_name: Some("Distro".to_string()),
            category: Some("Streaming".to_string()),
            ..request()
        };

        let summary = imported(importer.import_file(file.path(), "jan.csv", &req).unwrap());
        assert!(summary.template_created);
        assert_eq!(summary.imported_rows, 3);
        assert_eq!(summary.skipped_rows, 2);
        assert!((summary.entry.amount - 5.0).abs() < 1e-9);
        assert_eq!(
            summary.entry.entry_date,
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
        // Song A 与 " Song A " 合并
        assert_eq!(summary.assets_linked, 2);
        assert!(summary.entry.payload.is_none());

        // 同样的文件再次导入: 命中模板，行数一致
        let again = imported(importer.import_file(file.path(), "jan.csv", &request()).unwrap());
        assert!(!again.template_created);
        assert_eq!(again.template.template_id, summary.template.template_id);
        assert_eq!(again.imported_rows, summary.imported_rows);
    }

    #[test]
    fn test_annex_adds_only_new_rows() {
        let (_conn, importer) = setup();
        let first = csv(STATEMENT);
        let req = ImportRequest {
            create_template_name: Some("Distro".to_string()),
            ..request()
        };
        let summary = imported(importer.import_file(first.path(), "jan.csv", &req).unwrap());

        let second = csv("Sale Date,Song,Store,Net Revenue\n2024-04-01,Song C,Spotify,4.5\n");
        let annex = importer
            .annex_file(&summary.entry.entry_id, second.path(), "apr.csv", None)
            .unwrap();
        assert_eq!(annex.imported_rows, 1);
        assert_eq!(annex.assets_linked, 1);
        assert!((annex.entry.amount - 9.5).abs() < 1e-9);
    }

    #[test]
    fn test_annex_unknown_entry() {
        let (_conn, importer) = setup();
        let file = csv(STATEMENT);
        let err = importer
            .annex_file("missing", file.path(), "x.csv", None)
            .unwrap_err();
        assert!(matches!(err, ImportError::EntryNotFound(_)));
    }

    #[test]
    fn test_invalid_quarter_rejected() {
        let (_conn, importer) = setup();
        let file = csv(STATEMENT);
        let req = ImportRequest {
            quarter: Some(5),
            ..request()
        };
        let err = importer.import_file(file.path(), "x.csv", &req).unwrap_err();
        assert!(matches!(err, ImportError::InvalidRequest(_)));
    }

    #[test]
    fn test_unknown_source_rejected_before_reading() {
        let (conn, importer) = setup();
        let file = csv(STATEMENT);
        let req = ImportRequest {
            source_id: 99,
            create_template_name: Some("Distro".to_string()),
            ..request()
        };
        let err = importer.import_file(file.path(), "x.csv", &req).unwrap_err();
        assert!(matches!(err, ImportError::InvalidRequest(msg) if msg.contains("99")));

        let templates: i64 = conn
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM import_templates", [], |r| r.get(0))
            .unwrap();
        assert_eq!(templates, 0);
    }

    #[test]
    fn test_semicolon_statement_uses_decimal_comma() {
        let (_conn, importer) = setup();
        let file = csv("Date;Track;Net\n2024-01-05;Song A;0,004\n2024-01-06;Song A;0,125\n2024-01-07;Song B;12,500\n");
        let req = ImportRequest {
            create_template_name: Some("EU".to_string()),
            ..request()
        };
        let summary = imported(importer.import_file(file.path(), "eu.csv", &req).unwrap());
        assert_eq!(summary.imported_rows, 3);
        assert!((summary.entry.amount - 12.629).abs() < 1e-9);
    }

    #[test]
    fn test_preview_reports_match() {
        let (_conn, importer) = setup();
        let file = csv(STATEMENT);
        let preview = importer.preview_file(file.path()).unwrap();
        assert_eq!(preview.sheets.len(), 1);
        assert_eq!(preview.sheets[0].row_count, 5);
        assert!(matches!(preview.match_result, TemplateMatch::NewStructure { .. }));
    }
}
