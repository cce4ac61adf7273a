// ==========================================
// 独立音乐人收入看板 - 导入模板 API
// ==========================================
// 职责: 模板增删改查、映射编辑、表头匹配、角色推荐、历史视图
// 说明: 删除模板不删除收入记录，只置空其 template_id
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::require_non_empty;
use crate::config::{ConfigManager, ImportConfigReader};
use crate::db::now_timestamp;
use crate::domain::template::{ImportTemplate, ImportTemplateInput};
use crate::domain::types::ColumnRole;
use crate::engine::aggregator::{Aggregator, DisplayTable};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::trim_cell;
use crate::importer::template_matcher::TemplateMatch;
use crate::repository::revenue_entry_repo::RevenueEntryRepository;
use crate::repository::template_repo::ImportTemplateRepository;

/// 名称 / 分类更新参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateMetaUpdate {
    pub name: String,
    pub category: Option<String>,
}

pub struct TemplateApi {
    template_repo: Arc<ImportTemplateRepository>,
    entry_repo: Arc<RevenueEntryRepository>,
    config_manager: Arc<ConfigManager>,
    field_mapper: FieldMapper,
}

impl TemplateApi {
    pub fn new(
        template_repo: Arc<ImportTemplateRepository>,
        entry_repo: Arc<RevenueEntryRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            template_repo,
            entry_repo,
            config_manager,
            field_mapper: FieldMapper,
        }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    pub fn list_templates(&self) -> ApiResult<Vec<ImportTemplate>> {
        Ok(self.template_repo.list_all()?)
    }

    pub fn get_template(&self, template_id: &str) -> ApiResult<ImportTemplate> {
        self.template_repo
            .find_by_id(template_id)?
            .ok_or_else(|| ApiError::not_found("ImportTemplate", template_id))
    }

    /// 按表头列表匹配已有模板（去首尾空白后逐字相等）
    pub fn match_headers(&self, headers: Vec<String>) -> ApiResult<TemplateMatch> {
        let headers: Vec<String> = headers.iter().map(|h| trim_cell(h)).collect();
        Ok(match self.template_repo.find_by_headers(&headers)? {
            Some(template) => TemplateMatch::Matched { template },
            None => TemplateMatch::NewStructure { headers },
        })
    }

    /// 为表头推荐角色（未识别的列不出现在结果中）
    pub fn suggest_mappings(&self, headers: &[String]) -> BTreeMap<String, ColumnRole> {
        self.field_mapper.suggest_mappings(headers)
    }

    // ==========================================
    // 写入接口
    // ==========================================

    /// 新建模板
    ///
    /// 表头与映射键按读取表格时的规则去首尾空白；mappings 为空时按表头推荐映射填充
    pub fn create_template(&self, input: ImportTemplateInput) -> ApiResult<ImportTemplate> {
        let name = require_non_empty("模板名称", &input.name)?;
        let headers = normalize_headers(&input.headers)?;

        let mappings = if input.mappings.is_empty() {
            self.field_mapper.suggest_mappings(&headers)
        } else {
            let mappings = normalize_mapping_keys(input.mappings);
            self.field_mapper.validate_mappings(&headers, &mappings)?;
            mappings
        };

        if self.template_repo.find_by_headers(&headers)?.is_some() {
            warn!(name = %name, "已存在相同表头的模板，匹配时以最早创建者为准");
        }

        let now = now_timestamp();
        let template = ImportTemplate {
            template_id: Uuid::new_v4().to_string(),
            name,
            category: normalize_category(input.category),
            headers,
            mappings,
            created_at: now.clone(),
            updated_at: now,
        };
        self.template_repo.insert(&template)?;
        info!(template_id = %template.template_id, name = %template.name, "导入模板已创建");
        Ok(template)
    }

    pub fn update_template(
        &self,
        template_id: &str,
        update: TemplateMetaUpdate,
    ) -> ApiResult<ImportTemplate> {
        let name = require_non_empty("模板名称", &update.name)?;
        let category = normalize_category(update.category);
        self.template_repo
            .update_meta(template_id, &name, category.as_deref())?;
        self.get_template(template_id)
    }

    /// 映射编辑器: 整体覆盖表头 → 角色映射
    pub fn update_mappings(
        &self,
        template_id: &str,
        mappings: BTreeMap<String, ColumnRole>,
    ) -> ApiResult<ImportTemplate> {
        let template = self.get_template(template_id)?;
        let mappings = normalize_mapping_keys(mappings);
        self.field_mapper
            .validate_mappings(&template.headers, &mappings)?;
        self.template_repo.update_mappings(template_id, &mappings)?;
        info!(template_id = %template_id, mapped = mappings.len(), "模板映射已更新");
        self.get_template(template_id)
    }

    pub fn delete_template(&self, template_id: &str) -> ApiResult<()> {
        if !self.template_repo.delete(template_id)? {
            return Err(ApiError::not_found("ImportTemplate", template_id));
        }
        info!(template_id = %template_id, "导入模板已删除");
        Ok(())
    }

    // ==========================================
    // 历史视图
    // ==========================================

    /// 模板关联的全部收入记录聚合为一张展示表
    #[instrument(skip(self))]
    pub fn template_history(&self, template_id: &str) -> ApiResult<DisplayTable> {
        let template = self.get_template(template_id)?;
        let entries = self.entry_repo.list_with_payload_by_template(template_id)?;
        let extra_numeric = self
            .config_manager
            .get_extra_numeric_columns()
            .map_err(|e| ApiError::InternalError(format!("读取配置失败: {}", e)))?;

        let table = Aggregator::new(extra_numeric).build(&template, &entries);
        info!(
            entries = table.entry_count,
            rows = table.rows.len(),
            mode = ?table.mode,
            "历史视图聚合完成"
        );
        Ok(table)
    }
}

/// 去首尾空白后校验: 非空、无空列、无重复
fn normalize_headers(headers: &[String]) -> ApiResult<Vec<String>> {
    if headers.is_empty() {
        return Err(ApiError::InvalidInput("模板表头不能为空".to_string()));
    }
    let mut normalized: Vec<String> = Vec::with_capacity(headers.len());
    for (idx, header) in headers.iter().enumerate() {
        let header = trim_cell(header);
        if header.is_empty() {
            return Err(ApiError::InvalidInput(format!("第 {} 列表头为空", idx + 1)));
        }
        if normalized.contains(&header) {
            return Err(ApiError::InvalidInput(format!("表头重复: {}", header)));
        }
        normalized.push(header);
    }
    Ok(normalized)
}

fn normalize_mapping_keys(mappings: BTreeMap<String, ColumnRole>) -> BTreeMap<String, ColumnRole> {
    mappings
        .into_iter()
        .map(|(header, role)| (trim_cell(&header), role))
        .collect()
}

fn normalize_category(category: Option<String>) -> Option<String> {
    category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn setup() -> TemplateApi {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        TemplateApi::new(
            Arc::new(ImportTemplateRepository::from_connection(conn.clone()).unwrap()),
            Arc::new(RevenueEntryRepository::from_connection(conn.clone()).unwrap()),
            Arc::new(ConfigManager::from_connection(conn).unwrap()),
        )
    }

    fn headers(list: &[&str]) -> Vec<String> {
        list.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn test_create_with_empty_mappings_uses_suggestions() {
        let api = setup();
        let template = api
            .create_template(ImportTemplateInput {
                name: "DistroKid".to_string(),
                category: Some(" Streams ".to_string()),
                headers: headers(&["Sale Month", "Title", "Earnings (USD)"]),
                mappings: BTreeMap::new(),
            })
            .unwrap();

        assert_eq!(template.category.as_deref(), Some("Streams"));
        assert_eq!(template.mappings.get("Sale Month"), Some(&ColumnRole::Date));
        assert_eq!(template.mappings.get("Title"), Some(&ColumnRole::AssetName));
    }

    #[test]
    fn test_create_rejects_bad_headers_and_mappings() {
        let api = setup();
        let dup = api.create_template(ImportTemplateInput {
            name: "T".to_string(),
            category: None,
            headers: headers(&["A", "A"]),
            mappings: BTreeMap::new(),
        });
        assert!(matches!(dup, Err(ApiError::InvalidInput(_))));

        let bad_mapping = api.create_template(ImportTemplateInput {
            name: "T".to_string(),
            category: None,
            headers: headers(&["A", "B"]),
            mappings: BTreeMap::from([("C".to_string(), ColumnRole::Amount)]),
        });
        assert!(matches!(bad_mapping, Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_match_is_exact_header_list() {
        let api = setup();
        api.create_template(ImportTemplateInput {
            name: "Bandcamp".to_string(),
            category: None,
            headers: headers(&["date", "item name", "net amount"]),
            mappings: BTreeMap::new(),
        })
        .unwrap();

        let exact = api
            .match_headers(headers(&["date", "item name", "net amount"]))
            .unwrap();
        assert!(exact.template().is_some());

        let renamed = api
            .match_headers(headers(&["date", "item", "net amount"]))
            .unwrap();
        assert!(matches!(renamed, TemplateMatch::NewStructure { .. }));
    }

    #[test]
    fn test_headers_are_trimmed_on_create_and_match() {
        let api = setup();
        let template = api
            .create_template(ImportTemplateInput {
                name: "Padded".to_string(),
                category: None,
                headers: headers(&["Date ", " Net"]),
                mappings: BTreeMap::from([(" Net ".to_string(), ColumnRole::Net)]),
            })
            .unwrap();
        assert_eq!(template.headers, headers(&["Date", "Net"]));
        assert_eq!(template.mappings.get("Net"), Some(&ColumnRole::Net));

        let matched = api.match_headers(headers(&["Date", "Net "])).unwrap();
        assert_eq!(
            matched.template().map(|t| t.template_id.as_str()),
            Some(template.template_id.as_str())
        );

        let dup = api.create_template(ImportTemplateInput {
            name: "Dup".to_string(),
            category: None,
            headers: headers(&["Net", "Net "]),
            mappings: BTreeMap::new(),
        });
        assert!(matches!(dup, Err(ApiError::InvalidInput(msg)) if msg.contains("Net")));
    }

    #[test]
    fn test_update_mappings_and_meta() {
        let api = setup();
        let template = api
            .create_template(ImportTemplateInput {
                name: "Old".to_string(),
                category: None,
                headers: headers(&["When", "What", "Paid"]),
                mappings: BTreeMap::new(),
            })
            .unwrap();

        let updated = api
            .update_mappings(
                &template.template_id,
                BTreeMap::from([
                    ("When".to_string(), ColumnRole::Date),
                    ("Paid".to_string(), ColumnRole::Amount),
                ]),
            )
            .unwrap();
        assert_eq!(updated.amount_column(), Some("Paid"));

        let renamed = api
            .update_template(
                &template.template_id,
                TemplateMetaUpdate {
                    name: "New".to_string(),
                    category: Some("".to_string()),
                },
            )
            .unwrap();
        assert_eq!(renamed.name, "New");
        assert!(renamed.category.is_none());
    }

    #[test]
    fn test_history_of_template_without_entries_is_empty() {
        let api = setup();
        let template = api
            .create_template(ImportTemplateInput {
                name: "Empty".to_string(),
                category: None,
                headers: headers(&["Date", "Amount"]),
                mappings: BTreeMap::new(),
            })
            .unwrap();

        let table = api.template_history(&template.template_id).unwrap();
        assert_eq!(table.entry_count, 0);
        assert!(table.rows.is_empty());
        assert!(matches!(
            api.template_history("missing"),
            Err(ApiError::NotFound(_))
        ));
    }
}
