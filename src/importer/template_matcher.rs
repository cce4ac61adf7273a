// ==========================================
// 独立音乐人收入看板 - 模板匹配器
// ==========================================
// 职责: 首个 sheet 表头 → 已保存模板
// 口径: 表头列表 JSON 序列化逐字相等（顺序 / 大小写 / 空白均敏感）
// ==========================================

use crate::domain::template::ImportTemplate;
use crate::importer::error::ImportResult;
use crate::repository::revenue_import_repo::RevenueImportRepository;
use serde::Serialize;
use std::sync::Arc;

/// 匹配结果
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateMatch {
    Matched { template: ImportTemplate },
    NewStructure { headers: Vec<String> },
}

impl TemplateMatch {
    pub fn template(&self) -> Option<&ImportTemplate> {
        match self {
            TemplateMatch::Matched { template } => Some(template),
            TemplateMatch::NewStructure { .. } => None,
        }
    }
}

pub struct TemplateMatcher<R>
where
    R: RevenueImportRepository,
{
    repo: Arc<R>,
}

impl<R> TemplateMatcher<R>
where
    R: RevenueImportRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub fn match_headers(&self, headers: &[String]) -> ImportResult<TemplateMatch> {
        match self.repo.find_template_by_headers(headers)? {
            Some(template) => {
                tracing::debug!(
                    template_id = %template.template_id,
                    template_name = %template.name,
                    "表头匹配到模板"
                );
                Ok(TemplateMatch::Matched { template })
            }
            None => {
                tracing::debug!(header_count = headers.len(), "未匹配到模板，视为新结构");
                Ok(TemplateMatch::NewStructure {
                    headers: headers.to_vec(),
                })
            }
        }
    }
}
