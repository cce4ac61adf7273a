// ==========================================
// 独立音乐人收入看板 - 导入模板领域模型
// ==========================================
// 对齐: import_templates 表
// 匹配口径: 表头列表 JSON 序列化后逐字相等
// ==========================================

use crate::domain::types::ColumnRole;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 表头列表指纹（模板匹配唯一依据）
pub fn headers_fingerprint(headers: &[String]) -> String {
    // Vec<String> 的序列化不会失败
    serde_json::to_string(headers).unwrap_or_default()
}

// ==========================================
// ImportTemplate - 导入模板
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportTemplate {
    pub template_id: String,
    pub name: String,
    pub category: Option<String>,
    pub headers: Vec<String>,
    /// 原始表头 → 语义角色
    pub mappings: BTreeMap<String, ColumnRole>,
    pub created_at: String,
    pub updated_at: String,
}

impl ImportTemplate {
    /// 按表头顺序查找第一个映射为 role 的列
    pub fn column_for(&self, role: ColumnRole) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| self.mappings.get(h.as_str()) == Some(&role))
            .map(|h| h.as_str())
    }

    /// 金额列（优先级 Amount > Net > Gross）
    pub fn amount_column(&self) -> Option<&str> {
        self.column_for(ColumnRole::Amount)
            .or_else(|| self.column_for(ColumnRole::Net))
            .or_else(|| self.column_for(ColumnRole::Gross))
    }

    pub fn date_column(&self) -> Option<&str> {
        self.column_for(ColumnRole::Date)
    }

    pub fn asset_column(&self) -> Option<&str> {
        self.column_for(ColumnRole::AssetName)
    }
}

/// 模板写入参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportTemplateInput {
    pub name: String,
    pub category: Option<String>,
    pub headers: Vec<String>,
    #[serde(default)]
    pub mappings: BTreeMap<String, ColumnRole>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(mappings: &[(&str, ColumnRole)]) -> ImportTemplate {
        ImportTemplate {
            template_id: "t1".to_string(),
            name: "Distributor".to_string(),
            category: Some("Streams".to_string()),
            headers: vec![
                "Date".to_string(),
                "Track".to_string(),
                "Gross".to_string(),
                "Net".to_string(),
            ],
            mappings: mappings
                .iter()
                .map(|(h, r)| (h.to_string(), *r))
                .collect(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_fingerprint_is_order_sensitive() {
        let a = headers_fingerprint(&["A".to_string(), "B".to_string()]);
        let b = headers_fingerprint(&["B".to_string(), "A".to_string()]);
        assert_ne!(a, b);
        assert_eq!(a, r#"["A","B"]"#);
    }

    #[test]
    fn test_amount_column_priority() {
        let t = template(&[("Gross", ColumnRole::Gross), ("Net", ColumnRole::Net)]);
        assert_eq!(t.amount_column(), Some("Net"));

        let t = template(&[("Gross", ColumnRole::Gross)]);
        assert_eq!(t.amount_column(), Some("Gross"));

        let t = template(&[("Track", ColumnRole::AssetName)]);
        assert_eq!(t.amount_column(), None);
        assert_eq!(t.asset_column(), Some("Track"));
    }
}
