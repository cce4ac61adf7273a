// ==========================================
// 独立音乐人收入看板 - 收入领域模型
// ==========================================
// 对齐: revenue_sources / revenue_entries 表
// 说明: data_json 为导入载荷（非范式化），按 sheet 存储原始行
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// RevenueSource - 收入来源（字典表）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueSource {
    pub source_id: i64,
    pub name: String,
}

// ==========================================
// ImportSheet / ImportPayload - 导入载荷
// ==========================================
// 一条收入记录可携带多个 sheet（首次导入 + 后续追加）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSheet {
    pub title: String,
    pub filename: String,
    pub template_name: String,
    /// 表头顺序（行字典本身无序）
    #[serde(default)]
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
    /// 金额列按小数逗号解析（分号分隔的 CSV）
    #[serde(default)]
    pub decimal_comma: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportPayload {
    pub sheets: Vec<ImportSheet>,
}

impl ImportPayload {
    pub fn row_count(&self) -> usize {
        self.sheets.iter().map(|s| s.rows.len()).sum()
    }

    /// 追加 sheet（Annex）
    pub fn annex(&mut self, sheets: Vec<ImportSheet>) {
        self.sheets.extend(sheets);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

// ==========================================
// RevenueEntry - 收入记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueEntry {
    pub entry_id: String,
    pub source_id: i64,
    pub amount: f64,
    pub entry_date: NaiveDate,
    pub description: String,

    // ===== 时间段（可选）=====
    pub year: Option<i32>,
    pub quarter: Option<u8>,

    // ===== 导入信息（可选）=====
    pub file_name: Option<String>,
    pub template_id: Option<String>,

    // ===== 目录关联（可选）=====
    pub album_id: Option<String>,
    pub track_id: Option<String>,
    pub campaign_id: Option<String>,

    /// 导入载荷（列表查询不返回）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<ImportPayload>,

    pub created_at: String,
    pub updated_at: String,
}

impl RevenueEntry {
    /// 是否带时间段（决定历史视图走时间序列还是合并求和）
    pub fn has_timeframe(&self) -> bool {
        self.year.is_some() || self.quarter.is_some()
    }
}

/// 收入记录写入参数（手工录入 / 更新）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueEntryInput {
    pub source_id: i64,
    pub amount: f64,
    pub entry_date: NaiveDate,
    #[serde(default)]
    pub description: String,
    pub year: Option<i32>,
    pub quarter: Option<u8>,
    pub file_name: Option<String>,
    pub template_id: Option<String>,
    pub album_id: Option<String>,
    pub track_id: Option<String>,
    pub campaign_id: Option<String>,
}

/// 列表过滤条件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevenueEntryFilter {
    pub source_id: Option<i64>,
    pub year: Option<i32>,
    pub template_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(title: &str, rows: usize) -> ImportSheet {
        ImportSheet {
            title: title.to_string(),
            filename: format!("{}.csv", title),
            template_name: "T".to_string(),
            headers: vec!["Track".to_string()],
            rows: (0..rows)
                .map(|i| HashMap::from([("Track".to_string(), format!("song {}", i))]))
                .collect(),
            decimal_comma: false,
        }
    }

    #[test]
    fn test_annex_appends_sheets() {
        let mut payload = ImportPayload {
            sheets: vec![sheet("a", 2)],
        };
        payload.annex(vec![sheet("b", 3)]);

        assert_eq!(payload.sheets.len(), 2);
        assert_eq!(payload.row_count(), 5);
        assert_eq!(payload.sheets[1].title, "b");
    }

    #[test]
    fn test_payload_json_keeps_sheet_fields() {
        let payload = ImportPayload {
            sheets: vec![sheet("q1", 1)],
        };
        let raw = payload.to_json().unwrap();
        assert!(raw.contains("\"template_name\":\"T\""));

        // 早期载荷没有 headers 字段
        let legacy = r#"{"sheets":[{"title":"x","filename":"x.csv","template_name":"T","rows":[]}]}"#;
        let parsed = ImportPayload::from_json(legacy).unwrap();
        assert!(parsed.sheets[0].headers.is_empty());
    }
}
