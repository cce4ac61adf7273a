// ==========================================
// 独立音乐人收入看板 - 资产提取器
// ==========================================
// 职责: 行字典 → 按资产名合计的收入贡献
// 说明: 资产名只做去空白，不做其他归一化
// ==========================================

use crate::domain::asset::AssetContribution;
use crate::domain::revenue::ImportSheet;
use crate::domain::template::ImportTemplate;
use crate::importer::data_cleaner::DataCleaner;
use std::collections::HashMap;

pub struct AssetExtractor {
    cleaner: DataCleaner,
}

impl Default for AssetExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetExtractor {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }

    /// 提取资产贡献（保持首次出现顺序）
    ///
    /// 模板缺少资产列或金额列时返回空列表
    pub fn extract(
        &self,
        template: &ImportTemplate,
        sheets: &[ImportSheet],
    ) -> Vec<AssetContribution> {
        let (Some(asset_col), Some(amount_col)) = (template.asset_column(), template.amount_column())
        else {
            return Vec::new();
        };

        let mut order: Vec<String> = Vec::new();
        let mut totals: HashMap<String, f64> = HashMap::new();

        let rows = sheets
            .iter()
            .flat_map(|sheet| sheet.rows.iter().map(move |row| (row, sheet.decimal_comma)));
        for (row, decimal_comma) in rows {
            let Some(name) = self
                .cleaner
                .normalize_null(row.get(asset_col).map(String::as_str))
            else {
                continue;
            };
            let Some(amount) = row
                .get(amount_col)
                .and_then(|raw| self.cleaner.parse_amount(raw, decimal_comma))
            else {
                continue;
            };

            match totals.get_mut(&name) {
                Some(total) => *total += amount,
                None => {
                    order.push(name.clone());
                    totals.insert(name, amount);
                }
            }
        }

        order
            .into_iter()
            .map(|name| {
                let amount = totals.get(&name).copied().unwrap_or_default();
                AssetContribution { name, amount }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ColumnRole;
    use std::collections::BTreeMap;

    fn template(with_asset: bool) -> ImportTemplate {
        let mut mappings = BTreeMap::from([("Net".to_string(), ColumnRole::Net)]);
        if with_asset {
            mappings.insert("Track".to_string(), ColumnRole::AssetName);
        }
        ImportTemplate {
            template_id: "t".to_string(),
            name: "T".to_string(),
            category: None,
            headers: vec!["Track".to_string(), "Net".to_string()],
            mappings,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn sheet(rows: Vec<HashMap<String, String>>, decimal_comma: bool) -> Vec<ImportSheet> {
        vec![ImportSheet {
            title: "s".to_string(),
            filename: "s.csv".to_string(),
            template_name: "T".to_string(),
            headers: vec!["Track".to_string(), "Net".to_string()],
            rows,
            decimal_comma,
        }]
    }

    fn row(track: &str, net: &str) -> HashMap<String, String> {
        HashMap::from([
            ("Track".to_string(), track.to_string()),
            ("Net".to_string(), net.to_string()),
        ])
    }

    #[test]
    fn test_groups_by_trimmed_name() {
        let rows = vec![
            row("Song A", "1.5"),
            row("Song B", "2"),
            row(" Song A ", "0.5"),
            row("", "9"),
            row("Song C", "n/a"),
        ];
        let assets = AssetExtractor::new().extract(&template(true), &sheet(rows, false));
        assert_eq!(
            assets,
            vec![
                AssetContribution {
                    name: "Song A".to_string(),
                    amount: 2.0
                },
                AssetContribution {
                    name: "Song B".to_string(),
                    amount: 2.0
                },
            ]
        );
    }

    #[test]
    fn test_no_asset_column() {
        let rows = vec![row("Song A", "1")];
        assert!(AssetExtractor::new()
            .extract(&template(false), &sheet(rows, false))
            .is_empty());
    }

    #[test]
    fn test_case_differences_are_distinct_assets() {
        let rows = vec![row("song a", "1"), row("Song A", "1")];
        assert_eq!(
            AssetExtractor::new()
                .extract(&template(true), &sheet(rows, false))
                .len(),
            2
        );
    }

    #[test]
    fn test_decimal_comma_sheet_amounts() {
        let rows = vec![row("Song A", "0,004"), row("Song A", "12,500")];
        let assets = AssetExtractor::new().extract(&template(true), &sheet(rows, true));
        assert_eq!(assets.len(), 1);
        assert!((assets[0].amount - 12.504).abs() < 1e-9);
    }
}
