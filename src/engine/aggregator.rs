// ==========================================
// 独立音乐人收入看板 - 历史视图聚合器
// ==========================================
// 职责: 模板关联的全部收入记录 → 单张展示表
// 规则:
// - 记录按 (year, quarter) 权重排序，缺失部分按 0 计（稳定排序）
// - 任一记录带时间段: 按顺序拼接全部行（时间序列）
// - 否则: 按全部非数值列取值分组，数值列求和；非数值字段取首行
// - 行中缺失的列按空串 / 0 处理
// ==========================================

use crate::domain::revenue::{ImportSheet, RevenueEntry};
use crate::domain::template::ImportTemplate;
use crate::domain::types::timeframe_weight;
use crate::importer::data_cleaner::DataCleaner;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 按列名识别的数值列（大小写不敏感）
pub const BUILTIN_NUMERIC_COLUMNS: [&str; 4] = ["net", "gross", "amount", "quantity"];

/// 时间序列模式下追加的期间列
pub const PERIOD_COLUMN: &str = "Period";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryMode {
    TimeSeries,
    Merged,
}

/// 展示表（rows 与 columns 按位置对齐）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayTable {
    pub mode: HistoryMode,
    pub columns: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub entry_count: usize,
}

pub struct Aggregator {
    cleaner: DataCleaner,
    extra_numeric: Vec<String>,
}

impl Aggregator {
    /// extra_numeric: 额外按列名识别为数值的表头（来自配置）
    pub fn new(extra_numeric: Vec<String>) -> Self {
        Self {
            cleaner: DataCleaner,
            extra_numeric: extra_numeric
                .into_iter()
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }

    fn is_numeric_column(&self, template: &ImportTemplate, column: &str) -> bool {
        let lowered = column.trim().to_lowercase();
        BUILTIN_NUMERIC_COLUMNS.contains(&lowered.as_str())
            || self.extra_numeric.contains(&lowered)
            || template
                .mappings
                .get(column)
                .map(|role| role.is_numeric())
                .unwrap_or(false)
    }

    pub fn build(&self, template: &ImportTemplate, entries: &[RevenueEntry]) -> DisplayTable {
        let mut ordered: Vec<&RevenueEntry> = entries.iter().collect();
        ordered.sort_by_key(|e| timeframe_weight(e.year, e.quarter));

        let columns = collect_columns(template, &ordered);
        let numeric_columns: Vec<String> = columns
            .iter()
            .filter(|c| self.is_numeric_column(template, c))
            .cloned()
            .collect();

        if ordered.iter().any(|e| e.has_timeframe()) {
            self.time_series(columns, numeric_columns, &ordered)
        } else {
            self.merged(columns, numeric_columns, &ordered)
        }
    }

    fn time_series(
        &self,
        columns: Vec<String>,
        numeric_columns: Vec<String>,
        entries: &[&RevenueEntry],
    ) -> DisplayTable {
        let mut rows = Vec::new();
        for entry in entries {
            let period = period_label(entry);
            for sheet in sheets_of(entry) {
                for record in &sheet.rows {
                    let mut cells = Vec::with_capacity(columns.len() + 1);
                    cells.push(period.clone());
                    cells.extend(
                        columns
                            .iter()
                            .map(|c| record.get(c).cloned().unwrap_or_default()),
                    );
                    rows.push(cells);
                }
            }
        }

        let mut all_columns = Vec::with_capacity(columns.len() + 1);
        all_columns.push(PERIOD_COLUMN.to_string());
        all_columns.extend(columns);

        DisplayTable {
            mode: HistoryMode::TimeSeries,
            columns: all_columns,
            numeric_columns,
            rows,
            entry_count: entries.len(),
        }
    }

    fn merged(
        &self,
        columns: Vec<String>,
        numeric_columns: Vec<String>,
        entries: &[&RevenueEntry],
    ) -> DisplayTable {
        let is_numeric: Vec<bool> = columns
            .iter()
            .map(|c| numeric_columns.contains(c))
            .collect();

        // 分组键 → (首行展示值, 数值列合计)
        let mut group_index: HashMap<Vec<String>, usize> = HashMap::new();
        let mut groups: Vec<(Vec<String>, Vec<f64>)> = Vec::new();

        for entry in entries {
            for sheet in sheets_of(entry) {
                for record in &sheet.rows {
                    let values: Vec<String> = columns
                        .iter()
                        .map(|c| record.get(c).cloned().unwrap_or_default())
                        .collect();
                    let key: Vec<String> = values
                        .iter()
                        .zip(&is_numeric)
                        .filter(|(_, numeric)| !**numeric)
                        .map(|(v, _)| v.trim().to_string())
                        .collect();
                    let numbers: Vec<f64> = values
                        .iter()
                        .zip(&is_numeric)
                        .map(|(v, numeric)| {
                            if *numeric {
                                self.cleaner
                                    .parse_amount(v, sheet.decimal_comma)
                                    .unwrap_or(0.0)
                            } else {
                                0.0
                            }
                        })
                        .collect();

                    match group_index.get(&key) {
                        Some(&idx) => {
                            let sums = &mut groups[idx].1;
                            for (sum, n) in sums.iter_mut().zip(&numbers) {
                                *sum += n;
                            }
                        }
                        None => {
                            group_index.insert(key, groups.len());
                            groups.push((values, numbers));
                        }
                    }
                }
            }
        }

        let rows = groups
            .into_iter()
            .map(|(values, sums)| {
                values
                    .into_iter()
                    .zip(is_numeric.iter().zip(sums))
                    .map(|(value, (numeric, sum))| {
                        if *numeric {
                            format_number(sum)
                        } else {
                            value
                        }
                    })
                    .collect()
            })
            .collect();

        DisplayTable {
            mode: HistoryMode::Merged,
            columns,
            numeric_columns,
            rows,
            entry_count: entries.len(),
        }
    }
}

fn sheets_of(entry: &RevenueEntry) -> &[ImportSheet] {
    entry
        .payload
        .as_ref()
        .map(|p| p.sheets.as_slice())
        .unwrap_or(&[])
}

/// 列顺序: 模板表头在前，其余按首次出现追加（旧载荷无 headers 时按键名排序）
fn collect_columns(template: &ImportTemplate, entries: &[&RevenueEntry]) -> Vec<String> {
    fn push(name: &str, columns: &mut Vec<String>) {
        if !columns.iter().any(|c| c == name) {
            columns.push(name.to_string());
        }
    }

    let mut columns: Vec<String> = template.headers.clone();

    for entry in entries {
        for sheet in sheets_of(entry) {
            if sheet.headers.is_empty() {
                let mut keys: Vec<&String> = sheet.rows.iter().flat_map(|r| r.keys()).collect();
                keys.sort();
                for key in keys {
                    push(key.as_str(), &mut columns);
                }
            } else {
                for header in &sheet.headers {
                    push(header.as_str(), &mut columns);
                }
            }
        }
    }
    columns
}

fn period_label(entry: &RevenueEntry) -> String {
    match (entry.year, entry.quarter) {
        (Some(y), Some(q)) => format!("{} Q{}", y, q),
        (Some(y), None) => y.to_string(),
        (None, Some(q)) => format!("Q{}", q),
        (None, None) => String::new(),
    }
}

/// 合计值格式化（最多 4 位小数，去掉末尾 0）
pub fn format_number(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    let text = format!("{:.4}", rounded);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
