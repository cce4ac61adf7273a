// ==========================================
// 独立音乐人收入看板 - 字段映射器实现
// ==========================================
// 职责: 原始表头 → 语义角色（推荐 / 校验）+ 行字典构建
// 说明: 推荐仅基于列名关键字，结果由用户在映射编辑器中确认
// ==========================================

use crate::domain::types::ColumnRole;
use crate::importer::error::{ImportError, ImportResult};
use std::collections::{BTreeMap, HashMap};

/// 角色关键字表（按优先级，命中第一个即返回）
///
/// Net / Gross 必须排在 Amount 之前: "Net Revenue" 应识别为 Net
const ROLE_KEYWORDS: &[(ColumnRole, &[&str])] = &[
    (ColumnRole::Net, &["net"]),
    (ColumnRole::Gross, &["gross"]),
    (ColumnRole::Currency, &["currency", "curr"]),
    (
        ColumnRole::Amount,
        &["amount", "earnings", "revenue", "royalt", "payout", "income", "total"],
    ),
    (ColumnRole::Quantity, &["quantity", "qty", "units", "streams", "plays", "downloads"]),
    (ColumnRole::Date, &["date", "period", "month"]),
    (
        ColumnRole::AssetName,
        &["track", "title", "song", "asset", "product", "release", "isrc"],
    ),
    (ColumnRole::Store, &["store", "platform", "service", "dsp", "retailer", "channel"]),
    (ColumnRole::Territory, &["country", "territory", "region", "market"]),
];

pub struct FieldMapper;

impl FieldMapper {
    /// 按列名推荐角色（无法识别时返回 None）
    pub fn suggest_role(&self, header: &str) -> Option<ColumnRole> {
        let lowered = header.trim().to_lowercase();
        if lowered.is_empty() {
            return None;
        }
        ROLE_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(role, _)| *role)
    }

    /// 为整组表头推荐映射
    ///
    /// 日期 / 资产 角色各只推荐一列（按表头顺序第一个），其余同角色列标记为 Ignore
    ///
    /// 金额类角色（Amount / Net / Gross）可以推荐多列，导入时按 Amount > Net > Gross 取一列
    pub fn suggest_mappings(&self, headers: &[String]) -> BTreeMap<String, ColumnRole> {
        let mut mappings = BTreeMap::new();
        let mut taken: Vec<ColumnRole> = Vec::new();

        for header in headers {
            let Some(role) = self.suggest_role(header) else {
                continue;
            };
            let single = matches!(role, ColumnRole::Date | ColumnRole::AssetName);
            if single && taken.contains(&role) {
                mappings.insert(header.clone(), ColumnRole::Ignore);
                continue;
            }
            if single {
                taken.push(role);
            }
            mappings.insert(header.clone(), role);
        }

        mappings
    }

    /// 校验映射: 键必须是模板表头
    pub fn validate_mappings(
        &self,
        headers: &[String],
        mappings: &BTreeMap<String, ColumnRole>,
    ) -> ImportResult<()> {
        for header in mappings.keys() {
            if !headers.iter().any(|h| h == header) {
                return Err(ImportError::InvalidMapping {
                    header: header.clone(),
                    message: "不是模板表头".to_string(),
                });
            }
        }
        Ok(())
    }

    /// 按表头位置构建行字典
    ///
    /// 单元格少于表头时补空串，多出的单元格丢弃
    pub fn row_to_record(&self, headers: &[String], cells: &[String]) -> HashMap<String, String> {
        headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                (
                    header.clone(),
                    cells.get(idx).cloned().unwrap_or_default(),
                )
            })
            .collect()
    }
}
