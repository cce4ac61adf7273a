// ==========================================
// 独立音乐人收入看板 - 资产领域模型
// ==========================================
// 对齐: assets / asset_revenues 表
// 约束: assets.total_revenue = SUM(asset_revenues.amount)
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub asset_id: String,
    pub name: String,
    pub category: Option<String>,
    pub total_revenue: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRevenue {
    pub asset_revenue_id: String,
    pub asset_id: String,
    pub entry_id: String,
    pub amount: f64,
    pub created_at: String,
}

/// 资产提取结果（单个资产在一次导入中的合计）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetContribution {
    pub name: String,
    pub amount: f64,
}
