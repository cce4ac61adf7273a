// ==========================================
// 独立音乐人收入看板 - 领域类型定义
// ==========================================
// 职责: 收入来源、列角色等枚举类型
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// 收入来源 (Revenue Source Kind)
// ==========================================
// 固定字典表，启动时写入 revenue_sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevenueSourceKind {
    Merch,    // 周边商品
    LiveShow, // 现场演出
    Sync,     // 同步授权
    Streams,  // 流媒体
    Other,    // 其他
}

impl RevenueSourceKind {
    /// 全部来源（按 source_id 顺序）
    pub const ALL: [RevenueSourceKind; 5] = [
        RevenueSourceKind::Merch,
        RevenueSourceKind::LiveShow,
        RevenueSourceKind::Sync,
        RevenueSourceKind::Streams,
        RevenueSourceKind::Other,
    ];

    /// 数据库主键
    pub fn id(&self) -> i64 {
        match self {
            RevenueSourceKind::Merch => 1,
            RevenueSourceKind::LiveShow => 2,
            RevenueSourceKind::Sync => 3,
            RevenueSourceKind::Streams => 4,
            RevenueSourceKind::Other => 5,
        }
    }

    /// 展示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            RevenueSourceKind::Merch => "Merch",
            RevenueSourceKind::LiveShow => "Live Show",
            RevenueSourceKind::Sync => "Sync",
            RevenueSourceKind::Streams => "Streams",
            RevenueSourceKind::Other => "Other",
        }
    }
}

// ==========================================
// 列角色 (Column Role)
// ==========================================
// 模板映射: 原始表头 → 语义角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnRole {
    Amount,    // 金额
    Net,       // 净收入
    Gross,     // 毛收入
    Quantity,  // 数量（播放量/销量）
    Date,      // 日期
    AssetName, // 资产名称（曲目/专辑/商品）
    Store,     // 渠道/平台
    Territory, // 国家/地区
    Currency,  // 币种
    Ignore,    // 忽略
}

impl ColumnRole {
    /// 数值列（聚合时求和）
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnRole::Amount | ColumnRole::Net | ColumnRole::Gross | ColumnRole::Quantity
        )
    }
}

// ==========================================
// 时间段权重
// ==========================================
// 用于历史视图排序: year * 10 + quarter，缺失部分按 0 计
pub fn timeframe_weight(year: Option<i32>, quarter: Option<u8>) -> i64 {
    i64::from(year.unwrap_or(0)) * 10 + i64::from(quarter.unwrap_or(0))
}

/// 季度合法性（1..=4）
pub fn is_valid_quarter(quarter: u8) -> bool {
    (1..=4).contains(&quarter)
}
