// ==========================================
// 独立音乐人收入看板 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑
// ==========================================

pub mod asset;
pub mod catalog;
pub mod revenue;
pub mod template;
pub mod types;

// 重导出核心类型
pub use asset::{Asset, AssetContribution, AssetRevenue};
pub use catalog::{
    Album, AlbumInput, Artist, ArtistInput, Campaign, CampaignInput, Track, TrackInput,
};
pub use revenue::{
    ImportPayload, ImportSheet, RevenueEntry, RevenueEntryFilter, RevenueEntryInput,
    RevenueSource,
};
pub use template::{headers_fingerprint, ImportTemplate, ImportTemplateInput};
pub use types::{ColumnRole, RevenueSourceKind};
