// ==========================================
// 独立音乐人收入看板 - 看板 API
// ==========================================
// 职责: 看板指标聚合（总收入、计数、按来源 / 期间汇总、头部资产）
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::api::error::ApiResult;
use crate::domain::asset::Asset;
use crate::repository::asset_repo::AssetRepository;
use crate::repository::dashboard_repo::{DashboardRepository, PeriodRevenue, SourceRevenue};

/// 看板头部资产数量
pub const TOP_ASSET_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_revenue: f64,
    pub entry_count: i64,
    pub template_count: i64,
    pub asset_count: i64,
    pub revenue_by_source: Vec<SourceRevenue>,
    pub revenue_by_period: Vec<PeriodRevenue>,
    pub top_assets: Vec<Asset>,
}

pub struct DashboardApi {
    dashboard_repo: Arc<DashboardRepository>,
    asset_repo: Arc<AssetRepository>,
}

impl DashboardApi {
    pub fn new(dashboard_repo: Arc<DashboardRepository>, asset_repo: Arc<AssetRepository>) -> Self {
        Self {
            dashboard_repo,
            asset_repo,
        }
    }

    pub fn metrics(&self) -> ApiResult<DashboardMetrics> {
        let counts = self.dashboard_repo.counts()?;
        let metrics = DashboardMetrics {
            total_revenue: counts.total_revenue,
            entry_count: counts.entry_count,
            template_count: counts.template_count,
            asset_count: counts.asset_count,
            revenue_by_source: self.dashboard_repo.revenue_by_source()?,
            revenue_by_period: self.dashboard_repo.revenue_by_period()?,
            top_assets: self.asset_repo.top(TOP_ASSET_LIMIT)?,
        };
        debug!(
            total_revenue = metrics.total_revenue,
            entries = metrics.entry_count,
            "看板指标已计算"
        );
        Ok(metrics)
    }
}
