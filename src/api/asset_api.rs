// ==========================================
// 独立音乐人收入看板 - 资产 API
// ==========================================
// 职责: 资产（曲目 / 商品等收入对象）查询、重命名、删除、累计收入重算
// ==========================================

use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::require_non_empty;
use crate::domain::asset::{Asset, AssetRevenue};
use crate::repository::asset_repo::AssetRepository;

pub struct AssetApi {
    asset_repo: Arc<AssetRepository>,
}

impl AssetApi {
    pub fn new(asset_repo: Arc<AssetRepository>) -> Self {
        Self { asset_repo }
    }

    /// 全部资产（累计收入倒序）
    pub fn list_assets(&self) -> ApiResult<Vec<Asset>> {
        Ok(self.asset_repo.list_all()?)
    }

    pub fn get_asset(&self, asset_id: &str) -> ApiResult<Asset> {
        self.asset_repo
            .find_by_id(asset_id)?
            .ok_or_else(|| ApiError::not_found("Asset", asset_id))
    }

    pub fn list_asset_revenues(&self, asset_id: &str) -> ApiResult<Vec<AssetRevenue>> {
        // 区分"资产不存在"与"没有收入明细"
        self.get_asset(asset_id)?;
        Ok(self.asset_repo.list_revenues(asset_id)?)
    }

    pub fn rename_asset(&self, asset_id: &str, name: &str) -> ApiResult<Asset> {
        let name = require_non_empty("资产名称", name)?;
        let asset = self.asset_repo.rename(asset_id, &name)?;
        info!(asset_id = %asset_id, name = %asset.name, "资产已重命名");
        Ok(asset)
    }

    /// 删除资产（收入明细一并删除，收入记录不受影响）
    pub fn delete_asset(&self, asset_id: &str) -> ApiResult<()> {
        if !self.asset_repo.delete(asset_id)? {
            return Err(ApiError::not_found("Asset", asset_id));
        }
        info!(asset_id = %asset_id, "资产已删除");
        Ok(())
    }

    /// 按收入明细重算全部资产累计值，返回被修正的资产数
    pub fn recompute_asset_totals(&self) -> ApiResult<usize> {
        let changed = self.asset_repo.recompute_totals()?;
        info!(changed, "资产累计收入重算完成");
        Ok(changed)
    }
}
