// ==========================================
// 独立音乐人收入看板 - 收入记录 API
// ==========================================
// 职责: 收入来源字典、收入记录增删改查、导入载荷读取
// ==========================================

use std::sync::Arc;
use tracing::{debug, info};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{validate_amount, validate_quarter};
use crate::domain::revenue::{
    ImportPayload, RevenueEntry, RevenueEntryFilter, RevenueEntryInput, RevenueSource,
};
use crate::repository::revenue_entry_repo::RevenueEntryRepository;
use crate::repository::revenue_source_repo::RevenueSourceRepository;

pub struct RevenueApi {
    source_repo: Arc<RevenueSourceRepository>,
    entry_repo: Arc<RevenueEntryRepository>,
}

impl RevenueApi {
    pub fn new(
        source_repo: Arc<RevenueSourceRepository>,
        entry_repo: Arc<RevenueEntryRepository>,
    ) -> Self {
        Self {
            source_repo,
            entry_repo,
        }
    }

    // ==========================================
    // 收入来源
    // ==========================================

    pub fn list_revenue_sources(&self) -> ApiResult<Vec<RevenueSource>> {
        Ok(self.source_repo.list_all()?)
    }

    // ==========================================
    // 收入记录
    // ==========================================

    /// 列出收入记录（不含载荷）
    pub fn list_entries(&self, filter: &RevenueEntryFilter) -> ApiResult<Vec<RevenueEntry>> {
        let entries = self.entry_repo.list(filter)?;
        debug!(count = entries.len(), ?filter, "收入记录查询完成");
        Ok(entries)
    }

    pub fn get_entry(&self, entry_id: &str) -> ApiResult<RevenueEntry> {
        self.entry_repo
            .find_by_id(entry_id)?
            .ok_or_else(|| ApiError::not_found("RevenueEntry", entry_id))
    }

    /// 手工录入一条收入记录
    pub fn create_entry(&self, input: RevenueEntryInput) -> ApiResult<RevenueEntry> {
        self.validate_input(&input)?;
        let entry = self.entry_repo.create(&input)?;
        info!(
            entry_id = %entry.entry_id,
            source_id = entry.source_id,
            amount = entry.amount,
            "收入记录已录入"
        );
        Ok(entry)
    }

    pub fn update_entry(&self, entry_id: &str, input: RevenueEntryInput) -> ApiResult<RevenueEntry> {
        self.validate_input(&input)?;
        Ok(self.entry_repo.update(entry_id, &input)?)
    }

    /// 删除收入记录（同时扣减关联资产的累计收入）
    pub fn delete_entry(&self, entry_id: &str) -> ApiResult<()> {
        if !self.entry_repo.delete(entry_id)? {
            return Err(ApiError::not_found("RevenueEntry", entry_id));
        }
        info!(entry_id = %entry_id, "收入记录已删除");
        Ok(())
    }

    /// 读取导入载荷（手工录入的记录返回空载荷）
    pub fn get_entry_payload(&self, entry_id: &str) -> ApiResult<ImportPayload> {
        let entry = self
            .entry_repo
            .find_with_payload(entry_id)?
            .ok_or_else(|| ApiError::not_found("RevenueEntry", entry_id))?;
        Ok(entry.payload.unwrap_or_default())
    }

    fn validate_input(&self, input: &RevenueEntryInput) -> ApiResult<()> {
        validate_amount("金额", input.amount)?;
        validate_quarter(input.quarter)?;
        if self.source_repo.find_by_id(input.source_id)?.is_none() {
            return Err(ApiError::InvalidInput(format!(
                "收入来源不存在: {}",
                input.source_id
            )));
        }
        Ok(())
    }
}
