// ==========================================
// 独立音乐人收入看板 - 输入校验
// ==========================================
// 职责: API 层共用的字段校验（名称、季度、金额、日期区间）
// ==========================================

use chrono::NaiveDate;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::types::is_valid_quarter;

/// 名称 / 标题不能为空白，返回去除首尾空白后的值
pub fn require_non_empty(field: &str, value: &str) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(trimmed.to_string())
}

pub fn validate_quarter(quarter: Option<u8>) -> ApiResult<()> {
    match quarter {
        Some(q) if !is_valid_quarter(q) => Err(ApiError::InvalidInput(format!(
            "季度必须在 1..=4 之间: {}",
            q
        ))),
        _ => Ok(()),
    }
}

/// 金额必须是有限数（NaN / inf 无法落库求和）
pub fn validate_amount(field: &str, amount: f64) -> ApiResult<()> {
    if !amount.is_finite() {
        return Err(ApiError::InvalidInput(format!("{}不是有效数值", field)));
    }
    Ok(())
}

pub fn validate_non_negative(field: &str, value: f64) -> ApiResult<()> {
    validate_amount(field, value)?;
    if value < 0.0 {
        return Err(ApiError::InvalidInput(format!("{}不能为负数: {}", field, value)));
    }
    Ok(())
}

/// 结束日期不能早于开始日期（任一缺失时不校验）
pub fn validate_date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> ApiResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(ApiError::InvalidInput(format!(
                "结束日期 {} 早于开始日期 {}",
                end, start
            )));
        }
    }
    Ok(())
}
