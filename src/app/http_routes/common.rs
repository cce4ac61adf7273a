use crate::api::error::{ApiError, ApiResult};
use actix_web::http::StatusCode;
use actix_web::{error, web, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

// ==========================================
// 公共工具：错误映射、阻塞调用、请求体配置
// ==========================================

/// 错误响应（返回给前端，即 toast 内容）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,

    /// 详细信息（可选）
    pub details: Option<serde_json::Value>,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        ErrorResponse {
            code: err.code().to_string(),
            message: err.to_string(),
            details: match err {
                ApiError::PayloadTooLarge { size, limit } => Some(serde_json::json!({
                    "size": size,
                    "limit": limit,
                })),
                _ => None,
            },
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BusinessRuleViolation(_) => StatusCode::CONFLICT,
            ApiError::UnsupportedFile(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ImportError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::DatabaseConnectionError(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::DatabaseError(_)
            | ApiError::DatabaseTransactionError(_)
            | ApiError::InternalError(_)
            | ApiError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "请求处理失败");
        } else {
            tracing::warn!(code = self.code(), error = %self, "请求被拒绝");
        }
        HttpResponse::build(status).json(ErrorResponse::from(self))
    }
}

/// 在阻塞线程池中执行同步 API 调用
pub async fn run_blocking<F, T>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|e| ApiError::InternalError(format!("后台任务执行失败: {}", e)))?
}

/// JSON 请求体解析失败时返回统一错误格式
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = format!("请求体格式错误: {}", err);
        error::InternalError::from_response(
            err,
            ApiError::InvalidInput(message).error_response(),
        )
        .into()
    })
}

/// 查询参数解析失败时返回统一错误格式
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let message = format!("查询参数格式错误: {}", err);
        error::InternalError::from_response(
            err,
            ApiError::InvalidInput(message).error_response(),
        )
        .into()
    })
}

/// 路径参数解析失败时返回统一错误格式
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        let message = format!("路径参数格式错误: {}", err);
        error::InternalError::from_response(
            err,
            ApiError::InvalidInput(message).error_response(),
        )
        .into()
    })
}
