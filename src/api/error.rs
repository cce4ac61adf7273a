// ==========================================
// 独立音乐人收入看板 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository / Import 错误为用户友好的错误消息
// 说明: 错误消息即前端 toast 文案，必须包含显式原因
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("文件格式不支持: {0}")]
    UnsupportedFile(String),

    #[error("文件过大: {size} 字节，上限 {limit} 字节")]
    PayloadTooLarge { size: u64, limit: u64 },

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        ApiError::NotFound(format!("{}(id={})不存在", entity, id))
    }

    /// 前端错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BusinessRuleViolation(_) => "BUSINESS_RULE_VIOLATION",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::DatabaseConnectionError(_) => "DATABASE_CONNECTION_ERROR",
            ApiError::DatabaseTransactionError(_) => "DATABASE_TRANSACTION_ERROR",
            ApiError::ImportError(_) => "IMPORT_ERROR",
            ApiError::UnsupportedFile(_) => "UNSUPPORTED_FILE",
            ApiError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Other(_) => "OTHER_ERROR",
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 数据质量错误
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }

            // 通用错误
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::UnsupportedFormat(name) => ApiError::UnsupportedFile(name),
            ImportError::FileTooLarge { size, limit } => ApiError::PayloadTooLarge { size, limit },
            ImportError::TemplateNotFound(id) => {
                ApiError::NotFound(format!("ImportTemplate(id={})不存在", id))
            }
            ImportError::EntryNotFound(id) => {
                ApiError::NotFound(format!("RevenueEntry(id={})不存在", id))
            }
            ImportError::InvalidMapping { .. } | ImportError::InvalidRequest(_) => {
                ApiError::InvalidInput(err.to_string())
            }
            ImportError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            ImportError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            ImportError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
            ImportError::Other(e) => ApiError::Other(e),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "Asset".to_string(),
            id: "A001".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Asset"));
                assert!(msg.contains("A001"));
            }
            _ => panic!("Expected NotFound"),
        }

        let api_err: ApiError =
            RepositoryError::UniqueConstraintViolation("assets.name".to_string()).into();
        assert_eq!(api_err.code(), "BUSINESS_RULE_VIOLATION");

        let api_err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert_eq!(api_err.code(), "DATABASE_CONNECTION_ERROR");

        let api_err: ApiError = RepositoryError::FieldValueError {
            field: "json".to_string(),
            message: "EOF".to_string(),
        }
        .into();
        assert_eq!(api_err.code(), "INVALID_INPUT");
    }

    #[test]
    fn test_import_error_conversion() {
        let api_err: ApiError = ImportError::FileTooLarge {
            size: 20,
            limit: 10,
        }
        .into();
        assert!(matches!(api_err, ApiError::PayloadTooLarge { size: 20, limit: 10 }));

        let api_err: ApiError = ImportError::CsvParseError("bad quote".to_string()).into();
        assert_eq!(api_err.code(), "IMPORT_ERROR");
        assert!(api_err.to_string().contains("bad quote"));

        let api_err: ApiError = ImportError::InvalidRequest("季度".to_string()).into();
        assert_eq!(api_err.code(), "INVALID_INPUT");
    }
}
