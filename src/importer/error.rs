// ==========================================
// 独立音乐人收入看板 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件过大: {size} 字节，上限 {limit} 字节")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("文件中没有可用的工作表")]
    NoSheets,

    // ===== 模板相关错误 =====
    #[error("模板不存在: {0}")]
    TemplateNotFound(String),

    #[error("模板映射无效 (表头 {header}): {message}")]
    InvalidMapping { header: String, message: String },

    // ===== 请求参数错误 =====
    #[error("导入参数无效: {0}")]
    InvalidRequest(String),

    // ===== 收入记录相关错误 =====
    #[error("收入记录不存在: {0}")]
    EntryNotFound(String),

    // ===== 数据库错误 =====
    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("FOREIGN KEY") => {
                ImportError::ForeignKeyViolation(msg)
            }
            _ => ImportError::DatabaseQueryError(err.to_string()),
        }
    }
}

// 实现 From<RepositoryError>（导入落库经由仓储层）
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::LockError(msg) => ImportError::LockError(msg),
            RepositoryError::ForeignKeyViolation(msg) => ImportError::ForeignKeyViolation(msg),
            RepositoryError::NotFound { entity, id } if entity == "RevenueEntry" => {
                ImportError::EntryNotFound(id)
            }
            RepositoryError::NotFound { entity, id } if entity == "ImportTemplate" => {
                ImportError::TemplateNotFound(id)
            }
            RepositoryError::Other(e) => ImportError::Other(e),
            other => ImportError::DatabaseQueryError(other.to_string()),
        }
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::InternalError(format!("JSON 序列化失败: {}", err))
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
