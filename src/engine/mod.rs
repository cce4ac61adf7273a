// ==========================================
// 独立音乐人收入看板 - 引擎层
// ==========================================
// 职责: 纯计算规则（不拼 SQL）
// ==========================================

pub mod aggregator;

// 重导出核心引擎
pub use aggregator::{format_number, Aggregator, DisplayTable, HistoryMode};
