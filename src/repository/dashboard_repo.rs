// ==========================================
// 独立音乐人收入看板 - 看板指标仓储
// ==========================================
// 职责: 看板聚合查询（只读）
// ==========================================

use crate::db::ensure_schema;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{Connection, Result as SqliteResult};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 按收入来源汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRevenue {
    pub source_id: i64,
    pub name: String,
    pub total: f64,
    pub entry_count: i64,
}

/// 按 (年, 季度) 汇总（无时间段的记录归入 None）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRevenue {
    pub year: Option<i32>,
    pub quarter: Option<u8>,
    pub total: f64,
}

/// 计数快照
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardCounts {
    pub total_revenue: f64,
    pub entry_count: i64,
    pub template_count: i64,
    pub asset_count: i64,
}

pub struct DashboardRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DashboardRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        ensure_schema(&*repo.get_conn()?)?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn counts(&self) -> RepositoryResult<DashboardCounts> {
        let conn = self.get_conn()?;
        Ok(conn.query_row(
            r#"
            SELECT
                (SELECT COALESCE(SUM(amount), 0) FROM revenue_entries),
                (SELECT COUNT(*) FROM revenue_entries),
                (SELECT COUNT(*) FROM import_templates),
                (SELECT COUNT(*) FROM assets)
            "#,
            [],
            |row| {
                Ok(DashboardCounts {
                    total_revenue: row.get(0)?,
                    entry_count: row.get(1)?,
                    template_count: row.get(2)?,
                    asset_count: row.get(3)?,
                })
            },
        )?)
    }

    /// 各收入来源合计（包含无记录的来源）
    pub fn revenue_by_source(&self) -> RepositoryResult<Vec<SourceRevenue>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.source_id, s.name, COALESCE(SUM(e.amount), 0), COUNT(e.entry_id)
            FROM revenue_sources s
            LEFT JOIN revenue_entries e ON e.source_id = s.source_id
            GROUP BY s.source_id, s.name
            ORDER BY s.source_id ASC
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SourceRevenue {
                    source_id: row.get(0)?,
                    name: row.get(1)?,
                    total: row.get(2)?,
                    entry_count: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 按 (年, 季度) 合计，时间顺序
    pub fn revenue_by_period(&self) -> RepositoryResult<Vec<PeriodRevenue>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT year, quarter, COALESCE(SUM(amount), 0)
            FROM revenue_entries
            GROUP BY year, quarter
            ORDER BY COALESCE(year, 0) ASC, COALESCE(quarter, 0) ASC
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PeriodRevenue {
                    year: row.get(0)?,
                    quarter: row.get(1)?,
                    total: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_queries() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let repo = DashboardRepository::from_connection(conn.clone()).unwrap();
        conn.lock()
            .unwrap()
            .execute_batch(
                r#"
                INSERT INTO revenue_entries (entry_id, source_id, amount, entry_date, year, quarter, created_at, updated_at)
                VALUES ('e1', 4, 10, '2024-01-10', 2024, 1, 'x', 'x'),
                       ('e2', 4, 5, '2024-04-10', 2024, 2, 'x', 'x'),
                       ('e3', 1, 20, '2024-05-10', NULL, NULL, 'x', 'x');
                "#,
            )
            .unwrap();

        let counts = repo.counts().unwrap();
        assert_eq!(counts.total_revenue, 35.0);
        assert_eq!(counts.entry_count, 3);

        let by_source = repo.revenue_by_source().unwrap();
        assert_eq!(by_source.len(), 5);
        assert_eq!(by_source[3].total, 15.0);
        assert_eq!(by_source[3].entry_count, 2);
        assert_eq!(by_source[1].entry_count, 0);

        let by_period = repo.revenue_by_period().unwrap();
        assert_eq!(by_period.len(), 3);
        assert_eq!(by_period[0].year, None);
        assert_eq!(by_period[2].quarter, Some(2));
    }
}
