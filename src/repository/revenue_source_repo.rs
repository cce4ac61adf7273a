// ==========================================
// 独立音乐人收入看板 - 收入来源仓储
// ==========================================
// 职责: 读取 revenue_sources 字典表（建库时写入，只读）
// ==========================================

use crate::db::ensure_schema;
use crate::domain::revenue::RevenueSource;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct RevenueSourceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RevenueSourceRepository {
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

    pub fn list_all(&self) -> RepositoryResult<Vec<RevenueSource>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT source_id, name FROM revenue_sources ORDER BY source_id ASC")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(RevenueSource {
                    source_id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn find_by_id(&self, source_id: i64) -> RepositoryResult<Option<RevenueSource>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT source_id, name FROM revenue_sources WHERE source_id = ?1",
                params![source_id],
                |row| {
                    Ok(RevenueSource {
                        source_id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?)
    }
}
