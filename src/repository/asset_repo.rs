// ==========================================
// 独立音乐人收入看板 - 资产仓储
// ==========================================
// 职责: 管理 assets / asset_revenues 表
// 约束: assets.total_revenue = SUM(asset_revenues.amount)
// ==========================================

use crate::db::ensure_schema;
use crate::domain::asset::{Asset, AssetRevenue};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const ASSET_COLUMNS: &str = "asset_id, name, category, total_revenue, created_at";

fn map_asset_row(row: &Row<'_>) -> SqliteResult<Asset> {
    Ok(Asset {
        asset_id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        total_revenue: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub(crate) fn find_asset_by_name(conn: &Connection, name: &str) -> SqliteResult<Option<Asset>> {
    conn.query_row(
        &format!("SELECT {} FROM assets WHERE name = ?1", ASSET_COLUMNS),
        params![name],
        map_asset_row,
    )
    .optional()
}

pub struct AssetRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AssetRepository {
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

    /// 列出全部资产（累计收入倒序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Asset>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM assets ORDER BY total_revenue DESC, name ASC",
            ASSET_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], map_asset_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 收入最高的 N 个资产
    pub fn top(&self, limit: usize) -> RepositoryResult<Vec<Asset>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM assets ORDER BY total_revenue DESC, name ASC LIMIT ?1",
            ASSET_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![limit as i64], map_asset_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn find_by_id(&self, asset_id: &str) -> RepositoryResult<Option<Asset>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM assets WHERE asset_id = ?1", ASSET_COLUMNS),
                params![asset_id],
                map_asset_row,
            )
            .optional()?)
    }

    /// 资产的收入明细（按记录创建时间）
    pub fn list_revenues(&self, asset_id: &str) -> RepositoryResult<Vec<AssetRevenue>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT asset_revenue_id, asset_id, entry_id, amount, created_at
            FROM asset_revenues
            WHERE asset_id = ?1
            ORDER BY created_at ASC, asset_revenue_id ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![asset_id], |row| {
                Ok(AssetRevenue {
                    asset_revenue_id: row.get(0)?,
                    asset_id: row.get(1)?,
                    entry_id: row.get(2)?,
                    amount: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 重命名资产（名称唯一，冲突时返回 UniqueConstraintViolation）
    pub fn rename(&self, asset_id: &str, name: &str) -> RepositoryResult<Asset> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE assets SET name = ?1 WHERE asset_id = ?2",
            params![name.trim(), asset_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Asset", asset_id));
        }
        conn.query_row(
            &format!("SELECT {} FROM assets WHERE asset_id = ?1", ASSET_COLUMNS),
            params![asset_id],
            map_asset_row,
        )
        .map_err(RepositoryError::from)
    }

    /// 删除资产（asset_revenues 级联删除）
    pub fn delete(&self, asset_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM assets WHERE asset_id = ?1", params![asset_id])?;
        Ok(affected > 0)
    }

    /// 按 asset_revenues 重新计算全部累计收入
    ///
    /// 返回累计值发生变化的资产数
    pub fn recompute_totals(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            r#"
            UPDATE assets
            SET total_revenue = (
                SELECT COALESCE(SUM(ar.amount), 0)
                FROM asset_revenues ar
                WHERE ar.asset_id = assets.asset_id
            )
            WHERE ABS(total_revenue - (
                SELECT COALESCE(SUM(ar.amount), 0)
                FROM asset_revenues ar
                WHERE ar.asset_id = assets.asset_id
            )) > 1e-9
            "#,
            [],
        )?;
        Ok(changed)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM assets", [], |r| r.get(0))?)
    }
}
