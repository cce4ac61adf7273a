// ==========================================
// 独立音乐人收入看板 - 收入记录仓储
// ==========================================
// 职责: 管理 revenue_entries 表（手工录入 / 更新 / 删除 / 查询）
// 说明: data_json 只在详情与历史视图中读取，列表查询不加载
// 红线: 删除记录时同一事务内回退资产累计收入
// ==========================================

use crate::db::{ensure_schema, now_timestamp};
use crate::domain::revenue::{ImportPayload, RevenueEntry, RevenueEntryFilter, RevenueEntryInput};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const ENTRY_COLUMNS: &str = "entry_id, source_id, amount, entry_date, description, year, quarter, \
     file_name, template_id, album_id, track_id, campaign_id, created_at, updated_at";

/// 行 → RevenueEntry
///
/// with_payload=true 时第 15 列为 data_json
pub(crate) fn map_entry_row(row: &Row<'_>, with_payload: bool) -> SqliteResult<RevenueEntry> {
    let payload = if with_payload {
        let raw: Option<String> = row.get(14)?;
        match raw {
            Some(json) => Some(
                ImportPayload::from_json(&json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(14, Type::Text, Box::new(e))
                })?,
            ),
            None => None,
        }
    } else {
        None
    };

    Ok(RevenueEntry {
        entry_id: row.get(0)?,
        source_id: row.get(1)?,
        amount: row.get(2)?,
        entry_date: row.get(3)?,
        description: row.get(4)?,
        year: row.get(5)?,
        quarter: row.get(6)?,
        file_name: row.get(7)?,
        template_id: row.get(8)?,
        album_id: row.get(9)?,
        track_id: row.get(10)?,
        campaign_id: row.get(11)?,
        payload,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

pub(crate) fn insert_entry(conn: &Connection, entry: &RevenueEntry) -> RepositoryResult<()> {
    let data_json = match &entry.payload {
        Some(p) => Some(p.to_json()?),
        None => None,
    };
    conn.execute(
        &format!(
            "INSERT INTO revenue_entries ({}, data_json) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            ENTRY_COLUMNS
        ),
        params![
            entry.entry_id,
            entry.source_id,
            entry.amount,
            entry.entry_date,
            entry.description,
            entry.year,
            entry.quarter,
            entry.file_name,
            entry.template_id,
            entry.album_id,
            entry.track_id,
            entry.campaign_id,
            entry.created_at,
            entry.updated_at,
            data_json,
        ],
    )?;
    Ok(())
}

pub(crate) fn find_entry(
    conn: &Connection,
    entry_id: &str,
    with_payload: bool,
) -> SqliteResult<Option<RevenueEntry>> {
    let sql = if with_payload {
        format!(
            "SELECT {}, data_json FROM revenue_entries WHERE entry_id = ?1",
            ENTRY_COLUMNS
        )
    } else {
        format!(
            "SELECT {} FROM revenue_entries WHERE entry_id = ?1",
            ENTRY_COLUMNS
        )
    };
    conn.query_row(&sql, params![entry_id], |row| map_entry_row(row, with_payload))
        .optional()
}

/// 回退某条记录贡献的资产累计收入（调用方负责事务）
pub(crate) fn revert_asset_totals_for_entry(
    conn: &Connection,
    entry_id: &str,
) -> RepositoryResult<usize> {
    let affected = conn.execute(
        r#"
        UPDATE assets
        SET total_revenue = total_revenue - (
            SELECT COALESCE(SUM(ar.amount), 0)
            FROM asset_revenues ar
            WHERE ar.asset_id = assets.asset_id AND ar.entry_id = ?1
        )
        WHERE asset_id IN (SELECT asset_id FROM asset_revenues WHERE entry_id = ?1)
        "#,
        params![entry_id],
    )?;
    Ok(affected)
}

pub struct RevenueEntryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RevenueEntryRepository {
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

    /// 手工录入（不带载荷）
    pub fn create(&self, input: &RevenueEntryInput) -> RepositoryResult<RevenueEntry> {
        let now = now_timestamp();
        let entry = RevenueEntry {
            entry_id: Uuid::new_v4().to_string(),
            source_id: input.source_id,
            amount: input.amount,
            entry_date: input.entry_date,
            description: input.description.clone(),
            year: input.year,
            quarter: input.quarter,
            file_name: input.file_name.clone(),
            template_id: input.template_id.clone(),
            album_id: input.album_id.clone(),
            track_id: input.track_id.clone(),
            campaign_id: input.campaign_id.clone(),
            payload: None,
            created_at: now.clone(),
            updated_at: now,
        };
        let conn = self.get_conn()?;
        insert_entry(&conn, &entry)?;
        Ok(entry)
    }

    /// 写入完整记录（含载荷）
    pub fn insert(&self, entry: &RevenueEntry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        insert_entry(&conn, entry)
    }

    pub fn find_by_id(&self, entry_id: &str) -> RepositoryResult<Option<RevenueEntry>> {
        let conn = self.get_conn()?;
        Ok(find_entry(&conn, entry_id, false)?)
    }

    /// 查询记录并加载导入载荷
    pub fn find_with_payload(&self, entry_id: &str) -> RepositoryResult<Option<RevenueEntry>> {
        let conn = self.get_conn()?;
        Ok(find_entry(&conn, entry_id, true)?)
    }

    /// 按过滤条件列出（日期倒序）
    pub fn list(&self, filter: &RevenueEntryFilter) -> RepositoryResult<Vec<RevenueEntry>> {
        let conn = self.get_conn()?;

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(source_id) = filter.source_id {
            clauses.push("source_id = ?");
            values.push(Box::new(source_id));
        }
        if let Some(year) = filter.year {
            clauses.push("year = ?");
            values.push(Box::new(year));
        }
        if let Some(template_id) = &filter.template_id {
            clauses.push("template_id = ?");
            values.push(Box::new(template_id.clone()));
        }

        let mut sql = format!("SELECT {} FROM revenue_entries", ENTRY_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY entry_date DESC, created_at DESC");

        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let rows = stmt
            .query_map(param_refs.as_slice(), |row| map_entry_row(row, false))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 模板关联的全部记录（含载荷，供历史视图聚合）
    pub fn list_with_payload_by_template(
        &self,
        template_id: &str,
    ) -> RepositoryResult<Vec<RevenueEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, data_json FROM revenue_entries WHERE template_id = ?1 ORDER BY created_at ASC",
            ENTRY_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![template_id], |row| map_entry_row(row, true))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 更新记录字段（载荷保持不变）
    pub fn update(&self, entry_id: &str, input: &RevenueEntryInput) -> RepositoryResult<RevenueEntry> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE revenue_entries SET
                source_id = ?1, amount = ?2, entry_date = ?3, description = ?4,
                year = ?5, quarter = ?6, file_name = ?7, template_id = ?8,
                album_id = ?9, track_id = ?10, campaign_id = ?11, updated_at = ?12
            WHERE entry_id = ?13
            "#,
            params![
                input.source_id,
                input.amount,
                input.entry_date,
                input.description,
                input.year,
                input.quarter,
                input.file_name,
                input.template_id,
                input.album_id,
                input.track_id,
                input.campaign_id,
                now_timestamp(),
                entry_id,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("RevenueEntry", entry_id));
        }
        find_entry(&conn, entry_id, false)?
            .ok_or_else(|| RepositoryError::not_found("RevenueEntry", entry_id))
    }

    /// 删除记录
    ///
    /// 事务内先扣减资产累计，再删除记录（asset_revenues 级联删除）
    pub fn delete(&self, entry_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let reverted = revert_asset_totals_for_entry(&tx, entry_id)?;
        let affected = tx.execute(
            "DELETE FROM revenue_entries WHERE entry_id = ?1",
            params![entry_id],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        if affected > 0 {
            tracing::debug!(entry_id, reverted_assets = reverted, "收入记录已删除");
        }
        Ok(affected > 0)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM revenue_entries", [], |r| r.get(0))?)
    }
}
