// ==========================================
// 独立音乐人收入看板 - 收入导入 Repository
// ==========================================
// 职责: 定义导入落库接口 + rusqlite 实现
// 红线: Repository 不含业务规则，只做数据读写
// 事务: 模板新建 / 收入记录 / 资产收入 / 资产累计 同一事务提交
// ==========================================

use crate::db::{ensure_schema, now_timestamp};
use crate::domain::asset::AssetContribution;
use crate::domain::revenue::{ImportPayload, RevenueEntry};
use crate::domain::template::{headers_fingerprint, ImportTemplate};
use crate::repository::asset_repo::find_asset_by_name;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::revenue_entry_repo::{find_entry, insert_entry};
use crate::repository::template_repo::{
    find_template_by_fingerprint, find_template_by_id, insert_template,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// RevenueImportRepository Trait
// ==========================================
// 用途: 导入管道所需的全部数据访问
// 实现者: RevenueImportRepositoryImpl（使用 rusqlite）
pub trait RevenueImportRepository: Send + Sync {
    /// 按表头列表精确查找模板
    fn find_template_by_headers(&self, headers: &[String]) -> RepositoryResult<Option<ImportTemplate>>;

    /// 按 ID 查找模板
    fn find_template(&self, template_id: &str) -> RepositoryResult<Option<ImportTemplate>>;

    /// 收入来源是否存在
    fn source_exists(&self, source_id: i64) -> RepositoryResult<bool>;

    /// 查询收入记录（含载荷，Annex 使用）
    fn find_entry_with_payload(&self, entry_id: &str) -> RepositoryResult<Option<RevenueEntry>>;

    /// 保存一次导入
    ///
    /// # 参数
    /// - new_template: 本次导入时新建的模板（可选）
    /// - entry: 收入记录（含载荷）
    /// - assets: 资产贡献（已按名称合并）
    /// - category: 资产分类（来自模板）
    ///
    /// # 返回
    /// - Ok(usize): 关联的资产数
    /// - Err: 数据库错误（整个事务回滚）
    fn save_import(
        &self,
        new_template: Option<&ImportTemplate>,
        entry: &RevenueEntry,
        assets: &[AssetContribution],
        category: Option<&str>,
    ) -> RepositoryResult<usize>;

    /// 保存 Annex（覆盖载荷 + 金额累加 + 新行资产）
    ///
    /// # 返回
    /// - Ok((RevenueEntry, usize)): 更新后的记录（不含载荷）与关联的资产数
    fn save_annex(
        &self,
        entry_id: &str,
        payload: &ImportPayload,
        added_amount: f64,
        assets: &[AssetContribution],
        category: Option<&str>,
    ) -> RepositoryResult<(RevenueEntry, usize)>;
}

/// 写入资产收入并累加资产累计（调用方负责事务）
///
/// 资产按去空白后的名称复用，不存在时新建（累计从 0 开始）
fn link_assets(
    conn: &Connection,
    entry_id: &str,
    assets: &[AssetContribution],
    category: Option<&str>,
) -> RepositoryResult<usize> {
    let now = now_timestamp();
    let mut linked = 0;

    for contribution in assets {
        let name = contribution.name.trim();
        if name.is_empty() {
            continue;
        }

        let asset_id = match find_asset_by_name(conn, name)? {
            Some(existing) => existing.asset_id,
            None => {
                let asset_id = Uuid::new_v4().to_string();
                conn.execute(
                    r#"
                    INSERT INTO assets (asset_id, name, category, total_revenue, created_at)
                    VALUES (?1, ?2, ?3, 0, ?4)
                    "#,
                    params![asset_id, name, category, now],
                )?;
                asset_id
            }
        };

        conn.execute(
            r#"
            INSERT INTO asset_revenues (asset_revenue_id, asset_id, entry_id, amount, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                Uuid::new_v4().to_string(),
                asset_id,
                entry_id,
                contribution.amount,
                now
            ],
        )?;
        conn.execute(
            "UPDATE assets SET total_revenue = total_revenue + ?1 WHERE asset_id = ?2",
            params![contribution.amount, asset_id],
        )?;
        linked += 1;
    }

    Ok(linked)
}

// ==========================================
// RevenueImportRepositoryImpl
// ==========================================
pub struct RevenueImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl RevenueImportRepositoryImpl {
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
}

impl RevenueImportRepository for RevenueImportRepositoryImpl {
    fn find_template_by_headers(&self, headers: &[String]) -> RepositoryResult<Option<ImportTemplate>> {
        let conn = self.get_conn()?;
        Ok(find_template_by_fingerprint(&conn, &headers_fingerprint(headers))?)
    }

    fn find_template(&self, template_id: &str) -> RepositoryResult<Option<ImportTemplate>> {
        let conn = self.get_conn()?;
        Ok(find_template_by_id(&conn, template_id)?)
    }

    fn source_exists(&self, source_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT 1 FROM revenue_sources WHERE source_id = ?1",
                params![source_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some())
    }

    fn find_entry_with_payload(&self, entry_id: &str) -> RepositoryResult<Option<RevenueEntry>> {
        let conn = self.get_conn()?;
        Ok(find_entry(&conn, entry_id, true)?)
    }

    fn save_import(
        &self,
        new_template: Option<&ImportTemplate>,
        entry: &RevenueEntry,
        assets: &[AssetContribution],
        category: Option<&str>,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        if let Some(template) = new_template {
            insert_template(&tx, template)?;
        }
        insert_entry(&tx, entry)?;
        let linked = link_assets(&tx, &entry.entry_id, assets, category)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(linked)
    }

    fn save_annex(
        &self,
        entry_id: &str,
        payload: &ImportPayload,
        added_amount: f64,
        assets: &[AssetContribution],
        category: Option<&str>,
    ) -> RepositoryResult<(RevenueEntry, usize)> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let affected = tx.execute(
            r#"
            UPDATE revenue_entries
            SET data_json = ?1, amount = amount + ?2, updated_at = ?3
            WHERE entry_id = ?4
            "#,
            params![payload.to_json()?, added_amount, now_timestamp(), entry_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("RevenueEntry", entry_id));
        }

        let linked = link_assets(&tx, entry_id, assets, category)?;
        let updated = find_entry(&tx, entry_id, false)?
            .ok_or_else(|| RepositoryError::not_found("RevenueEntry", entry_id))?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok((updated, linked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::revenue::ImportSheet;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn setup() -> (Arc<Mutex<Connection>>, RevenueImportRepositoryImpl) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let repo = RevenueImportRepositoryImpl::from_connection(conn.clone()).unwrap();
        (conn, repo)
    }

    fn entry(template_id: Option<String>, amount: f64) -> RevenueEntry {
        let now = now_timestamp();
        RevenueEntry {
            entry_id: Uuid::new_v4().to_string(),
            source_id: 4,
            amount,
            entry_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            description: String::new(),
            year: None,
            quarter: None,
            file_name: Some("q1.csv".to_string()),
            template_id,
            album_id: None,
            track_id: None,
            campaign_id: None,
            payload: Some(ImportPayload::default()),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    fn contribution(name: &str, amount: f64) -> AssetContribution {
        AssetContribution {
            name: name.to_string(),
            amount,
        }
    }

    fn total_of(conn: &Arc<Mutex<Connection>>, name: &str) -> f64 {
        conn.lock()
            .unwrap()
            .query_row(
                "SELECT total_revenue FROM assets WHERE name = ?1",
                params![name],
                |r| r.get(0),
            )
            .unwrap()
    }

    #[test]
    fn test_save_import_with_new_template_and_assets() {
        let (conn, repo) = setup();
        let now = now_timestamp();
        let template = ImportTemplate {
            template_id: "t1".to_string(),
            name: "Distro".to_string(),
            category: Some("Streaming".to_string()),
            headers: vec!["Track".to_string(), "Net".to_string()],
            mappings: BTreeMap::new(),
            created_at: now.clone(),
            updated_at: now,
        };
        let e = entry(Some("t1".to_string()), 12.0);

        let linked = repo
            .save_import(
                Some(&template),
                &e,
                &[contribution("Song A", 5.0), contribution(" Song B ", 7.0)],
                template.category.as_deref(),
            )
            .unwrap();
        assert_eq!(linked, 2);
        assert_eq!(total_of(&conn, "Song B"), 7.0);

        let found = repo
            .find_template_by_headers(&["Track".to_string(), "Net".to_string()])
            .unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn test_save_annex_accumulates() {
        let (conn, repo) = setup();
        let e = entry(None, 10.0);
        repo.save_import(None, &e, &[contribution("Song A", 10.0)], None)
            .unwrap();

        let payload = ImportPayload {
            sheets: vec![ImportSheet {
                title: "q2".to_string(),
                filename: "q2.csv".to_string(),
                template_name: "Distro".to_string(),
                headers: vec![],
                rows: vec![],
                decimal_comma: false,
            }],
        };
        let (updated, linked) = repo
            .save_annex(&e.entry_id, &payload, 2.5, &[contribution("Song A", 2.5)], None)
            .unwrap();
        assert_eq!(updated.amount, 12.5);
        assert_eq!(linked, 1);
        assert_eq!(total_of(&conn, "Song A"), 12.5);

        let reloaded = repo.find_entry_with_payload(&e.entry_id).unwrap().unwrap();
        assert_eq!(reloaded.payload.unwrap().sheets.len(), 1);
    }

    #[test]
    fn test_failed_import_rolls_back() {
        let (conn, repo) = setup();
        let mut e = entry(None, 1.0);
        e.source_id = 42;

        let result = repo.save_import(None, &e, &[contribution("Song A", 1.0)], None);
        assert!(result.is_err());

        let assets: i64 = conn
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM assets", [], |r| r.get(0))
            .unwrap();
        assert_eq!(assets, 0);
    }
}
