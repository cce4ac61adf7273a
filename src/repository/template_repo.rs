// ==========================================
// 独立音乐人收入看板 - 导入模板仓储
// ==========================================
// 职责: 管理 import_templates 表
// 说明: headers_json 同时作为匹配指纹（逐字相等）
// ==========================================

use crate::db::{ensure_schema, now_timestamp};
use crate::domain::template::{headers_fingerprint, ImportTemplate};
use crate::domain::types::ColumnRole;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

const TEMPLATE_COLUMNS: &str =
    "template_id, name, category, headers_json, mappings_json, created_at, updated_at";

/// 行 → ImportTemplate（JSON 列解析失败视为类型转换错误）
pub(crate) fn map_template_row(row: &Row<'_>) -> SqliteResult<ImportTemplate> {
    let headers_json: String = row.get(3)?;
    let mappings_json: String = row.get(4)?;

    let headers: Vec<String> = serde_json::from_str(&headers_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    let mappings: BTreeMap<String, ColumnRole> = serde_json::from_str(&mappings_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(ImportTemplate {
        template_id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        headers,
        mappings,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// 按指纹查找模板（多个同指纹模板时取最早创建者）
pub(crate) fn find_template_by_fingerprint(
    conn: &Connection,
    fingerprint: &str,
) -> SqliteResult<Option<ImportTemplate>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM import_templates WHERE headers_json = ?1 ORDER BY created_at ASC, template_id ASC LIMIT 1",
            TEMPLATE_COLUMNS
        ),
        params![fingerprint],
        map_template_row,
    )
    .optional()
}

pub(crate) fn find_template_by_id(
    conn: &Connection,
    template_id: &str,
) -> SqliteResult<Option<ImportTemplate>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM import_templates WHERE template_id = ?1",
            TEMPLATE_COLUMNS
        ),
        params![template_id],
        map_template_row,
    )
    .optional()
}

pub(crate) fn insert_template(conn: &Connection, template: &ImportTemplate) -> RepositoryResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO import_templates ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            TEMPLATE_COLUMNS
        ),
        params![
            template.template_id,
            template.name,
            template.category,
            headers_fingerprint(&template.headers),
            serde_json::to_string(&template.mappings)?,
            template.created_at,
            template.updated_at,
        ],
    )?;
    Ok(())
}

pub struct ImportTemplateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ImportTemplateRepository {
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

    /// 新增模板
    pub fn insert(&self, template: &ImportTemplate) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        insert_template(&conn, template)
    }

    /// 按 ID 查找
    pub fn find_by_id(&self, template_id: &str) -> RepositoryResult<Option<ImportTemplate>> {
        let conn = self.get_conn()?;
        Ok(find_template_by_id(&conn, template_id)?)
    }

    /// 按表头列表查找（精确匹配）
    pub fn find_by_headers(&self, headers: &[String]) -> RepositoryResult<Option<ImportTemplate>> {
        let conn = self.get_conn()?;
        Ok(find_template_by_fingerprint(&conn, &headers_fingerprint(headers))?)
    }

    /// 列出全部模板（按名称排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<ImportTemplate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM import_templates ORDER BY name ASC, created_at ASC",
            TEMPLATE_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], map_template_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 更新名称 / 分类
    pub fn update_meta(
        &self,
        template_id: &str,
        name: &str,
        category: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE import_templates SET name = ?1, category = ?2, updated_at = ?3 WHERE template_id = ?4",
            params![name, category, now_timestamp(), template_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("ImportTemplate", template_id));
        }
        Ok(())
    }

    /// 覆盖表头 → 角色映射（映射编辑器）
    pub fn update_mappings(
        &self,
        template_id: &str,
        mappings: &BTreeMap<String, ColumnRole>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE import_templates SET mappings_json = ?1, updated_at = ?2 WHERE template_id = ?3",
            params![serde_json::to_string(mappings)?, now_timestamp(), template_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("ImportTemplate", template_id));
        }
        Ok(())
    }

    /// 删除模板
    ///
    /// 关联收入记录的 template_id 由外键 ON DELETE SET NULL 置空，记录本身保留
    pub fn delete(&self, template_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM import_templates WHERE template_id = ?1",
            params![template_id],
        )?;
        Ok(affected > 0)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM import_templates", [], |r| r.get(0))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn setup_repo() -> ImportTemplateRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        ImportTemplateRepository::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    fn template(name: &str, headers: &[&str]) -> ImportTemplate {
        let now = now_timestamp();
        ImportTemplate {
            template_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            category: None,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            mappings: BTreeMap::from([("Net".to_string(), ColumnRole::Net)]),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    #[test]
    fn test_insert_and_find_by_headers() {
        let repo = setup_repo();
        let t = template("Distro", &["Date", "Track", "Net"]);
        repo.insert(&t).unwrap();

        let headers: Vec<String> = vec!["Date".into(), "Track".into(), "Net".into()];
        let found = repo.find_by_headers(&headers).unwrap().unwrap();
        assert_eq!(found.template_id, t.template_id);
        assert_eq!(found.mappings.get("Net"), Some(&ColumnRole::Net));

        let renamed: Vec<String> = vec!["Date".into(), "Song".into(), "Net".into()];
        assert!(repo.find_by_headers(&renamed).unwrap().is_none());
    }

    #[test]
    fn test_update_mappings_and_missing_template() {
        let repo = setup_repo();
        let t = template("Distro", &["Date", "Net"]);
        repo.insert(&t).unwrap();

        let mappings = BTreeMap::from([
            ("Date".to_string(), ColumnRole::Date),
            ("Net".to_string(), ColumnRole::Amount),
        ]);
        repo.update_mappings(&t.template_id, &mappings).unwrap();
        let loaded = repo.find_by_id(&t.template_id).unwrap().unwrap();
        assert_eq!(loaded.mappings, mappings);

        let err = repo.update_mappings("missing", &mappings).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_delete_reports_existence() {
        let repo = setup_repo();
        let t = template("Distro", &["A"]);
        repo.insert(&t).unwrap();
        assert_eq!(repo.count().unwrap(), 1);
        assert!(repo.delete(&t.template_id).unwrap());
        assert!(!repo.delete(&t.template_id).unwrap());
        assert_eq!(repo.count().unwrap(), 0);
    }
}
