// ==========================================
// 独立音乐人收入看板 - SQLite 连接初始化与建库
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键 + busy_timeout）
// - 幂等建表（CREATE TABLE IF NOT EXISTS），启动时执行
// ==========================================

use crate::domain::types::RevenueSourceKind;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启（模板删除依赖 ON DELETE SET NULL）
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 建表 + 写入收入来源字典（幂等）
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS artists (
            artist_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS albums (
            album_id TEXT PRIMARY KEY,
            artist_id TEXT NOT NULL REFERENCES artists(artist_id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            release_date TEXT,
            upc TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tracks (
            track_id TEXT PRIMARY KEY,
            artist_id TEXT NOT NULL REFERENCES artists(artist_id) ON DELETE CASCADE,
            album_id TEXT REFERENCES albums(album_id) ON DELETE SET NULL,
            title TEXT NOT NULL,
            isrc TEXT,
            duration_secs INTEGER,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS campaigns (
            campaign_id TEXT PRIMARY KEY,
            artist_id TEXT NOT NULL REFERENCES artists(artist_id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            start_date TEXT,
            end_date TEXT,
            budget REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS revenue_sources (
            source_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS import_templates (
            template_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT,
            headers_json TEXT NOT NULL,
            mappings_json TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_import_templates_headers
          ON import_templates(headers_json);

        CREATE TABLE IF NOT EXISTS revenue_entries (
            entry_id TEXT PRIMARY KEY,
            source_id INTEGER NOT NULL REFERENCES revenue_sources(source_id),
            amount REAL NOT NULL DEFAULT 0,
            entry_date TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            year INTEGER,
            quarter INTEGER,
            file_name TEXT,
            template_id TEXT REFERENCES import_templates(template_id) ON DELETE SET NULL,
            album_id TEXT REFERENCES albums(album_id) ON DELETE SET NULL,
            track_id TEXT REFERENCES tracks(track_id) ON DELETE SET NULL,
            campaign_id TEXT REFERENCES campaigns(campaign_id) ON DELETE SET NULL,
            data_json TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_revenue_entries_template
          ON revenue_entries(template_id);
        CREATE INDEX IF NOT EXISTS idx_revenue_entries_date
          ON revenue_entries(entry_date DESC);

        CREATE TABLE IF NOT EXISTS assets (
            asset_id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            category TEXT,
            total_revenue REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS asset_revenues (
            asset_revenue_id TEXT PRIMARY KEY,
            asset_id TEXT NOT NULL REFERENCES assets(asset_id) ON DELETE CASCADE,
            entry_id TEXT NOT NULL REFERENCES revenue_entries(entry_id) ON DELETE CASCADE,
            amount REAL NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_asset_revenues_asset
          ON asset_revenues(asset_id);
        CREATE INDEX IF NOT EXISTS idx_asset_revenues_entry
          ON asset_revenues(entry_id);
        "#,
    )?;

    for kind in RevenueSourceKind::ALL {
        conn.execute(
            "INSERT OR IGNORE INTO revenue_sources (source_id, name) VALUES (?1, ?2)",
            params![kind.id(), kind.display_name()],
        )?;
    }

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        params![CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 打开连接并确保 schema 就绪（启动入口使用）
pub fn open_and_migrate(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    ensure_schema(&conn)?;

    match read_schema_version(&conn)? {
        Some(v) if v > CURRENT_SCHEMA_VERSION => {
            tracing::warn!(
                db_version = v,
                expected = CURRENT_SCHEMA_VERSION,
                "数据库 schema 版本高于当前程序，可能由新版本创建"
            );
        }
        _ => {}
    }

    Ok(conn)
}

/// 当前时间戳（本地时区，秒精度）
pub fn now_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        let sources: i64 = conn
            .query_row("SELECT COUNT(*) FROM revenue_sources", [], |r| r.get(0))
            .unwrap();
        assert_eq!(sources, 5);
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_schema_version_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }
}
