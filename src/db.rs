// ==========================================
// 代发货库存管理后端 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 统一建表（幂等），并记录 schema_version
// - 统一时间戳的落库格式
// ==========================================

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
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

/// 打开内存数据库（测试 / 一次性工具使用），已建表
pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;
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

/// 建表（幂等）
///
/// 表结构:
/// - vendor / marketplace / store / store_price_settings: 目录主数据
/// - upload / product: 导入作业与商品（product 唯一键 vendor_id + vendor_sku + store_id）
/// - export_artifact: 导出作业
/// - config_kv: 运行期配置
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS vendor (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            code TEXT NOT NULL UNIQUE,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS marketplace (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS store (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            marketplace_id INTEGER NOT NULL REFERENCES marketplace(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            scraping_enabled INTEGER NOT NULL DEFAULT 1,
            scraping_interval_hours INTEGER NOT NULL DEFAULT 24,
            price_update_enabled INTEGER NOT NULL DEFAULT 1,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS store_price_settings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            store_id INTEGER NOT NULL REFERENCES store(id) ON DELETE CASCADE,
            vendor_id INTEGER NOT NULL REFERENCES vendor(id) ON DELETE CASCADE,
            purchase_tax_percentage REAL NOT NULL DEFAULT 10.0
                CHECK (purchase_tax_percentage BETWEEN 0 AND 100),
            marketplace_fee_percentage REAL NOT NULL DEFAULT 10.0
                CHECK (marketplace_fee_percentage BETWEEN 0 AND 100),
            min_margin_percentage REAL NOT NULL DEFAULT 15.0
                CHECK (min_margin_percentage BETWEEN 0 AND 100),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (store_id, vendor_id)
        );

        CREATE TABLE IF NOT EXISTS upload (
            upload_id TEXT PRIMARY KEY,
            vendor_id INTEGER NOT NULL REFERENCES vendor(id) ON DELETE CASCADE,
            store_id INTEGER NOT NULL REFERENCES store(id) ON DELETE CASCADE,
            filename TEXT NOT NULL,
            file_path TEXT,
            status TEXT NOT NULL
                CHECK (status IN ('pending', 'processing', 'completed', 'failed')),
            total_rows INTEGER NOT NULL DEFAULT 0,
            processed_rows INTEGER NOT NULL DEFAULT 0,
            successful_rows INTEGER NOT NULL DEFAULT 0,
            failed_rows INTEGER NOT NULL DEFAULT 0,
            error_message TEXT NOT NULL DEFAULT '',
            error_details_json TEXT NOT NULL DEFAULT '[]',
            started_at TEXT,
            completed_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS product (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            vendor_id INTEGER NOT NULL REFERENCES vendor(id) ON DELETE CASCADE,
            vendor_sku TEXT NOT NULL CHECK (length(vendor_sku) BETWEEN 1 AND 255),
            marketplace_id INTEGER NOT NULL REFERENCES marketplace(id) ON DELETE CASCADE,
            store_id INTEGER NOT NULL REFERENCES store(id) ON DELETE CASCADE,
            upload_id TEXT REFERENCES upload(upload_id) ON DELETE SET NULL,
            marketplace_child_sku TEXT NOT NULL DEFAULT '',
            marketplace_parent_sku TEXT NOT NULL DEFAULT '',
            title TEXT NOT NULL DEFAULT '',
            source_url TEXT NOT NULL DEFAULT '',
            vendor_price REAL,
            calculated_price REAL,
            vendor_stock INTEGER,
            calculated_stock INTEGER,
            is_active INTEGER NOT NULL DEFAULT 1,
            last_scraped TEXT,
            scrape_error TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (vendor_id, vendor_sku, store_id)
        );

        CREATE TABLE IF NOT EXISTS export_artifact (
            export_id TEXT PRIMARY KEY,
            store_id INTEGER NOT NULL REFERENCES store(id) ON DELETE CASCADE,
            vendor_id INTEGER REFERENCES vendor(id) ON DELETE CASCADE,
            export_type TEXT NOT NULL CHECK (export_type IN ('price', 'inventory', 'full')),
            status TEXT NOT NULL
                CHECK (status IN ('pending', 'processing', 'completed', 'failed')),
            filename TEXT NOT NULL DEFAULT '',
            file_path TEXT NOT NULL DEFAULT '',
            file_size INTEGER NOT NULL DEFAULT 0,
            total_products INTEGER NOT NULL DEFAULT 0,
            exported_products INTEGER NOT NULL DEFAULT 0,
            skipped_products INTEGER NOT NULL DEFAULT 0,
            error_message TEXT NOT NULL DEFAULT '',
            started_at TEXT,
            completed_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_product_store_vendor ON product(store_id, vendor_id);
        CREATE INDEX IF NOT EXISTS idx_product_created_at ON product(created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_upload_created_at ON upload(created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_export_store ON export_artifact(store_id, created_at DESC);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        params![CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

// ==========================================
// 时间戳格式
// ==========================================
// 统一 RFC3339（毫秒 + Z），保证字符串排序与时间排序一致

/// DateTime → 落库字符串
pub fn to_db_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 落库字符串 → DateTime
pub fn parse_db_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

/// 行映射辅助：读取非空时间戳列
pub fn get_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_db_timestamp(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// 行映射辅助：读取可空时间戳列
pub fn get_opt_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        Some(s) => parse_db_timestamp(&s).map(Some).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
        }),
        None => Ok(None),
    }
}
