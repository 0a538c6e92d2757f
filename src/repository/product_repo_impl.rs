// ==========================================
// 代发货库存管理后端 - 商品 Repository 实现
// ==========================================
// 职责: 实现商品数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 约束: 每次 upsert 为独立语句（不包批次事务）
// ==========================================

use crate::db::{get_opt_timestamp, get_timestamp, to_db_timestamp};
use crate::domain::product::{
    PricingUpdate, Product, ProductFilter, ProductKey, ProductUpsert, UpsertOutcome,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::product_repo::ProductRepository;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const PRODUCT_COLUMNS: &str = r#"
    id, vendor_id, vendor_sku, marketplace_id, store_id, upload_id,
    marketplace_child_sku, marketplace_parent_sku, title, source_url,
    vendor_price, calculated_price, vendor_stock, calculated_stock,
    is_active, last_scraped, scrape_error, created_at, updated_at
"#;

fn map_product_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        vendor_id: row.get(1)?,
        vendor_sku: row.get(2)?,
        marketplace_id: row.get(3)?,
        store_id: row.get(4)?,
        upload_id: row.get(5)?,
        marketplace_child_sku: row.get(6)?,
        marketplace_parent_sku: row.get(7)?,
        title: row.get(8)?,
        source_url: row.get(9)?,
        vendor_price: row.get(10)?,
        calculated_price: row.get(11)?,
        vendor_stock: row.get(12)?,
        calculated_stock: row.get(13)?,
        is_active: row.get::<_, i64>(14)? != 0,
        last_scraped: get_opt_timestamp(row, 15)?,
        scrape_error: row.get(16)?,
        created_at: get_timestamp(row, 17)?,
        updated_at: get_timestamp(row, 18)?,
    })
}

/// 过滤条件 → WHERE 子句 + 参数
fn build_where(filter: &ProductFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut args: Vec<Value> = Vec::new();

    if let Some(store_id) = filter.store_id {
        args.push(Value::Integer(store_id));
        clauses.push(format!("store_id = ?{}", args.len()));
    }
    if let Some(vendor_id) = filter.vendor_id {
        args.push(Value::Integer(vendor_id));
        clauses.push(format!("vendor_id = ?{}", args.len()));
    }
    if filter.active_only {
        clauses.push("is_active = 1".to_string());
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        args.push(Value::Text(format!("%{}%", search.to_lowercase())));
        let n = args.len();
        clauses.push(format!(
            "(lower(vendor_sku) LIKE ?{n} OR lower(title) LIKE ?{n} OR lower(marketplace_child_sku) LIKE ?{n})"
        ));
    }

    if clauses.is_empty() {
        (String::new(), args)
    } else {
        (format!("WHERE {}", clauses.join(" AND ")), args)
    }
}

// ==========================================
// ProductRepositoryImpl
// ==========================================
pub struct ProductRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRepositoryImpl {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn find_id_by_key(conn: &Connection, key: &ProductKey) -> RepositoryResult<Option<i64>> {
        let id = conn
            .query_row(
                "SELECT id FROM product WHERE vendor_id = ?1 AND vendor_sku = ?2 AND store_id = ?3",
                params![key.vendor_id, key.vendor_sku, key.store_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn insert_with(
        conn: &Connection,
        upsert: &ProductUpsert,
        now: DateTime<Utc>,
    ) -> RepositoryResult<i64> {
        let ts = to_db_timestamp(&now);
        conn.execute(
            r#"
            INSERT INTO product (
                vendor_id, vendor_sku, marketplace_id, store_id, upload_id,
                marketplace_child_sku, marketplace_parent_sku, title, source_url,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?10)
            "#,
            params![
                upsert.key.vendor_id,
                upsert.key.vendor_sku,
                upsert.marketplace_id,
                upsert.key.store_id,
                upsert.upload_id,
                upsert.marketplace_child_sku,
                upsert.marketplace_parent_sku,
                upsert.title,
                upsert.source_url,
                ts,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

impl ProductRepository for ProductRepositoryImpl {
    fn find_by_key(&self, key: &ProductKey) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM product WHERE vendor_id = ?1 AND vendor_sku = ?2 AND store_id = ?3",
            PRODUCT_COLUMNS
        );
        let product = conn
            .query_row(
                &sql,
                params![key.vendor_id, key.vendor_sku, key.store_id],
                map_product_row,
            )
            .optional()?;
        Ok(product)
    }

    fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM product WHERE id = ?1", PRODUCT_COLUMNS);
        let product = conn.query_row(&sql, params![id], map_product_row).optional()?;
        Ok(product)
    }

    fn upsert(&self, upsert: &ProductUpsert, now: DateTime<Utc>) -> RepositoryResult<UpsertOutcome> {
        let conn = self.get_conn()?;

        match Self::find_id_by_key(&conn, &upsert.key)? {
            Some(id) => {
                conn.execute(
                    r#"
                    UPDATE product SET
                        marketplace_child_sku = ?1,
                        marketplace_parent_sku = ?2,
                        title = ?3,
                        source_url = ?4,
                        upload_id = ?5,
                        marketplace_id = ?6,
                        updated_at = ?7
                    WHERE id = ?8
                    "#,
                    params![
                        upsert.marketplace_child_sku,
                        upsert.marketplace_parent_sku,
                        upsert.title,
                        upsert.source_url,
                        upsert.upload_id,
                        upsert.marketplace_id,
                        to_db_timestamp(&now),
                        id,
                    ],
                )?;
                Ok(UpsertOutcome::Updated(id))
            }
            None => Self::insert_with(&conn, upsert, now).map(UpsertOutcome::Created),
        }
    }

    fn insert(&self, upsert: &ProductUpsert, now: DateTime<Utc>) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Self::insert_with(&conn, upsert, now)
    }

    fn list(&self, filter: &ProductFilter) -> RepositoryResult<Vec<Product>> {
        let conn = self.get_conn()?;
        let (where_sql, mut args) = build_where(filter);

        let mut sql = format!(
            "SELECT {} FROM product {} ORDER BY created_at DESC, id DESC",
            PRODUCT_COLUMNS, where_sql
        );
        if let Some(limit) = filter.limit {
            args.push(Value::Integer(limit));
            args.push(Value::Integer(filter.offset.max(0)));
            sql.push_str(&format!(" LIMIT ?{} OFFSET ?{}", args.len() - 1, args.len()));
        }

        let mut stmt = conn.prepare(&sql)?;
        let products = stmt
            .query_map(params_from_iter(args.iter()), map_product_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    fn count(&self, filter: &ProductFilter) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let (where_sql, args) = build_where(filter);
        let sql = format!("SELECT COUNT(*) FROM product {}", where_sql);
        let n = conn.query_row(&sql, params_from_iter(args.iter()), |row| row.get(0))?;
        Ok(n)
    }

    fn deactivate(&self, id: i64, now: DateTime<Utc>) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "UPDATE product SET is_active = 0, updated_at = ?1 WHERE id = ?2",
            params![to_db_timestamp(&now), id],
        )?;
        Ok(changed > 0)
    }

    fn record_pricing(
        &self,
        id: i64,
        pricing: &PricingUpdate,
        now: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            r#"
            UPDATE product SET
                vendor_price = ?1,
                calculated_price = ?2,
                vendor_stock = ?3,
                calculated_stock = ?4,
                last_scraped = ?5,
                scrape_error = ?6,
                updated_at = ?7
            WHERE id = ?8
            "#,
            params![
                pricing.vendor_price,
                pricing.calculated_price,
                pricing.vendor_stock,
                pricing.calculated_stock,
                pricing.last_scraped.as_ref().map(to_db_timestamp),
                pricing.scrape_error,
                to_db_timestamp(&now),
                id,
            ],
        )?;
        Ok(changed > 0)
    }
}
