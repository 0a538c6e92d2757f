// ==========================================
// 代发货库存管理后端 - 目录主数据 Repository
// ==========================================
// 职责: vendor / marketplace / store / store_price_settings 表读写
// 红线: Repository 不含业务规则（百分比范围由 API 层校验，表上有 CHECK 兜底）
// ==========================================

use crate::db::{get_timestamp, to_db_timestamp};
use crate::domain::catalog::{
    Marketplace, NewStore, PriceSettingsInput, Store, StorePatch, StorePriceSettings, Vendor,
    VendorPatch,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock(conn: &Arc<Mutex<Connection>>) -> RepositoryResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| RepositoryError::LockError(e.to_string()))
}

fn count_active(conn: &Connection, table: &str) -> RepositoryResult<i64> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE is_active = 1", table);
    Ok(conn.query_row(&sql, [], |row| row.get(0))?)
}

// ==========================================
// VendorRepository
// ==========================================

fn map_vendor_row(row: &Row<'_>) -> rusqlite::Result<Vendor> {
    Ok(Vendor {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        is_active: row.get::<_, i64>(3)? != 0,
        created_at: get_timestamp(row, 4)?,
        updated_at: get_timestamp(row, 5)?,
    })
}

pub struct VendorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl VendorRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 新建供应商（name / code 唯一）
    pub fn create(&self, name: &str, code: &str, now: DateTime<Utc>) -> RepositoryResult<Vendor> {
        let conn = lock(&self.conn)?;
        let ts = to_db_timestamp(&now);
        conn.execute(
            "INSERT INTO vendor (name, code, is_active, created_at, updated_at) VALUES (?1, ?2, 1, ?3, ?3)",
            params![name, code, ts],
        )?;
        Ok(Vendor {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            code: code.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Vendor>> {
        let conn = lock(&self.conn)?;
        let vendor = conn
            .query_row(
                "SELECT id, name, code, is_active, created_at, updated_at FROM vendor WHERE id = ?1",
                params![id],
                map_vendor_row,
            )
            .optional()?;
        Ok(vendor)
    }

    /// 有效供应商（按名称排序）
    pub fn list_active(&self) -> RepositoryResult<Vec<Vendor>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT id, name, code, is_active, created_at, updated_at FROM vendor WHERE is_active = 1 ORDER BY name",
        )?;
        let vendors = stmt
            .query_map([], map_vendor_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(vendors)
    }

    /// 局部更新（未给出的字段保持不变）
    ///
    /// # 返回
    /// - Ok(None): 供应商不存在
    pub fn update(
        &self,
        id: i64,
        patch: &VendorPatch,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<Vendor>> {
        {
            let conn = lock(&self.conn)?;
            let changed = conn.execute(
                r#"
                UPDATE vendor SET
                    name = COALESCE(?1, name),
                    code = COALESCE(?2, code),
                    is_active = COALESCE(?3, is_active),
                    updated_at = ?4
                WHERE id = ?5
                "#,
                params![
                    patch.name,
                    patch.code,
                    patch.is_active.map(i64::from),
                    to_db_timestamp(&now),
                    id
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
        }
        self.find_by_id(id)
    }

    /// 软删除
    pub fn deactivate(&self, id: i64, now: DateTime<Utc>) -> RepositoryResult<bool> {
        let conn = lock(&self.conn)?;
        let changed = conn.execute(
            "UPDATE vendor SET is_active = 0, updated_at = ?1 WHERE id = ?2",
            params![to_db_timestamp(&now), id],
        )?;
        Ok(changed > 0)
    }

    pub fn count_active(&self) -> RepositoryResult<i64> {
        let conn = lock(&self.conn)?;
        count_active(&conn, "vendor")
    }
}

// ==========================================
// MarketplaceRepository
// ==========================================

fn map_marketplace_row(row: &Row<'_>) -> rusqlite::Result<Marketplace> {
    Ok(Marketplace {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        is_active: row.get::<_, i64>(3)? != 0,
        created_at: get_timestamp(row, 4)?,
        updated_at: get_timestamp(row, 5)?,
    })
}

pub struct MarketplaceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MarketplaceRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn create(&self, code: &str, name: &str, now: DateTime<Utc>) -> RepositoryResult<Marketplace> {
        let conn = lock(&self.conn)?;
        let ts = to_db_timestamp(&now);
        conn.execute(
            "INSERT INTO marketplace (code, name, is_active, created_at, updated_at) VALUES (?1, ?2, 1, ?3, ?3)",
            params![code, name, ts],
        )?;
        Ok(Marketplace {
            id: conn.last_insert_rowid(),
            code: code.to_string(),
            name: name.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Marketplace>> {
        let conn = lock(&self.conn)?;
        let marketplace = conn
            .query_row(
                "SELECT id, code, name, is_active, created_at, updated_at FROM marketplace WHERE id = ?1",
                params![id],
                map_marketplace_row,
            )
            .optional()?;
        Ok(marketplace)
    }

    pub fn list_active(&self) -> RepositoryResult<Vec<Marketplace>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT id, code, name, is_active, created_at, updated_at FROM marketplace WHERE is_active = 1 ORDER BY name",
        )?;
        let marketplaces = stmt
            .query_map([], map_marketplace_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(marketplaces)
    }

    pub fn count_active(&self) -> RepositoryResult<i64> {
        let conn = lock(&self.conn)?;
        count_active(&conn, "marketplace")
    }
}

// ==========================================
// StoreRepository
// ==========================================

const STORE_COLUMNS: &str = "id, marketplace_id, name, scraping_enabled, scraping_interval_hours, \
                             price_update_enabled, is_active, created_at, updated_at";

fn map_store_row(row: &Row<'_>) -> rusqlite::Result<Store> {
    Ok(Store {
        id: row.get(0)?,
        marketplace_id: row.get(1)?,
        name: row.get(2)?,
        scraping_enabled: row.get::<_, i64>(3)? != 0,
        scraping_interval_hours: row.get(4)?,
        price_update_enabled: row.get::<_, i64>(5)? != 0,
        is_active: row.get::<_, i64>(6)? != 0,
        created_at: get_timestamp(row, 7)?,
        updated_at: get_timestamp(row, 8)?,
    })
}

pub struct StoreRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StoreRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 在指定市场下新建店铺
    pub fn create(&self, input: &NewStore, now: DateTime<Utc>) -> RepositoryResult<Store> {
        let conn = lock(&self.conn)?;
        let ts = to_db_timestamp(&now);
        conn.execute(
            r#"
            INSERT INTO store (
                marketplace_id, name, scraping_enabled, scraping_interval_hours,
                price_update_enabled, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)
            "#,
            params![
                input.marketplace_id,
                input.name,
                input.scraping_enabled as i64,
                input.scraping_interval_hours,
                input.price_update_enabled as i64,
                ts,
            ],
        )?;
        Ok(Store {
            id: conn.last_insert_rowid(),
            marketplace_id: input.marketplace_id,
            name: input.name.clone(),
            scraping_enabled: input.scraping_enabled,
            scraping_interval_hours: input.scraping_interval_hours,
            price_update_enabled: input.price_update_enabled,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Store>> {
        let conn = lock(&self.conn)?;
        let sql = format!("SELECT {} FROM store WHERE id = ?1", STORE_COLUMNS);
        let store = conn.query_row(&sql, params![id], map_store_row).optional()?;
        Ok(store)
    }

    pub fn list_active(&self) -> RepositoryResult<Vec<Store>> {
        let conn = lock(&self.conn)?;
        let sql = format!(
            "SELECT {} FROM store WHERE is_active = 1 ORDER BY name, id",
            STORE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let stores = stmt
            .query_map([], map_store_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stores)
    }

    /// 局部更新
    ///
    /// # 返回
    /// - Ok(None): 店铺不存在
    pub fn update(
        &self,
        id: i64,
        patch: &StorePatch,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<Store>> {
        {
            let conn = lock(&self.conn)?;
            let changed = conn.execute(
                r#"
                UPDATE store SET
                    name = COALESCE(?1, name),
                    scraping_enabled = COALESCE(?2, scraping_enabled),
                    scraping_interval_hours = COALESCE(?3, scraping_interval_hours),
                    price_update_enabled = COALESCE(?4, price_update_enabled),
                    is_active = COALESCE(?5, is_active),
                    updated_at = ?6
                WHERE id = ?7
                "#,
                params![
                    patch.name,
                    patch.scraping_enabled.map(i64::from),
                    patch.scraping_interval_hours,
                    patch.price_update_enabled.map(i64::from),
                    patch.is_active.map(i64::from),
                    to_db_timestamp(&now),
                    id
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
        }
        self.find_by_id(id)
    }

    pub fn deactivate(&self, id: i64, now: DateTime<Utc>) -> RepositoryResult<bool> {
        let conn = lock(&self.conn)?;
        let changed = conn.execute(
            "UPDATE store SET is_active = 0, updated_at = ?1 WHERE id = ?2",
            params![to_db_timestamp(&now), id],
        )?;
        Ok(changed > 0)
    }

    pub fn count_active(&self) -> RepositoryResult<i64> {
        let conn = lock(&self.conn)?;
        count_active(&conn, "store")
    }
}

// ==========================================
// StorePriceSettingsRepository
// ==========================================

fn map_price_settings_row(row: &Row<'_>) -> rusqlite::Result<StorePriceSettings> {
    Ok(StorePriceSettings {
        id: row.get(0)?,
        store_id: row.get(1)?,
        vendor_id: row.get(2)?,
        purchase_tax_percentage: row.get(3)?,
        marketplace_fee_percentage: row.get(4)?,
        min_margin_percentage: row.get(5)?,
        created_at: get_timestamp(row, 6)?,
        updated_at: get_timestamp(row, 7)?,
    })
}

pub struct StorePriceSettingsRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StorePriceSettingsRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 按 (store, vendor) upsert
    ///
    /// # 返回
    /// - (settings, created): created=true 表示新建
    pub fn upsert(
        &self,
        store_id: i64,
        vendor_id: i64,
        input: &PriceSettingsInput,
        now: DateTime<Utc>,
    ) -> RepositoryResult<(StorePriceSettings, bool)> {
        let conn = lock(&self.conn)?;
        let ts = to_db_timestamp(&now);

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM store_price_settings WHERE store_id = ?1 AND vendor_id = ?2",
                params![store_id, vendor_id],
                |row| row.get(0),
            )
            .optional()?;

        let created = existing.is_none();
        match existing {
            Some(id) => {
                conn.execute(
                    r#"
                    UPDATE store_price_settings SET
                        purchase_tax_percentage = ?1,
                        marketplace_fee_percentage = ?2,
                        min_margin_percentage = ?3,
                        updated_at = ?4
                    WHERE id = ?5
                    "#,
                    params![
                        input.purchase_tax_percentage,
                        input.marketplace_fee_percentage,
                        input.min_margin_percentage,
                        ts,
                        id
                    ],
                )?;
            }
            None => {
                conn.execute(
                    r#"
                    INSERT INTO store_price_settings (
                        store_id, vendor_id, purchase_tax_percentage,
                        marketplace_fee_percentage, min_margin_percentage, created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                    "#,
                    params![
                        store_id,
                        vendor_id,
                        input.purchase_tax_percentage,
                        input.marketplace_fee_percentage,
                        input.min_margin_percentage,
                        ts
                    ],
                )?;
            }
        }

        let settings = conn.query_row(
            r#"
            SELECT id, store_id, vendor_id, purchase_tax_percentage,
                   marketplace_fee_percentage, min_margin_percentage, created_at, updated_at
            FROM store_price_settings WHERE store_id = ?1 AND vendor_id = ?2
            "#,
            params![store_id, vendor_id],
            map_price_settings_row,
        )?;
        Ok((settings, created))
    }

    pub fn list_by_store(&self, store_id: i64) -> RepositoryResult<Vec<StorePriceSettings>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, store_id, vendor_id, purchase_tax_percentage,
                   marketplace_fee_percentage, min_margin_percentage, created_at, updated_at
            FROM store_price_settings WHERE store_id = ?1 ORDER BY vendor_id
            "#,
        )?;
        let settings = stmt
            .query_map(params![store_id], map_price_settings_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()
    }

    fn shared_conn() -> Arc<Mutex<Connection>> {
        Arc::new(Mutex::new(open_in_memory().unwrap()))
    }

    #[test]
    fn test_vendor_create_update_deactivate() {
        let repo = VendorRepository::new(shared_conn());
        let v = repo.create("Acme Supplies", "acme", t0()).unwrap();

        let patch = VendorPatch {
            name: Some("Acme Wholesale".to_string()),
            ..Default::default()
        };
        let updated = repo
            .update(v.id, &patch, t0() + Duration::minutes(1))
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Acme Wholesale");
        assert_eq!(updated.code, "acme");
        assert!(repo.update(999, &patch, t0()).unwrap().is_none());

        assert!(repo.deactivate(v.id, t0()).unwrap());
        assert!(repo.list_active().unwrap().is_empty());
        assert_eq!(repo.count_active().unwrap(), 0);
        // 软删除后仍可按 ID 查到
        assert!(!repo.find_by_id(v.id).unwrap().unwrap().is_active);
    }

    #[test]
    fn test_vendor_duplicate_code_rejected() {
        let repo = VendorRepository::new(shared_conn());
        repo.create("A", "dup", t0()).unwrap();
        let err = repo.create("B", "dup", t0()).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_store_requires_marketplace() {
        let conn = shared_conn();
        let stores = StoreRepository::new(conn.clone());
        let err = stores.create(&NewStore::new(42, "Orphan"), t0()).unwrap_err();
        assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));

        let markets = MarketplaceRepository::new(conn);
        let m = markets.create("ebay", "eBay", t0()).unwrap();
        let s = stores.create(&NewStore::new(m.id, "Main"), t0()).unwrap();
        assert_eq!(s.scraping_interval_hours, 24);
        assert_eq!(stores.list_active().unwrap().len(), 1);
    }

    #[test]
    fn test_price_settings_upsert_reports_created() {
        let conn = shared_conn();
        let vendor = VendorRepository::new(conn.clone())
            .create("Acme", "acme", t0())
            .unwrap();
        let market = MarketplaceRepository::new(conn.clone())
            .create("ebay", "eBay", t0())
            .unwrap();
        let store = StoreRepository::new(conn.clone())
            .create(&NewStore::new(market.id, "Main"), t0())
            .unwrap();

        let repo = StorePriceSettingsRepository::new(conn);
        let (first, created) = repo
            .upsert(store.id, vendor.id, &PriceSettingsInput::default(), t0())
            .unwrap();
        assert!(created);
        assert_eq!(first.min_margin_percentage, 15.0);

        let input = PriceSettingsInput {
            min_margin_percentage: 20.0,
            ..Default::default()
        };
        let (second, created) = repo.upsert(store.id, vendor.id, &input, t0()).unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.min_margin_percentage, 20.0);
        assert_eq!(repo.list_by_store(store.id).unwrap().len(), 1);
    }
}
