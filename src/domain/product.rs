// ==========================================
// 代发货库存管理后端 - 商品领域模型
// ==========================================
// 唯一键: (vendor_id, vendor_sku, store_id)
// 导入流程写入 / 更新；导出流程只读
// 价格与库存字段来自外部（抓取 / 计价），本系统只负责记录
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 字段长度上限（与目录系统的列宽一致）
pub const MAX_SKU_LEN: usize = 255;
pub const MAX_TITLE_LEN: usize = 500;
pub const MAX_SOURCE_URL_LEN: usize = 500;

// ==========================================
// Product - 商品
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub vendor_id: i64,
    pub vendor_sku: String,
    pub marketplace_id: i64,
    pub store_id: i64,
    pub upload_id: Option<String>, // 最近一次写入该商品的导入批次
    pub marketplace_child_sku: String,
    pub marketplace_parent_sku: String,
    pub title: String,
    pub source_url: String,
    pub vendor_price: Option<f64>,
    pub calculated_price: Option<f64>,
    pub vendor_stock: Option<i64>,
    pub calculated_stock: Option<i64>,
    pub is_active: bool,
    pub last_scraped: Option<DateTime<Utc>>,
    pub scrape_error: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 商品唯一键
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductKey {
    pub vendor_id: i64,
    pub vendor_sku: String,
    pub store_id: i64,
}

// ==========================================
// RawProductRow - CSV 解码后的候选商品行
// ==========================================
// 所有字段为文本且已 TRIM；缺列 → 空串
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProductRow {
    pub row_number: usize, // 文件行号（表头为第 1 行）
    pub vendor_sku: String,
    pub marketplace_child_sku: String,
    pub marketplace_parent_sku: String,
    pub title: String,
    pub source_url: String,
}

// ==========================================
// ProductUpsert - upsert 写入内容
// ==========================================
// 命中唯一键时覆盖: 市场 SKU / 标题 / 来源 URL / 所属批次 / 市场
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUpsert {
    pub key: ProductKey,
    pub marketplace_id: i64,
    pub marketplace_child_sku: String,
    pub marketplace_parent_sku: String,
    pub title: String,
    pub source_url: String,
    pub upload_id: Option<String>,
}

impl ProductUpsert {
    /// 由 CSV 行构造（供应商 / 店铺 / 市场由调用方给定）
    pub fn from_row(
        row: &RawProductRow,
        vendor_id: i64,
        store_id: i64,
        marketplace_id: i64,
        upload_id: Option<String>,
    ) -> Self {
        Self {
            key: ProductKey {
                vendor_id,
                vendor_sku: row.vendor_sku.clone(),
                store_id,
            },
            marketplace_id,
            marketplace_child_sku: row.marketplace_child_sku.clone(),
            marketplace_parent_sku: row.marketplace_parent_sku.clone(),
            title: row.title.clone(),
            source_url: row.source_url.clone(),
            upload_id,
        }
    }
}

/// upsert 结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsertOutcome {
    Created(i64),
    Updated(i64),
}

impl UpsertOutcome {
    pub fn product_id(&self) -> i64 {
        match self {
            UpsertOutcome::Created(id) | UpsertOutcome::Updated(id) => *id,
        }
    }
}

// ==========================================
// ProductFilter - 列表 / 导出过滤条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    pub store_id: Option<i64>,
    pub vendor_id: Option<i64>,
    pub active_only: bool,
    pub search: Option<String>, // vendor_sku / title / marketplace_child_sku 模糊匹配（不区分大小写）
    pub limit: Option<i64>,
    pub offset: i64,
}

impl ProductFilter {
    /// 导出使用的过滤条件：店铺内、可选供应商、仅有效商品、不分页
    pub fn for_export(store_id: i64, vendor_id: Option<i64>) -> Self {
        Self {
            store_id: Some(store_id),
            vendor_id,
            active_only: true,
            ..Default::default()
        }
    }
}

// ==========================================
// PricingUpdate - 外部计价 / 抓取结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingUpdate {
    pub vendor_price: Option<f64>,
    pub calculated_price: Option<f64>,
    pub vendor_stock: Option<i64>,
    pub calculated_stock: Option<i64>,
    pub last_scraped: Option<DateTime<Utc>>,
    pub scrape_error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_from_row_carries_key() {
        let row = RawProductRow {
            row_number: 2,
            vendor_sku: "V-1".to_string(),
            marketplace_child_sku: "M-1".to_string(),
            ..Default::default()
        };
        let upsert = ProductUpsert::from_row(&row, 7, 9, 3, Some("u1".to_string()));
        assert_eq!(
            upsert.key,
            ProductKey {
                vendor_id: 7,
                vendor_sku: "V-1".to_string(),
                store_id: 9
            }
        );
        assert_eq!(upsert.marketplace_id, 3);
        assert_eq!(upsert.upload_id.as_deref(), Some("u1"));
    }

    #[test]
    fn test_export_filter_is_active_only() {
        let f = ProductFilter::for_export(1, None);
        assert!(f.active_only);
        assert_eq!(f.limit, None);
        assert_eq!(f.store_id, Some(1));
    }
}
