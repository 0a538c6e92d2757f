// ==========================================
// 代发货库存管理后端 - 目录主数据
// ==========================================
// Vendor: 上游供应商（code 唯一）
// Marketplace: 销售渠道平台
// Store: 平台内的店铺账号
// StorePriceSettings: 店铺 × 供应商 的定价参数
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marketplace {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: i64,
    pub marketplace_id: i64,
    pub name: String,
    pub scraping_enabled: bool,
    pub scraping_interval_hours: i64,
    pub price_update_enabled: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 店铺 × 供应商定价参数（百分比取值 [0, 100]）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorePriceSettings {
    pub id: i64,
    pub store_id: i64,
    pub vendor_id: i64,
    pub purchase_tax_percentage: f64,
    pub marketplace_fee_percentage: f64,
    pub min_margin_percentage: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StorePriceSettings {
    pub const DEFAULT_PURCHASE_TAX_PCT: f64 = 10.0;
    pub const DEFAULT_MARKETPLACE_FEE_PCT: f64 = 10.0;
    pub const DEFAULT_MIN_MARGIN_PCT: f64 = 15.0;
}

// ==========================================
// 新建 / 局部更新输入
// ==========================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VendorPatch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStore {
    pub marketplace_id: i64,
    pub name: String,
    pub scraping_enabled: bool,
    pub scraping_interval_hours: i64,
    pub price_update_enabled: bool,
}

impl NewStore {
    pub fn new(marketplace_id: i64, name: &str) -> Self {
        Self {
            marketplace_id,
            name: name.to_string(),
            scraping_enabled: true,
            scraping_interval_hours: 24,
            price_update_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorePatch {
    pub name: Option<String>,
    pub scraping_enabled: Option<bool>,
    pub scraping_interval_hours: Option<i64>,
    pub price_update_enabled: Option<bool>,
    pub is_active: Option<bool>,
}

/// 定价参数写入值（未给出的字段取默认值）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSettingsInput {
    pub purchase_tax_percentage: f64,
    pub marketplace_fee_percentage: f64,
    pub min_margin_percentage: f64,
}

impl Default for PriceSettingsInput {
    fn default() -> Self {
        Self {
            purchase_tax_percentage: StorePriceSettings::DEFAULT_PURCHASE_TAX_PCT,
            marketplace_fee_percentage: StorePriceSettings::DEFAULT_MARKETPLACE_FEE_PCT,
            min_margin_percentage: StorePriceSettings::DEFAULT_MIN_MARGIN_PCT,
        }
    }
}

impl PriceSettingsInput {
    /// 百分比取值检查，返回第一个越界字段
    pub fn out_of_range_field(&self) -> Option<(&'static str, f64)> {
        [
            ("purchase_tax_percentage", self.purchase_tax_percentage),
            ("marketplace_fee_percentage", self.marketplace_fee_percentage),
            ("min_margin_percentage", self.min_margin_percentage),
        ]
        .into_iter()
        .find(|(_, v)| !(0.0..=100.0).contains(v))
    }
}
