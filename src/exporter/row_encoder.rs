// ==========================================
// 代发货库存管理后端 - 导出行编码器
// ==========================================
// 三种固定布局:
// - price:     SKU, Price, Currency          （calculated_price 非空才输出）
// - inventory: SKU, Quantity                 （calculated_stock 非空才输出）
// - full:      7 列全字段                    （总是输出，空值写空字段）
// SKU 取 marketplace_child_sku；价格固定两位小数
// ==========================================

use crate::domain::product::Product;

pub trait RowEncoder: Send + Sync {
    /// 表头（总是输出）
    fn header(&self) -> &'static [&'static str];

    /// 编码一行；返回 None 表示该商品不进入本布局
    fn encode(&self, product: &Product) -> Option<Vec<String>>;
}

/// 价格格式（两位小数）
pub fn format_price(value: f64) -> String {
    format!("{:.2}", value)
}

fn opt_price(value: Option<f64>) -> String {
    value.map(format_price).unwrap_or_default()
}

fn opt_int(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

// ==========================================
// PriceEncoder
// ==========================================
pub struct PriceEncoder {
    pub currency: String,
}

impl RowEncoder for PriceEncoder {
    fn header(&self) -> &'static [&'static str] {
        &["SKU", "Price", "Currency"]
    }

    fn encode(&self, product: &Product) -> Option<Vec<String>> {
        let price = product.calculated_price?;
        Some(vec![
            product.marketplace_child_sku.clone(),
            format_price(price),
            self.currency.clone(),
        ])
    }
}

// ==========================================
// InventoryEncoder
// ==========================================
pub struct InventoryEncoder;

impl RowEncoder for InventoryEncoder {
    fn header(&self) -> &'static [&'static str] {
        &["SKU", "Quantity"]
    }

    fn encode(&self, product: &Product) -> Option<Vec<String>> {
        let stock = product.calculated_stock?;
        Some(vec![product.marketplace_child_sku.clone(), stock.to_string()])
    }
}

// ==========================================
// FullEncoder
// ==========================================
pub struct FullEncoder;

impl RowEncoder for FullEncoder {
    fn header(&self) -> &'static [&'static str] {
        &[
            "Vendor SKU",
            "Marketplace SKU",
            "Title",
            "Vendor Price",
            "Calculated Price",
            "Vendor Stock",
            "Calculated Stock",
        ]
    }

    fn encode(&self, product: &Product) -> Option<Vec<String>> {
        Some(vec![
            product.vendor_sku.clone(),
            product.marketplace_child_sku.clone(),
            product.title.clone(),
            opt_price(product.vendor_price),
            opt_price(product.calculated_price),
            opt_int(product.vendor_stock),
            opt_int(product.calculated_stock),
        ])
    }
}
