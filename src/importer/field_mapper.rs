// ==========================================
// 代发货库存管理后端 - 字段映射器
// ==========================================
// 职责: 解析行 → RawProductRow
// 约束: 未知列忽略；缺列映射为空串，不在此阶段报错
// ==========================================

use crate::domain::product::RawProductRow;
use crate::importer::file_parser::ParsedRow;

// 识别的列名（表头已转小写）
pub mod columns {
    pub const VENDOR_SKU: &str = "vendor_sku";
    pub const MARKETPLACE_CHILD_SKU: &str = "marketplace_child_sku";
    pub const MARKETPLACE_PARENT_SKU: &str = "marketplace_parent_sku";
    pub const TITLE: &str = "title";
    pub const SOURCE_URL: &str = "source_url";
}

pub struct FieldMapper;

impl FieldMapper {
    pub fn map_to_raw_row(&self, row: &ParsedRow) -> RawProductRow {
        let get = |key: &str| row.fields.get(key).cloned().unwrap_or_default();

        RawProductRow {
            row_number: row.row_number,
            vendor_sku: get(columns::VENDOR_SKU),
            marketplace_child_sku: get(columns::MARKETPLACE_CHILD_SKU),
            marketplace_parent_sku: get(columns::MARKETPLACE_PARENT_SKU),
            title: get(columns::TITLE),
            source_url: get(columns::SOURCE_URL),
        }
    }
}
