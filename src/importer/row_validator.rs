// ==========================================
// 代发货库存管理后端 - 行校验器
// ==========================================
// 在 upsert 阶段执行（解码阶段不做校验）
// 规则:
// - vendor_sku 非空
// - SKU 类字段 ≤ 255 字符；title / source_url ≤ 500 字符
// ==========================================

use crate::domain::product::{RawProductRow, MAX_SKU_LEN, MAX_SOURCE_URL_LEN, MAX_TITLE_LEN};
use crate::importer::error::{ImportError, ImportResult};

pub struct RowValidator;

impl RowValidator {
    pub fn validate(&self, row: &RawProductRow) -> ImportResult<()> {
        if row.vendor_sku.is_empty() {
            return Err(ImportError::EmptyVendorSku);
        }

        let limits: [(&'static str, &str, usize); 5] = [
            ("vendor_sku", &row.vendor_sku, MAX_SKU_LEN),
            ("marketplace_child_sku", &row.marketplace_child_sku, MAX_SKU_LEN),
            ("marketplace_parent_sku", &row.marketplace_parent_sku, MAX_SKU_LEN),
            ("title", &row.title, MAX_TITLE_LEN),
            ("source_url", &row.source_url, MAX_SOURCE_URL_LEN),
        ];
        for (field, value, max) in limits {
            let actual = value.chars().count();
            if actual > max {
                return Err(ImportError::FieldTooLong { field, max, actual });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sku: &str) -> RawProductRow {
        RawProductRow {
            row_number: 2,
            vendor_sku: sku.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_sku_rejected() {
        assert!(matches!(
            RowValidator.validate(&row("")),
            Err(ImportError::EmptyVendorSku)
        ));
    }

    #[test]
    fn test_length_limits_count_chars() {
        // 255 个多字节字符仍在上限内
        assert!(RowValidator.validate(&row(&"货".repeat(255))).is_ok());
        assert!(matches!(
            RowValidator.validate(&row(&"a".repeat(256))),
            Err(ImportError::FieldTooLong {
                field: "vendor_sku",
                max: 255,
                actual: 256
            })
        ));

        let mut long_title = row("A");
        long_title.title = "t".repeat(501);
        assert!(matches!(
            RowValidator.validate(&long_title),
            Err(ImportError::FieldTooLong { field: "title", .. })
        ));
    }
}
