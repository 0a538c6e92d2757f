// ==========================================
// 代发货库存管理后端 - 导出层
// ==========================================
// 职责: 商品 → 市场 CSV（price / inventory / full）+ 导出作业记录
// ==========================================

pub mod error;
pub mod format_selector;
pub mod product_exporter;
pub mod row_encoder;

// 重导出核心类型
pub use error::{ExportError, ExportResult};
pub use format_selector::{ExportFormatSelector, RenderedCsv, WrittenFile};
pub use product_exporter::{ExportSummary, ExportTarget, ProductExporter};
pub use row_encoder::{format_price, FullEncoder, InventoryEncoder, PriceEncoder, RowEncoder};
