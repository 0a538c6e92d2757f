// ==========================================
// 代发货库存管理后端 - 导入层
// ==========================================
// 职责: 供应商目录 CSV → 商品 upsert + 导入作业记录
// ==========================================

// 模块声明
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod product_importer;
pub mod row_validator;

// 重导出核心类型
pub use error::{ImportError, ImportResult, RowFailure};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ParsedCsv, ParsedRow};
pub use product_importer::{ImportSummary, ImportTarget, ProductImporter};
pub use row_validator::RowValidator;
