// ==========================================
// 代发货库存管理后端 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行入口调用
// ==========================================

pub mod catalog_api;
pub mod dashboard_api;
pub mod error;
pub mod export_api;
pub mod import_api;
pub mod product_api;

// 重导出核心类型
pub use catalog_api::{CatalogApi, PriceSettingsResponse, StoreDetail};
pub use dashboard_api::{DashboardApi, DashboardSummary, HealthResponse};
pub use error::{ApiError, ApiResult, FailureResponse};
pub use export_api::{DownloadResponse, ExportApi, ExportRequest, ExportResponse};
pub use import_api::{ImportApi, ImportRequest, ImportResponse, UploadPage};
pub use product_api::{NewProductRequest, ProductApi, ProductListResponse, ProductQuery};
