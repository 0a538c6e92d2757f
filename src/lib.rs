// ==========================================
// 代发货库存管理后端 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 供应商目录导入 + 市场 CSV 导出
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 供应商 CSV
pub mod importer;

// 导出层 - 市场 CSV
pub mod exporter;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 时钟（导出文件名与作业时间戳）
pub mod clock;

// API 层 - 业务接口
pub mod api;

// 应用层 - 共享状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ExportType, JobStatus};

// 领域实体
pub use domain::{
    ExportArtifact, Marketplace, Product, ProductKey, RawProductRow, Store, StorePriceSettings,
    Upload, Vendor,
};

// 导入 / 导出流水线
pub use exporter::{ExportFormatSelector, ProductExporter};
pub use importer::ProductImporter;

// API
pub use api::{CatalogApi, DashboardApi, ExportApi, ImportApi, ProductApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "代发货库存管理后端";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
