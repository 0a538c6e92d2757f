// ==========================================
// 代发货库存管理后端 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、作业状态机
// 红线: 不含数据访问逻辑
// ==========================================

pub mod catalog;
pub mod job;
pub mod product;
pub mod types;

// 重导出核心类型
pub use catalog::{
    Marketplace, NewStore, PriceSettingsInput, Store, StorePatch, StorePriceSettings, Vendor,
    VendorPatch,
};
pub use job::{ExportArtifact, InvalidTransition, JobLifecycle, Upload};
pub use product::{
    PricingUpdate, Product, ProductFilter, ProductKey, ProductUpsert, RawProductRow,
    UpsertOutcome,
};
pub use types::{ExportType, JobStatus};
