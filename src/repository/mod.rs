// ==========================================
// 代发货库存管理后端 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod catalog_repo;
pub mod error;
pub mod job_repo;
pub mod job_repo_impl;
pub mod product_repo;
pub mod product_repo_impl;

// 重导出核心仓储
pub use catalog_repo::{
    MarketplaceRepository, StorePriceSettingsRepository, StoreRepository, VendorRepository,
};
pub use error::{RepositoryError, RepositoryResult};
pub use job_repo::{ExportArtifactRepository, UploadRepository};
pub use job_repo_impl::{ExportArtifactRepositoryImpl, UploadRepositoryImpl};
pub use product_repo::ProductRepository;
pub use product_repo_impl::ProductRepositoryImpl;
