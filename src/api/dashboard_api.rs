// ==========================================
// 代发货库存管理后端 - 仪表盘 API
// ==========================================
// 职责: 健康检查 + 有效实体计数汇总
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::domain::product::ProductFilter;
use crate::repository::{
    MarketplaceRepository, ProductRepository, StoreRepository, VendorRepository,
};

/// 健康检查响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub api: String,
}

/// 汇总计数（仅统计有效记录）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub vendors: i64,
    pub marketplaces: i64,
    pub stores: i64,
    pub products: i64,
}

// ==========================================
// DashboardApi - 仪表盘 API
// ==========================================
pub struct DashboardApi {
    vendor_repo: Arc<VendorRepository>,
    marketplace_repo: Arc<MarketplaceRepository>,
    store_repo: Arc<StoreRepository>,
    product_repo: Arc<dyn ProductRepository>,
}

impl DashboardApi {
    /// 创建新的DashboardApi实例
    pub fn new(
        vendor_repo: Arc<VendorRepository>,
        marketplace_repo: Arc<MarketplaceRepository>,
        store_repo: Arc<StoreRepository>,
        product_repo: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            vendor_repo,
            marketplace_repo,
            store_repo,
            product_repo,
        }
    }

    /// 健康检查（不访问数据库）
    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "healthy".to_string(),
            api: "operational".to_string(),
        }
    }

    /// 汇总计数
    ///
    /// # 返回
    /// - Ok(DashboardSummary): 有效供应商 / 市场 / 店铺 / 商品数量
    pub fn summary(&self) -> ApiResult<DashboardSummary> {
        let products = self.product_repo.count(&ProductFilter {
            active_only: true,
            ..Default::default()
        })?;

        Ok(DashboardSummary {
            vendors: self.vendor_repo.count_active()?,
            marketplaces: self.marketplace_repo.count_active()?,
            stores: self.store_repo.count_active()?,
            products,
        })
    }
}
