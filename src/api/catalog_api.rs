// ==========================================
// 代发货库存管理后端 - 目录管理 API
// ==========================================
// 职责: 供应商 / 市场 / 店铺 / 店铺定价参数的维护
// 删除均为软删除（is_active = false）
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::clock::Clock;
use crate::domain::catalog::{
    Marketplace, NewStore, PriceSettingsInput, Store, StorePatch, StorePriceSettings, Vendor,
    VendorPatch,
};
use crate::repository::{
    MarketplaceRepository, StorePriceSettingsRepository, StoreRepository, VendorRepository,
};

/// 店铺详情（含各供应商定价参数）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreDetail {
    pub store: Store,
    pub price_settings: Vec<StorePriceSettings>,
}

/// 定价参数写入结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSettingsResponse {
    pub settings: StorePriceSettings,
    pub created: bool,
}

// ==========================================
// CatalogApi - 目录管理 API
// ==========================================

/// 目录管理API
///
/// 职责：
/// 1. 供应商增删改查
/// 2. 市场创建与列表
/// 3. 店铺增删改查（详情附带定价参数）
/// 4. 店铺 x 供应商定价参数 upsert
pub struct CatalogApi {
    vendor_repo: Arc<VendorRepository>,
    marketplace_repo: Arc<MarketplaceRepository>,
    store_repo: Arc<StoreRepository>,
    price_settings_repo: Arc<StorePriceSettingsRepository>,
    clock: Arc<dyn Clock>,
}

impl CatalogApi {
    /// 创建新的CatalogApi实例
    pub fn new(
        vendor_repo: Arc<VendorRepository>,
        marketplace_repo: Arc<MarketplaceRepository>,
        store_repo: Arc<StoreRepository>,
        price_settings_repo: Arc<StorePriceSettingsRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            vendor_repo,
            marketplace_repo,
            store_repo,
            price_settings_repo,
            clock,
        }
    }

    // ==========================================
    // 供应商
    // ==========================================

    /// 创建供应商
    ///
    /// # 参数
    /// - name: 名称（唯一）
    /// - code: 代码（唯一）
    ///
    /// # 返回
    /// - Err(BusinessRuleViolation): 名称或代码重复
    pub fn create_vendor(&self, name: &str, code: &str) -> ApiResult<Vendor> {
        let name = name.trim();
        let code = code.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidInput("供应商名称不能为空".to_string()));
        }
        if code.is_empty() {
            return Err(ApiError::InvalidInput("供应商代码不能为空".to_string()));
        }

        Ok(self.vendor_repo.create(name, code, self.clock.now())?)
    }

    pub fn get_vendor(&self, vendor_id: i64) -> ApiResult<Vendor> {
        self.vendor_repo
            .find_by_id(vendor_id)?
            .ok_or_else(|| ApiError::NotFound(format!("供应商(id={})不存在", vendor_id)))
    }

    pub fn list_vendors(&self) -> ApiResult<Vec<Vendor>> {
        Ok(self.vendor_repo.list_active()?)
    }

    /// 部分更新供应商（未给出的字段保持不变）
    pub fn update_vendor(&self, vendor_id: i64, patch: &VendorPatch) -> ApiResult<Vendor> {
        if matches!(patch.name.as_deref(), Some(n) if n.trim().is_empty()) {
            return Err(ApiError::InvalidInput("供应商名称不能为空".to_string()));
        }
        if matches!(patch.code.as_deref(), Some(c) if c.trim().is_empty()) {
            return Err(ApiError::InvalidInput("供应商代码不能为空".to_string()));
        }

        self.vendor_repo
            .update(vendor_id, patch, self.clock.now())?
            .ok_or_else(|| ApiError::NotFound(format!("供应商(id={})不存在", vendor_id)))
    }

    /// 软删除供应商
    pub fn delete_vendor(&self, vendor_id: i64) -> ApiResult<()> {
        if !self.vendor_repo.deactivate(vendor_id, self.clock.now())? {
            return Err(ApiError::NotFound(format!("供应商(id={})不存在", vendor_id)));
        }
        Ok(())
    }

    // ==========================================
    // 市场
    // ==========================================

    pub fn create_marketplace(&self, code: &str, name: &str) -> ApiResult<Marketplace> {
        let code = code.trim();
        let name = name.trim();
        if code.is_empty() {
            return Err(ApiError::InvalidInput("市场代码不能为空".to_string()));
        }
        if name.is_empty() {
            return Err(ApiError::InvalidInput("市场名称不能为空".to_string()));
        }

        Ok(self.marketplace_repo.create(code, name, self.clock.now())?)
    }

    pub fn list_marketplaces(&self) -> ApiResult<Vec<Marketplace>> {
        Ok(self.marketplace_repo.list_active()?)
    }

    // ==========================================
    // 店铺
    // ==========================================

    /// 在市场下创建店铺
    ///
    /// # 返回
    /// - Err(NotFound): 市场不存在
    pub fn create_store(&self, input: &NewStore) -> ApiResult<Store> {
        if input.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("店铺名称不能为空".to_string()));
        }
        if input.scraping_interval_hours <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "抓取间隔必须为正数: {}",
                input.scraping_interval_hours
            )));
        }
        if self.marketplace_repo.find_by_id(input.marketplace_id)?.is_none() {
            return Err(ApiError::NotFound(format!(
                "市场(id={})不存在",
                input.marketplace_id
            )));
        }

        Ok(self.store_repo.create(input, self.clock.now())?)
    }

    /// 店铺详情
    ///
    /// # 返回
    /// - Ok(StoreDetail): 店铺 + 该店铺下全部定价参数
    pub fn get_store(&self, store_id: i64) -> ApiResult<StoreDetail> {
        let store = self
            .store_repo
            .find_by_id(store_id)?
            .ok_or_else(|| ApiError::NotFound(format!("店铺(id={})不存在", store_id)))?;
        let price_settings = self.price_settings_repo.list_by_store(store_id)?;

        Ok(StoreDetail {
            store,
            price_settings,
        })
    }

    pub fn list_stores(&self) -> ApiResult<Vec<Store>> {
        Ok(self.store_repo.list_active()?)
    }

    /// 部分更新店铺
    pub fn update_store(&self, store_id: i64, patch: &StorePatch) -> ApiResult<Store> {
        if matches!(patch.name.as_deref(), Some(n) if n.trim().is_empty()) {
            return Err(ApiError::InvalidInput("店铺名称不能为空".to_string()));
        }
        if matches!(patch.scraping_interval_hours, Some(h) if h <= 0) {
            return Err(ApiError::InvalidInput("抓取间隔必须为正数".to_string()));
        }

        self.store_repo
            .update(store_id, patch, self.clock.now())?
            .ok_or_else(|| ApiError::NotFound(format!("店铺(id={})不存在", store_id)))
    }

    /// 软删除店铺
    pub fn delete_store(&self, store_id: i64) -> ApiResult<()> {
        if !self.store_repo.deactivate(store_id, self.clock.now())? {
            return Err(ApiError::NotFound(format!("店铺(id={})不存在", store_id)));
        }
        Ok(())
    }

    // ==========================================
    // 店铺定价参数
    // ==========================================

    /// 写入店铺 x 供应商定价参数
    ///
    /// # 参数
    /// - store_id / vendor_id: 必须存在
    /// - input: 三个百分比，取值 [0, 100]
    ///
    /// # 返回
    /// - Ok(PriceSettingsResponse): created=true 表示新建
    pub fn upsert_price_settings(
        &self,
        store_id: i64,
        vendor_id: i64,
        input: &PriceSettingsInput,
    ) -> ApiResult<PriceSettingsResponse> {
        if let Some((field, value)) = input.out_of_range_field() {
            return Err(ApiError::InvalidInput(format!(
                "{} 必须在 0 到 100 之间: {}",
                field, value
            )));
        }
        if self.store_repo.find_by_id(store_id)?.is_none() {
            return Err(ApiError::NotFound(format!("店铺(id={})不存在", store_id)));
        }
        if self.vendor_repo.find_by_id(vendor_id)?.is_none() {
            return Err(ApiError::NotFound(format!("供应商(id={})不存在", vendor_id)));
        }

        let (settings, created) =
            self.price_settings_repo
                .upsert(store_id, vendor_id, input, self.clock.now())?;
        Ok(PriceSettingsResponse { settings, created })
    }

    pub fn list_price_settings(&self, store_id: i64) -> ApiResult<Vec<StorePriceSettings>> {
        Ok(self.price_settings_repo.list_by_store(store_id)?)
    }
}
