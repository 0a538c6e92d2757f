// ==========================================
// 代发货库存管理后端 - 商品管理 API
// ==========================================
// 职责: 商品查询 / 单个新建 / 停用 / 写入外部计价结果
// 说明: 计价与抓取本身不在本系统内，只接收其结果
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::clock::Clock;
use crate::domain::product::{PricingUpdate, Product, ProductFilter, ProductUpsert, RawProductRow};
use crate::importer::RowValidator;
use crate::repository::{ProductRepository, StoreRepository, VendorRepository};

/// 商品列表查询条件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    pub store_id: Option<i64>,
    pub vendor_id: Option<i64>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// 商品列表响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    /// 满足条件的总数（忽略分页）
    pub total: i64,
}

/// 单个商品新建请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProductRequest {
    pub vendor_id: i64,
    pub store_id: i64,
    pub vendor_sku: String,
    pub marketplace_child_sku: String,
    pub marketplace_parent_sku: String,
    pub title: String,
    pub source_url: String,
}

pub const DEFAULT_PRODUCT_LIMIT: i64 = 100;

// ==========================================
// ProductApi - 商品管理 API
// ==========================================
pub struct ProductApi {
    product_repo: Arc<dyn ProductRepository>,
    vendor_repo: Arc<VendorRepository>,
    store_repo: Arc<StoreRepository>,
    clock: Arc<dyn Clock>,
}

impl ProductApi {
    /// 创建新的ProductApi实例
    pub fn new(
        product_repo: Arc<dyn ProductRepository>,
        vendor_repo: Arc<VendorRepository>,
        store_repo: Arc<StoreRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            product_repo,
            vendor_repo,
            store_repo,
            clock,
        }
    }

    /// 查询商品（含已停用商品，is_active 随行返回）
    ///
    /// # 参数
    /// - query: 店铺 / 供应商 / 模糊搜索（vendor_sku、标题、市场 SKU，不区分大小写）/ 分页
    ///
    /// # 返回
    /// - Ok(ProductListResponse): 当前页 + 总数
    pub fn list_products(&self, query: &ProductQuery) -> ApiResult<ProductListResponse> {
        let offset = query.offset.unwrap_or(0);
        if offset < 0 {
            return Err(ApiError::InvalidInput(format!("offset 不能为负数: {}", offset)));
        }
        let limit = match query.limit {
            Some(l) if l <= 0 => {
                return Err(ApiError::InvalidInput(format!("limit 必须为正数: {}", l)));
            }
            Some(l) => l,
            None => DEFAULT_PRODUCT_LIMIT,
        };

        let filter = ProductFilter {
            store_id: query.store_id,
            vendor_id: query.vendor_id,
            active_only: false,
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            limit: Some(limit),
            offset,
        };

        let total = self.product_repo.count(&filter)?;
        let products = self.product_repo.list(&filter)?;
        Ok(ProductListResponse { products, total })
    }

    pub fn get_product(&self, product_id: i64) -> ApiResult<Product> {
        self.product_repo
            .find_by_id(product_id)?
            .ok_or_else(|| ApiError::NotFound(format!("商品(id={})不存在", product_id)))
    }

    /// 新建单个商品
    ///
    /// 字段规则与导入一致；同一 (供应商, vendor_sku, 店铺) 已存在时报唯一约束冲突
    pub fn create_product(&self, request: &NewProductRequest) -> ApiResult<Product> {
        let row = RawProductRow {
            row_number: 0,
            vendor_sku: request.vendor_sku.trim().to_string(),
            marketplace_child_sku: request.marketplace_child_sku.trim().to_string(),
            marketplace_parent_sku: request.marketplace_parent_sku.trim().to_string(),
            title: request.title.trim().to_string(),
            source_url: request.source_url.trim().to_string(),
        };
        RowValidator.validate(&row)?;

        if self.vendor_repo.find_by_id(request.vendor_id)?.is_none() {
            return Err(ApiError::NotFound(format!(
                "供应商(id={})不存在",
                request.vendor_id
            )));
        }
        let store = self
            .store_repo
            .find_by_id(request.store_id)?
            .ok_or_else(|| ApiError::NotFound(format!("店铺(id={})不存在", request.store_id)))?;

        let upsert = ProductUpsert::from_row(
            &row,
            request.vendor_id,
            store.id,
            store.marketplace_id,
            None,
        );
        let id = self.product_repo.insert(&upsert, self.clock.now())?;
        self.get_product(id)
    }

    /// 停用商品（软删除，之后不再进入导出）
    pub fn deactivate_product(&self, product_id: i64) -> ApiResult<()> {
        if !self.product_repo.deactivate(product_id, self.clock.now())? {
            return Err(ApiError::NotFound(format!("商品(id={})不存在", product_id)));
        }
        Ok(())
    }

    /// 写入外部计价 / 库存结果
    ///
    /// # 返回
    /// - Err(InvalidInput): 价格非有限数或为负、库存为负
    pub fn record_pricing(&self, product_id: i64, pricing: &PricingUpdate) -> ApiResult<Product> {
        for (field, value) in [
            ("vendor_price", pricing.vendor_price),
            ("calculated_price", pricing.calculated_price),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(ApiError::InvalidInput(format!("{} 非法: {}", field, v)));
                }
            }
        }
        for (field, value) in [
            ("vendor_stock", pricing.vendor_stock),
            ("calculated_stock", pricing.calculated_stock),
        ] {
            if let Some(v) = value {
                if v < 0 {
                    return Err(ApiError::InvalidInput(format!("{} 不能为负数: {}", field, v)));
                }
            }
        }

        if !self
            .product_repo
            .record_pricing(product_id, pricing, self.clock.now())?
        {
            return Err(ApiError::NotFound(format!("商品(id={})不存在", product_id)));
        }
        self.get_product(product_id)
    }
}
