// ==========================================
// 商品目录导入API
// ==========================================
// 职责: 封装导入流水线 + 导入历史查询
// 前置: 供应商 / 店铺必须存在（否则 NotFound，不建作业）
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::job::Upload;
use crate::importer::{ImportTarget, ProductImporter};
use crate::repository::{StoreRepository, UploadRepository, VendorRepository};

/// 导入请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    pub vendor_id: i64,
    pub store_id: i64,
    pub filename: String,
    pub content: Vec<u8>,
}

/// 导入API响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResponse {
    pub success: bool,
    pub upload_id: String,
    /// 成功行数（新建 + 更新）
    pub created: usize,
    /// 失败行数
    pub errors: usize,
    /// 前若干条行级错误
    pub error_details: Vec<String>,
}

/// 导入历史分页
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadPage {
    pub uploads: Vec<Upload>,
    pub page: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// 导入API
pub struct ImportApi {
    vendor_repo: Arc<VendorRepository>,
    store_repo: Arc<StoreRepository>,
    upload_repo: Arc<dyn UploadRepository>,
    importer: Arc<ProductImporter>,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(
        vendor_repo: Arc<VendorRepository>,
        store_repo: Arc<StoreRepository>,
        upload_repo: Arc<dyn UploadRepository>,
        importer: Arc<ProductImporter>,
    ) -> Self {
        Self {
            vendor_repo,
            store_repo,
            upload_repo,
            importer,
        }
    }

    /// 导入商品目录
    ///
    /// # 参数
    /// - request: 供应商 / 店铺 / 文件名 / 文件内容
    ///
    /// # 返回
    /// - Ok(ImportResponse): 作业 completed（可能含行级失败）
    /// - Err(ApiError): 前置检查失败或批次级失败
    pub fn import_products(&self, request: &ImportRequest) -> ApiResult<ImportResponse> {
        if request.filename.trim().is_empty() {
            return Err(ApiError::InvalidInput("未提供文件".to_string()));
        }

        let vendor = self
            .vendor_repo
            .find_by_id(request.vendor_id)?
            .ok_or_else(|| ApiError::NotFound(format!("供应商(id={})不存在", request.vendor_id)))?;
        let store = self
            .store_repo
            .find_by_id(request.store_id)?
            .ok_or_else(|| ApiError::NotFound(format!("店铺(id={})不存在", request.store_id)))?;

        let target = ImportTarget {
            vendor_id: vendor.id,
            store_id: store.id,
            marketplace_id: store.marketplace_id,
        };
        let summary = self
            .importer
            .import(&target, &request.filename, &request.content)?;

        Ok(ImportResponse {
            success: true,
            upload_id: summary.upload_id,
            created: summary.successful_rows,
            errors: summary.failed_rows,
            error_details: summary.error_details,
        })
    }

    /// 导入历史（分页，最新在前）
    ///
    /// # 参数
    /// - page: 页码（从 1 开始，<1 视为 1，超出末页取末页）
    /// - page_size: 每页条数（<1 取默认值，上限 100）
    pub fn list_uploads(&self, page: i64, page_size: i64) -> ApiResult<UploadPage> {
        let page_size = if page_size < 1 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size.min(MAX_PAGE_SIZE)
        };

        let total_count = self.upload_repo.count()?;
        let total_pages = (total_count + page_size - 1) / page_size;
        let page = page.clamp(1, total_pages.max(1));
        let uploads = self
            .upload_repo
            .list_page(page_size, (page - 1) * page_size)?;

        Ok(UploadPage {
            uploads,
            page,
            page_size,
            total_count,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        })
    }

    /// 查询单个导入作业
    pub fn get_upload(&self, upload_id: &str) -> ApiResult<Upload> {
        self.upload_repo
            .find_by_id(upload_id)?
            .ok_or_else(|| ApiError::NotFound(format!("导入作业(id={})不存在", upload_id)))
    }
}
