// ==========================================
// 市场 CSV 导出API
// ==========================================
// 职责: 生成导出、导出历史、下载
// 约束: 导出类型在建作业之前校验
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::job::ExportArtifact;
use crate::domain::types::ExportType;
use crate::exporter::{ExportTarget, ProductExporter};
use crate::repository::{ExportArtifactRepository, StoreRepository, VendorRepository};

/// 导出请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportRequest {
    pub store_id: i64,
    pub vendor_id: Option<i64>,
    /// price / inventory / full（缺省 full）
    pub export_type: Option<String>,
}

/// 导出API响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    pub export_id: String,
    pub filename: String,
    pub products_exported: usize,
}

/// 下载响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResponse {
    pub filename: String,
    pub content_type: String,
    pub content_disposition: String,
    pub body: Vec<u8>,
}

pub const DEFAULT_EXPORT_LIST_LIMIT: i64 = 50;

/// 导出API
pub struct ExportApi {
    store_repo: Arc<StoreRepository>,
    vendor_repo: Arc<VendorRepository>,
    export_repo: Arc<dyn ExportArtifactRepository>,
    exporter: Arc<ProductExporter>,
}

impl ExportApi {
    /// 创建新的ExportApi实例
    pub fn new(
        store_repo: Arc<StoreRepository>,
        vendor_repo: Arc<VendorRepository>,
        export_repo: Arc<dyn ExportArtifactRepository>,
        exporter: Arc<ProductExporter>,
    ) -> Self {
        Self {
            store_repo,
            vendor_repo,
            export_repo,
            exporter,
        }
    }

    /// 生成导出文件
    ///
    /// # 返回
    /// - Ok(ExportResponse): 作业 completed
    /// - Err(InvalidInput): 导出类型非法（未建作业）
    /// - Err(NotFound): 店铺 / 供应商不存在（未建作业）
    /// - Err(ExportError): 作业 failed
    pub fn generate_export(&self, request: &ExportRequest) -> ApiResult<ExportResponse> {
        let export_type = match request.export_type.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw
                .parse::<ExportType>()
                .map_err(|e| ApiError::InvalidInput(e.to_string()))?,
            _ => ExportType::default(),
        };

        let store = self
            .store_repo
            .find_by_id(request.store_id)?
            .ok_or_else(|| ApiError::NotFound(format!("店铺(id={})不存在", request.store_id)))?;
        if let Some(vendor_id) = request.vendor_id {
            if self.vendor_repo.find_by_id(vendor_id)?.is_none() {
                return Err(ApiError::NotFound(format!("供应商(id={})不存在", vendor_id)));
            }
        }

        let target = ExportTarget {
            store_id: store.id,
            store_name: store.name,
            vendor_id: request.vendor_id,
        };
        let summary = self.exporter.export(&target, export_type)?;

        Ok(ExportResponse {
            success: true,
            export_id: summary.export_id,
            filename: summary.filename,
            products_exported: summary.exported_products,
        })
    }

    /// 导出历史（最新在前）
    pub fn list_exports(&self, store_id: Option<i64>, limit: Option<i64>) -> ApiResult<Vec<ExportArtifact>> {
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_EXPORT_LIST_LIMIT);
        Ok(self.export_repo.list(store_id, limit)?)
    }

    /// 查询单个导出作业
    pub fn get_export(&self, export_id: &str) -> ApiResult<ExportArtifact> {
        self.export_repo
            .find_by_id(export_id)?
            .ok_or_else(|| ApiError::NotFound(format!("导出作业(id={})不存在", export_id)))
    }

    /// 下载导出文件
    ///
    /// # 返回
    /// - Err(NotFound): 作业未完成 / 无文件路径 / 文件已不存在
    pub fn download_export(&self, export_id: &str) -> ApiResult<DownloadResponse> {
        let artifact = self.get_export(export_id)?;
        if !artifact.is_downloadable() {
            return Err(ApiError::NotFound(format!(
                "导出文件不可用(id={}, status={})",
                export_id, artifact.status
            )));
        }

        let path = Path::new(&artifact.file_path);
        if !path.is_file() {
            return Err(ApiError::NotFound(format!(
                "导出文件不存在: {}",
                artifact.file_path
            )));
        }
        let body = std::fs::read(path)
            .map_err(|e| ApiError::InternalError(format!("导出文件读取失败: {}", e)))?;

        Ok(DownloadResponse {
            content_type: "text/csv".to_string(),
            content_disposition: format!("attachment; filename=\"{}\"", artifact.filename),
            filename: artifact.filename,
            body,
        })
    }
}
