// ==========================================
// 代发货库存管理后端 - 商品导出器
// ==========================================
// 职责: 过滤商品 → 选择布局 → 写出 CSV → 导出作业落库
// 过滤: 店铺内、可选供应商、仅有效商品，created_at DESC / id DESC
// 约束: 构建或写出中的任何错误只在外层捕获一次，作业置为 failed
// ==========================================

use crate::clock::Clock;
use crate::config::PipelineConfigReader;
use crate::domain::job::{ExportArtifact, JobLifecycle};
use crate::domain::product::ProductFilter;
use crate::domain::types::ExportType;
use crate::exporter::error::ExportResult;
use crate::exporter::format_selector::ExportFormatSelector;
use crate::repository::{ExportArtifactRepository, ProductRepository};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// 导出目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    pub store_id: i64,
    pub store_name: String,
    pub vendor_id: Option<i64>,
}

/// 导出汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub export_id: String,
    pub export_type: ExportType,
    pub filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub total_products: usize,
    pub exported_products: usize,
    pub skipped_products: usize,
}

// ==========================================
// ProductExporter
// ==========================================
pub struct ProductExporter {
    product_repo: Arc<dyn ProductRepository>,
    export_repo: Arc<dyn ExportArtifactRepository>,
    config: Arc<dyn PipelineConfigReader>,
    clock: Arc<dyn Clock>,
}

impl ProductExporter {
    pub fn new(
        product_repo: Arc<dyn ProductRepository>,
        export_repo: Arc<dyn ExportArtifactRepository>,
        config: Arc<dyn PipelineConfigReader>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            product_repo,
            export_repo,
            config,
            clock,
        }
    }

    /// 执行一次导出
    ///
    /// # 参数
    /// - target: 店铺（含店铺名，用于文件名）与可选供应商
    /// - export_type: 已解析的导出类型
    ///
    /// # 返回
    /// - Ok(ExportSummary): 作业 completed
    /// - Err: 作业 failed，错误信息已写入作业记录
    #[instrument(skip(self), fields(export_id))]
    pub fn export(&self, target: &ExportTarget, export_type: ExportType) -> ExportResult<ExportSummary> {
        let mut artifact =
            ExportArtifact::new(target.store_id, target.vendor_id, export_type, self.clock.now());
        tracing::Span::current().record("export_id", artifact.export_id.as_str());
        self.export_repo.insert(&artifact)?;

        artifact.start(self.clock.now())?;
        self.export_repo.update(&artifact)?;
        info!(
            export_id = %artifact.export_id,
            store_id = target.store_id,
            vendor_id = ?target.vendor_id,
            export_type = %export_type,
            "开始导出"
        );

        let outcome = self.run_export(&mut artifact, target).and_then(|summary| {
            let mut completed = artifact.clone();
            completed.complete(self.clock.now())?;
            self.export_repo.update(&completed)?;
            Ok(summary)
        });

        match outcome {
            Ok(summary) => {
                info!(
                    export_id = %artifact.export_id,
                    filename = %summary.filename,
                    total = summary.total_products,
                    exported = summary.exported_products,
                    skipped = summary.skipped_products,
                    bytes = summary.file_size,
                    "导出完成"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(export_id = %artifact.export_id, error = %e, "导出失败");
                artifact.fail(self.clock.now(), e.to_string())?;
                if let Err(persist_err) = self.export_repo.update(&artifact) {
                    error!(export_id = %artifact.export_id, error = %persist_err, "失败状态落库失败");
                }
                Err(e)
            }
        }
    }

    fn run_export(
        &self,
        artifact: &mut ExportArtifact,
        target: &ExportTarget,
    ) -> ExportResult<ExportSummary> {
        let export_dir = PathBuf::from(self.config.get_export_dir()?);
        let selector = ExportFormatSelector::new(self.config.get_export_currency()?);

        let products = self
            .product_repo
            .list(&ProductFilter::for_export(target.store_id, target.vendor_id))?;
        let total = products.len();

        let rendered = selector.render(artifact.export_type, &products)?;
        let filename = ExportFormatSelector::filename(
            &target.store_name,
            artifact.export_type,
            self.clock.now(),
        );
        let written = ExportFormatSelector::write_file(&export_dir, &filename, &rendered.content)?;

        let exported = rendered.exported_rows;
        let skipped = total - exported;

        artifact.filename = filename.clone();
        artifact.file_path = written.path.display().to_string();
        artifact.file_size = written.size;
        artifact.total_products = total as i64;
        artifact.exported_products = exported as i64;
        artifact.skipped_products = skipped as i64;

        Ok(ExportSummary {
            export_id: artifact.export_id.clone(),
            export_type: artifact.export_type,
            filename,
            file_path: artifact.file_path.clone(),
            file_size: written.size,
            total_products: total,
            exported_products: exported,
            skipped_products: skipped,
        })
    }
}
