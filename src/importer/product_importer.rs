// ==========================================
// 代发货库存管理后端 - 商品目录导入器
// ==========================================
// 职责: 整合导入流程，从上传内容到数据库
// 流程: 建作业 → 解析 → 映射 → 校验 → upsert → 汇总落库
// 约束:
// - 行级失败不中断批次，记为 "Row <行号>: <错误>"
// - 每行 upsert 独立提交，不包批次事务
// - 批次级错误只在外层捕获一次，作业置为 failed
// ==========================================

use crate::clock::Clock;
use crate::config::PipelineConfigReader;
use crate::domain::job::{JobLifecycle, Upload};
use crate::domain::product::{ProductUpsert, UpsertOutcome};
use crate::importer::error::{ImportResult, RowFailure};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::CsvParser;
use crate::importer::row_validator::RowValidator;
use crate::repository::{ProductRepository, UploadRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// 导入目标（供应商 / 店铺 / 店铺所属市场）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTarget {
    pub vendor_id: i64,
    pub store_id: i64,
    pub marketplace_id: i64,
}

/// 导入汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub upload_id: String,
    pub total_rows: usize,
    pub successful_rows: usize,
    pub failed_rows: usize,
    pub created_count: usize,
    pub updated_count: usize,
    pub error_details: Vec<String>, // 已按响应上限截断
}

/// 批次内部计数
#[derive(Debug, Default)]
struct BatchTally {
    created: usize,
    updated: usize,
    failures: Vec<RowFailure>,
}

// ==========================================
// ProductImporter
// ==========================================
pub struct ProductImporter {
    // 数据访问层
    product_repo: Arc<dyn ProductRepository>,
    upload_repo: Arc<dyn UploadRepository>,

    // 配置读取器
    config: Arc<dyn PipelineConfigReader>,

    clock: Arc<dyn Clock>,

    // 导入组件
    file_parser: CsvParser,
    field_mapper: FieldMapper,
    row_validator: RowValidator,
}

impl ProductImporter {
    pub fn new(
        product_repo: Arc<dyn ProductRepository>,
        upload_repo: Arc<dyn UploadRepository>,
        config: Arc<dyn PipelineConfigReader>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            product_repo,
            upload_repo,
            config,
            clock,
            file_parser: CsvParser,
            field_mapper: FieldMapper,
            row_validator: RowValidator,
        }
    }

    /// 导入一份供应商目录 CSV
    ///
    /// # 参数
    /// - target: 供应商 / 店铺 / 市场
    /// - filename: 上传文件名（仅记录）
    /// - content: 文件内容
    ///
    /// # 返回
    /// - Ok(ImportSummary): 作业 completed（可能含行级失败）
    /// - Err: 作业 failed，错误信息已写入作业记录
    #[instrument(skip(self, content), fields(upload_id, size = content.len()))]
    pub fn import(
        &self,
        target: &ImportTarget,
        filename: &str,
        content: &[u8],
    ) -> ImportResult<ImportSummary> {
        let mut upload = Upload::new(target.vendor_id, target.store_id, filename, self.clock.now());
        tracing::Span::current().record("upload_id", upload.upload_id.as_str());
        self.upload_repo.insert(&upload)?;

        upload.start(self.clock.now())?;
        self.upload_repo.update(&upload)?;
        info!(
            upload_id = %upload.upload_id,
            vendor_id = target.vendor_id,
            store_id = target.store_id,
            filename,
            "开始导入商品目录"
        );

        // 完成状态落库失败同样按批次失败处理，作业不会停留在 processing
        let outcome = self
            .run_batch(&mut upload, target, content)
            .and_then(|summary| {
                let mut completed = upload.clone();
                completed.complete(self.clock.now())?;
                self.upload_repo.update(&completed)?;
                Ok(summary)
            });

        match outcome {
            Ok(summary) => {
                info!(
                    upload_id = %upload.upload_id,
                    total = summary.total_rows,
                    success = summary.successful_rows,
                    failed = summary.failed_rows,
                    created = summary.created_count,
                    updated = summary.updated_count,
                    "商品目录导入完成"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(upload_id = %upload.upload_id, error = %e, "商品目录导入失败");
                upload.fail(self.clock.now(), e.to_string())?;
                if let Err(persist_err) = self.upload_repo.update(&upload) {
                    error!(upload_id = %upload.upload_id, error = %persist_err, "失败状态落库失败");
                }
                Err(e)
            }
        }
    }

    fn run_batch(
        &self,
        upload: &mut Upload,
        target: &ImportTarget,
        content: &[u8],
    ) -> ImportResult<ImportSummary> {
        let detail_limit = self.config.get_import_error_detail_limit()?;
        let store_limit = self.config.get_import_error_store_limit()?;

        // === 步骤 1: 解析文件 ===
        debug!("步骤 1: 解析 CSV");
        let parsed = self.file_parser.parse_bytes(content)?;
        let total_rows = parsed.total_rows();
        info!(total_rows, "CSV 解析完成");

        // === 步骤 2: 逐行映射 / 校验 / upsert ===
        debug!("步骤 2: 逐行 upsert");
        let mut tally = BatchTally::default();
        for parsed_row in parsed.rows {
            let result = parsed_row.and_then(|row| {
                let raw = self.field_mapper.map_to_raw_row(&row);
                self.row_validator
                    .validate(&raw)
                    .map_err(|e| RowFailure::new(raw.row_number, e))?;
                let upsert = ProductUpsert::from_row(
                    &raw,
                    target.vendor_id,
                    target.store_id,
                    target.marketplace_id,
                    Some(upload.upload_id.clone()),
                );
                self.product_repo
                    .upsert(&upsert, self.clock.now())
                    .map_err(|e| RowFailure::new(raw.row_number, e))
            });

            match result {
                Ok(UpsertOutcome::Created(_)) => tally.created += 1,
                Ok(UpsertOutcome::Updated(_)) => tally.updated += 1,
                Err(failure) => {
                    warn!(row_number = failure.row_number, error = %failure.message, "行导入失败");
                    tally.failures.push(failure);
                }
            }
        }

        // === 步骤 3: 汇总 ===
        let error_messages: Vec<String> = tally.failures.iter().map(|f| f.to_string()).collect();
        let successful_rows = tally.created + tally.updated;

        upload.total_rows = total_rows as i64;
        upload.processed_rows = total_rows as i64;
        upload.successful_rows = successful_rows as i64;
        upload.failed_rows = tally.failures.len() as i64;
        upload.error_details = error_messages.iter().take(store_limit).cloned().collect();

        Ok(ImportSummary {
            upload_id: upload.upload_id.clone(),
            total_rows,
            successful_rows,
            failed_rows: tally.failures.len(),
            created_count: tally.created,
            updated_count: tally.updated,
            error_details: error_messages.into_iter().take(detail_limit).collect(),
        })
    }
}
