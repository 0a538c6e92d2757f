// ==========================================
// 代发货库存管理后端 - 导出格式选择器
// ==========================================
// 职责:
// - 导出类型 → 行编码器
// - 组装 CSV 文本（UTF-8，逗号分隔，\n 行尾，总是含表头）
// - 生成文件名 <店铺名>_<类型>_<UTC YYYYMMDD_HHMMSS>.csv
// - 写出文件（目录不存在则创建），记录字节数
// ==========================================

use crate::domain::product::Product;
use crate::domain::types::ExportType;
use crate::exporter::error::{ExportError, ExportResult};
use crate::exporter::row_encoder::{FullEncoder, InventoryEncoder, PriceEncoder, RowEncoder};
use chrono::{DateTime, Utc};
use csv::{Terminator, WriterBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 组装好的 CSV 内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCsv {
    pub content: Vec<u8>,
    pub exported_rows: usize,
}

/// 已写出的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub size: i64,
}

pub struct ExportFormatSelector {
    currency: String,
}

impl ExportFormatSelector {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    /// 选择行编码器
    pub fn encoder_for(&self, export_type: ExportType) -> Box<dyn RowEncoder> {
        match export_type {
            ExportType::Price => Box::new(PriceEncoder {
                currency: self.currency.clone(),
            }),
            ExportType::Inventory => Box::new(InventoryEncoder),
            ExportType::Full => Box::new(FullEncoder),
        }
    }

    /// 组装 CSV
    ///
    /// # 返回
    /// - RenderedCsv: 内容 + 实际输出的数据行数（不含表头）
    pub fn render(&self, export_type: ExportType, products: &[Product]) -> ExportResult<RenderedCsv> {
        let encoder = self.encoder_for(export_type);

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(vec![]);

        writer.write_record(encoder.header())?;
        let mut exported_rows = 0;
        for product in products {
            if let Some(record) = encoder.encode(product) {
                writer.write_record(&record)?;
                exported_rows += 1;
            }
        }

        let content = writer
            .into_inner()
            .map_err(|e| ExportError::CsvWriteError(e.to_string()))?;
        debug!(export_type = %export_type, exported_rows, bytes = content.len(), "CSV 组装完成");

        Ok(RenderedCsv {
            content,
            exported_rows,
        })
    }

    /// 生成导出文件名（店铺名中的路径分隔符替换为 _）
    pub fn filename(store_name: &str, export_type: ExportType, at: DateTime<Utc>) -> String {
        let safe_store: String = store_name
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        format!(
            "{}_{}_{}.csv",
            safe_store,
            export_type.to_db_str(),
            at.format("%Y%m%d_%H%M%S")
        )
    }

    /// 写出文件（目录不存在则创建）
    pub fn write_file(dir: &Path, filename: &str, content: &[u8]) -> ExportResult<WrittenFile> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| ExportError::DirectoryCreateError {
                path: dir.display().to_string(),
                message: e.to_string(),
            })?;
        }

        let path = dir.join(filename);
        fs::write(&path, content).map_err(|e| ExportError::FileWriteError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(WrittenFile {
            path,
            size: content.len() as i64,
        })
    }
}
