// ==========================================
// 代发货库存管理后端 - 导出模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束: 生成 / 写出阶段的任何错误都是批次级（作业 failed）
// ==========================================

use crate::domain::job::InvalidTransition;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导出模块错误类型
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV 生成失败: {0}")]
    CsvWriteError(String),

    #[error("导出目录创建失败 ({path}): {message}")]
    DirectoryCreateError { path: String, message: String },

    #[error("导出文件写入失败 ({path}): {message}")]
    FileWriteError { path: String, message: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

// 实现 From<csv::Error>
impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::CsvWriteError(err.to_string())
    }
}

/// Result 类型别名
pub type ExportResult<T> = Result<T, ExportError>;
