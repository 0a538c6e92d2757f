// ==========================================
// 代发货库存管理后端 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分级:
// - 批次级（编码 / 表头 / 仓储）→ 作业 failed
// - 行级（RowFailure）→ 记入错误列表，批次继续
// ==========================================

use crate::domain::job::InvalidTransition;
use crate::repository::error::RepositoryError;
use std::fmt;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("文件编码错误: {0}（必须为 UTF-8）")]
    InvalidEncoding(String),

    #[error("CSV 缺少表头")]
    MissingHeader,

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 行校验错误 =====
    #[error("vendor_sku 不能为空")]
    EmptyVendorSku,

    #[error("字段 {field} 超长: {actual} 个字符（上限 {max}）")]
    FieldTooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    // ===== 仓储 / 状态错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

// ==========================================
// RowFailure - 行级失败
// ==========================================
// 显示格式固定为 "Row <行号>: <错误>"，直接写入作业错误列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub row_number: usize,
    pub message: String,
}

impl RowFailure {
    pub fn new(row_number: usize, err: impl fmt::Display) -> Self {
        Self {
            row_number,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row_number, self.message)
    }
}
