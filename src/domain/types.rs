// ==========================================
// 代发货库存管理后端 - 领域类型定义
// ==========================================
// 作业状态 / 导出类型
// 序列化格式: 小写（与数据库、JSON 响应一致）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 作业状态 (Job Status)
// ==========================================
// Upload 与 ExportArtifact 共用
// 单调推进: pending → processing → {completed, failed}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,    // 已创建，未开始
    Processing, // 处理中
    Completed,  // 完成（可能含行级失败）
    Failed,     // 批次级失败
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl JobStatus {
    /// 从数据库字符串解析（未知值返回 None）
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(JobStatus::Pending),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// 是否终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// 状态迁移是否合法
    ///
    /// 合法迁移:
    /// - pending → processing
    /// - processing → completed / failed
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

// ==========================================
// 导出类型 (Export Type)
// ==========================================
// price: SKU + 价格 + 币种
// inventory: SKU + 数量
// full: 全字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportType {
    Price,
    Inventory,
    #[default]
    Full,
}

impl fmt::Display for ExportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ExportType {
    /// 转换为数据库存储的字符串（同时用于导出文件名）
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ExportType::Price => "price",
            ExportType::Inventory => "inventory",
            ExportType::Full => "full",
        }
    }
}

/// 未知导出类型
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("未知导出类型: {0}（应为 price/inventory/full）")]
pub struct UnknownExportType(pub String);

impl FromStr for ExportType {
    type Err = UnknownExportType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "price" => Ok(ExportType::Price),
            "inventory" => Ok(ExportType::Inventory),
            "full" => Ok(ExportType::Full),
            _ => Err(UnknownExportType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_transitions() {
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Processing));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Completed));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Failed));

        // 不可跳过 processing
        assert!(!JobStatus::Pending.can_transition_to(JobStatus::Completed));
        // 不可回退
        assert!(!JobStatus::Processing.can_transition_to(JobStatus::Pending));
        // 终态不可再迁移
        for next in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert!(!JobStatus::Completed.can_transition_to(next));
            assert!(!JobStatus::Failed.can_transition_to(next));
        }
    }

    #[test]
    fn test_job_status_db_round_trip() {
        assert_eq!(JobStatus::from_db_str("PROCESSING"), Some(JobStatus::Processing));
        assert_eq!(JobStatus::from_db_str("running"), None);
        assert_eq!(JobStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_export_type_parse() {
        assert_eq!("price".parse::<ExportType>(), Ok(ExportType::Price));
        assert_eq!(" Inventory ".parse::<ExportType>(), Ok(ExportType::Inventory));
        assert_eq!(ExportType::default(), ExportType::Full);
        assert!("xml".parse::<ExportType>().is_err());
    }

    #[test]
    fn test_export_type_serde_lowercase() {
        let json = serde_json::to_string(&ExportType::Inventory).unwrap();
        assert_eq!(json, "\"inventory\"");
    }
}
