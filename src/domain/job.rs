// ==========================================
// 代发货库存管理后端 - 作业记录
// ==========================================
// Upload: 一次 CSV 导入
// ExportArtifact: 一次 CSV 导出（含生成文件信息）
// 两者共用同一状态机（JobLifecycle）
// ==========================================

use crate::domain::types::{ExportType, JobStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// 非法状态迁移
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("无效的状态转换: from={from} to={to}")]
pub struct InvalidTransition {
    pub from: JobStatus,
    pub to: JobStatus,
}

// ==========================================
// JobLifecycle - 作业状态机
// ==========================================
// pending → processing（记录 started_at）
// processing → completed（记录 completed_at）
// processing → failed（记录 completed_at + error_message）
pub trait JobLifecycle {
    fn status(&self) -> JobStatus;
    fn set_status(&mut self, status: JobStatus);
    fn set_started_at(&mut self, at: DateTime<Utc>);
    fn set_completed_at(&mut self, at: DateTime<Utc>);
    fn set_error_message(&mut self, message: String);
    fn touch(&mut self, at: DateTime<Utc>);

    fn transition(&mut self, next: JobStatus, at: DateTime<Utc>) -> Result<(), InvalidTransition> {
        let current = self.status();
        if !current.can_transition_to(next) {
            return Err(InvalidTransition {
                from: current,
                to: next,
            });
        }
        self.set_status(next);
        self.touch(at);
        Ok(())
    }

    /// 开始处理
    fn start(&mut self, at: DateTime<Utc>) -> Result<(), InvalidTransition> {
        self.transition(JobStatus::Processing, at)?;
        self.set_started_at(at);
        Ok(())
    }

    /// 正常完成（行级失败不影响）
    fn complete(&mut self, at: DateTime<Utc>) -> Result<(), InvalidTransition> {
        self.transition(JobStatus::Completed, at)?;
        self.set_completed_at(at);
        Ok(())
    }

    /// 批次级失败
    fn fail(&mut self, at: DateTime<Utc>, message: String) -> Result<(), InvalidTransition> {
        self.transition(JobStatus::Failed, at)?;
        self.set_completed_at(at);
        self.set_error_message(message);
        Ok(())
    }
}

// ==========================================
// Upload - 导入作业
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upload {
    pub upload_id: String,
    pub vendor_id: i64,
    pub store_id: i64,
    pub filename: String,
    pub file_path: Option<String>,
    pub status: JobStatus,
    pub total_rows: i64,
    pub processed_rows: i64,
    pub successful_rows: i64,
    pub failed_rows: i64,
    pub error_message: String,
    pub error_details: Vec<String>, // 行级错误（有上限）
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Upload {
    /// 新建 pending 状态的导入作业
    pub fn new(vendor_id: i64, store_id: i64, filename: &str, now: DateTime<Utc>) -> Self {
        Self {
            upload_id: Uuid::new_v4().to_string(),
            vendor_id,
            store_id,
            filename: filename.to_string(),
            file_path: None,
            status: JobStatus::Pending,
            total_rows: 0,
            processed_rows: 0,
            successful_rows: 0,
            failed_rows: 0,
            error_message: String::new(),
            error_details: Vec::new(),
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl JobLifecycle for Upload {
    fn status(&self) -> JobStatus {
        self.status
    }
    fn set_status(&mut self, status: JobStatus) {
        self.status = status;
    }
    fn set_started_at(&mut self, at: DateTime<Utc>) {
        self.started_at = Some(at);
    }
    fn set_completed_at(&mut self, at: DateTime<Utc>) {
        self.completed_at = Some(at);
    }
    fn set_error_message(&mut self, message: String) {
        self.error_message = message;
    }
    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

// ==========================================
// ExportArtifact - 导出作业
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub export_id: String,
    pub store_id: i64,
    pub vendor_id: Option<i64>,
    pub export_type: ExportType,
    pub status: JobStatus,
    pub filename: String,
    pub file_path: String,
    pub file_size: i64, // 字节
    pub total_products: i64,
    pub exported_products: i64,
    pub skipped_products: i64,
    pub error_message: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExportArtifact {
    /// 新建 pending 状态的导出作业
    pub fn new(
        store_id: i64,
        vendor_id: Option<i64>,
        export_type: ExportType,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            export_id: Uuid::new_v4().to_string(),
            store_id,
            vendor_id,
            export_type,
            status: JobStatus::Pending,
            filename: String::new(),
            file_path: String::new(),
            file_size: 0,
            total_products: 0,
            exported_products: 0,
            skipped_products: 0,
            error_message: String::new(),
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 是否可下载（已完成且有文件路径）
    pub fn is_downloadable(&self) -> bool {
        self.status == JobStatus::Completed && !self.file_path.is_empty()
    }
}

impl JobLifecycle for ExportArtifact {
    fn status(&self) -> JobStatus {
        self.status
    }
    fn set_status(&mut self, status: JobStatus) {
        self.status = status;
    }
    fn set_started_at(&mut self, at: DateTime<Utc>) {
        self.started_at = Some(at);
    }
    fn set_completed_at(&mut self, at: DateTime<Utc>) {
        self.completed_at = Some(at);
    }
    fn set_error_message(&mut self, message: String) {
        self.error_message = message;
    }
    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}
