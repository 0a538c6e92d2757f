// ==========================================
// 代发货库存管理后端 - 作业记录 Repository 实现
// ==========================================
// 职责: upload / export_artifact 表读写（使用 rusqlite）
// 约束: error_details 以 JSON 数组存储在 error_details_json
// ==========================================

use crate::db::{get_opt_timestamp, get_timestamp, to_db_timestamp};
use crate::domain::job::{ExportArtifact, Upload};
use crate::domain::types::{ExportType, JobStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::job_repo::{ExportArtifactRepository, UploadRepository};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

/// 行映射辅助：读取状态列
fn get_status(row: &Row<'_>, idx: usize) -> rusqlite::Result<JobStatus> {
    let raw: String = row.get(idx)?;
    JobStatus::from_db_str(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("未知作业状态: {}", raw).into(),
        )
    })
}

// ==========================================
// UploadRepositoryImpl
// ==========================================

const UPLOAD_COLUMNS: &str = r#"
    upload_id, vendor_id, store_id, filename, file_path, status,
    total_rows, processed_rows, successful_rows, failed_rows,
    error_message, error_details_json, started_at, completed_at, created_at, updated_at
"#;

fn map_upload_row(row: &Row<'_>) -> rusqlite::Result<Upload> {
    let details_json: String = row.get(11)?;
    let error_details: Vec<String> = serde_json::from_str(&details_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(11, Type::Text, Box::new(e)))?;

    Ok(Upload {
        upload_id: row.get(0)?,
        vendor_id: row.get(1)?,
        store_id: row.get(2)?,
        filename: row.get(3)?,
        file_path: row.get(4)?,
        status: get_status(row, 5)?,
        total_rows: row.get(6)?,
        processed_rows: row.get(7)?,
        successful_rows: row.get(8)?,
        failed_rows: row.get(9)?,
        error_message: row.get(10)?,
        error_details,
        started_at: get_opt_timestamp(row, 12)?,
        completed_at: get_opt_timestamp(row, 13)?,
        created_at: get_timestamp(row, 14)?,
        updated_at: get_timestamp(row, 15)?,
    })
}

pub struct UploadRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl UploadRepositoryImpl {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl UploadRepository for UploadRepositoryImpl {
    fn insert(&self, upload: &Upload) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO upload (
                upload_id, vendor_id, store_id, filename, file_path, status,
                total_rows, processed_rows, successful_rows, failed_rows,
                error_message, error_details_json, started_at, completed_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                upload.upload_id,
                upload.vendor_id,
                upload.store_id,
                upload.filename,
                upload.file_path,
                upload.status.to_db_str(),
                upload.total_rows,
                upload.processed_rows,
                upload.successful_rows,
                upload.failed_rows,
                upload.error_message,
                serde_json::to_string(&upload.error_details)?,
                upload.started_at.as_ref().map(to_db_timestamp),
                upload.completed_at.as_ref().map(to_db_timestamp),
                to_db_timestamp(&upload.created_at),
                to_db_timestamp(&upload.updated_at),
            ],
        )?;
        Ok(())
    }

    fn update(&self, upload: &Upload) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            r#"
            UPDATE upload SET
                file_path = ?1,
                status = ?2,
                total_rows = ?3,
                processed_rows = ?4,
                successful_rows = ?5,
                failed_rows = ?6,
                error_message = ?7,
                error_details_json = ?8,
                started_at = ?9,
                completed_at = ?10,
                updated_at = ?11
            WHERE upload_id = ?12
            "#,
            params![
                upload.file_path,
                upload.status.to_db_str(),
                upload.total_rows,
                upload.processed_rows,
                upload.successful_rows,
                upload.failed_rows,
                upload.error_message,
                serde_json::to_string(&upload.error_details)?,
                upload.started_at.as_ref().map(to_db_timestamp),
                upload.completed_at.as_ref().map(to_db_timestamp),
                to_db_timestamp(&upload.updated_at),
                upload.upload_id,
            ],
        )?;
        if changed == 0 {
            return Err(RepositoryError::not_found("Upload", &upload.upload_id));
        }
        Ok(())
    }

    fn find_by_id(&self, upload_id: &str) -> RepositoryResult<Option<Upload>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM upload WHERE upload_id = ?1", UPLOAD_COLUMNS);
        let upload = conn
            .query_row(&sql, params![upload_id], map_upload_row)
            .optional()?;
        Ok(upload)
    }

    fn list_page(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<Upload>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM upload ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2",
            UPLOAD_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let uploads = stmt
            .query_map(params![limit, offset], map_upload_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(uploads)
    }

    fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM upload", [], |row| row.get(0))?;
        Ok(n)
    }
}

// ==========================================
// ExportArtifactRepositoryImpl
// ==========================================

const EXPORT_COLUMNS: &str = r#"
    export_id, store_id, vendor_id, export_type, status, filename, file_path, file_size,
    total_products, exported_products, skipped_products, error_message,
    started_at, completed_at, created_at, updated_at
"#;

fn map_export_row(row: &Row<'_>) -> rusqlite::Result<ExportArtifact> {
    let raw_type: String = row.get(3)?;
    let export_type: ExportType = raw_type
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(ExportArtifact {
        export_id: row.get(0)?,
        store_id: row.get(1)?,
        vendor_id: row.get(2)?,
        export_type,
        status: get_status(row, 4)?,
        filename: row.get(5)?,
        file_path: row.get(6)?,
        file_size: row.get(7)?,
        total_products: row.get(8)?,
        exported_products: row.get(9)?,
        skipped_products: row.get(10)?,
        error_message: row.get(11)?,
        started_at: get_opt_timestamp(row, 12)?,
        completed_at: get_opt_timestamp(row, 13)?,
        created_at: get_timestamp(row, 14)?,
        updated_at: get_timestamp(row, 15)?,
    })
}

pub struct ExportArtifactRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ExportArtifactRepositoryImpl {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl ExportArtifactRepository for ExportArtifactRepositoryImpl {
    fn insert(&self, artifact: &ExportArtifact) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO export_artifact (
                export_id, store_id, vendor_id, export_type, status, filename, file_path, file_size,
                total_products, exported_products, skipped_products, error_message,
                started_at, completed_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                artifact.export_id,
                artifact.store_id,
                artifact.vendor_id,
                artifact.export_type.to_db_str(),
                artifact.status.to_db_str(),
                artifact.filename,
                artifact.file_path,
                artifact.file_size,
                artifact.total_products,
                artifact.exported_products,
                artifact.skipped_products,
                artifact.error_message,
                artifact.started_at.as_ref().map(to_db_timestamp),
                artifact.completed_at.as_ref().map(to_db_timestamp),
                to_db_timestamp(&artifact.created_at),
                to_db_timestamp(&artifact.updated_at),
            ],
        )?;
        Ok(())
    }

    fn update(&self, artifact: &ExportArtifact) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            r#"
            UPDATE export_artifact SET
                status = ?1,
                filename = ?2,
                file_path = ?3,
                file_size = ?4,
                total_products = ?5,
                exported_products = ?6,
                skipped_products = ?7,
                error_message = ?8,
                started_at = ?9,
                completed_at = ?10,
                updated_at = ?11
            WHERE export_id = ?12
            "#,
            params![
                artifact.status.to_db_str(),
                artifact.filename,
                artifact.file_path,
                artifact.file_size,
                artifact.total_products,
                artifact.exported_products,
                artifact.skipped_products,
                artifact.error_message,
                artifact.started_at.as_ref().map(to_db_timestamp),
                artifact.completed_at.as_ref().map(to_db_timestamp),
                to_db_timestamp(&artifact.updated_at),
                artifact.export_id,
            ],
        )?;
        if changed == 0 {
            return Err(RepositoryError::not_found("ExportArtifact", &artifact.export_id));
        }
        Ok(())
    }

    fn find_by_id(&self, export_id: &str) -> RepositoryResult<Option<ExportArtifact>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM export_artifact WHERE export_id = ?1",
            EXPORT_COLUMNS
        );
        let artifact = conn
            .query_row(&sql, params![export_id], map_export_row)
            .optional()?;
        Ok(artifact)
    }

    fn list(&self, store_id: Option<i64>, limit: i64) -> RepositoryResult<Vec<ExportArtifact>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM export_artifact
            WHERE (?1 IS NULL OR store_id = ?1)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
            EXPORT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let artifacts = stmt
            .query_map(params![store_id, limit], map_export_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artifacts)
    }
}
