// ==========================================
// 代发货库存管理后端 - 作业记录 Repository Trait
// ==========================================
// 职责: 定义导入作业 / 导出作业的数据访问接口
// 红线: 状态迁移规则在领域层（JobLifecycle），此处只做持久化
// ==========================================

use crate::domain::job::{ExportArtifact, Upload};
use crate::repository::error::RepositoryResult;

// ==========================================
// UploadRepository Trait
// ==========================================
// 实现者: UploadRepositoryImpl（使用 rusqlite）
pub trait UploadRepository: Send + Sync {
    /// 插入新建的导入作业
    fn insert(&self, upload: &Upload) -> RepositoryResult<()>;

    /// 持久化作业当前状态（状态 / 计数 / 错误 / 时间戳）
    ///
    /// # 返回
    /// - Err(NotFound): 作业不存在
    fn update(&self, upload: &Upload) -> RepositoryResult<()>;

    /// 按 ID 查询
    fn find_by_id(&self, upload_id: &str) -> RepositoryResult<Option<Upload>>;

    /// 分页查询（created_at DESC）
    fn list_page(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<Upload>>;

    /// 总数
    fn count(&self) -> RepositoryResult<i64>;
}

// ==========================================
// ExportArtifactRepository Trait
// ==========================================
// 实现者: ExportArtifactRepositoryImpl（使用 rusqlite）
pub trait ExportArtifactRepository: Send + Sync {
    /// 插入新建的导出作业
    fn insert(&self, artifact: &ExportArtifact) -> RepositoryResult<()>;

    /// 持久化作业当前状态
    ///
    /// # 返回
    /// - Err(NotFound): 作业不存在
    fn update(&self, artifact: &ExportArtifact) -> RepositoryResult<()>;

    /// 按 ID 查询
    fn find_by_id(&self, export_id: &str) -> RepositoryResult<Option<ExportArtifact>>;

    /// 查询导出历史（可选店铺过滤，created_at DESC）
    fn list(&self, store_id: Option<i64>, limit: i64) -> RepositoryResult<Vec<ExportArtifact>>;
}
