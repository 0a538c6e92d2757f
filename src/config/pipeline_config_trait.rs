// ==========================================
// 代发货库存管理后端 - 流水线配置读取 Trait
// ==========================================
// 职责: 定义导入 / 导出流水线所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::error::RepositoryResult;

// ==========================================
// PipelineConfigReader Trait
// ==========================================
// 用途: 导入 / 导出模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait PipelineConfigReader: Send + Sync {
    // ===== 导出配置 =====

    /// 获取导出文件目录
    ///
    /// # 默认值
    /// - media/exports
    ///
    /// # 用途
    /// - 目录不存在时由导出流程创建
    fn get_export_dir(&self) -> RepositoryResult<String>;

    /// 获取价格导出的币种
    ///
    /// # 默认值
    /// - AUD
    fn get_export_currency(&self) -> RepositoryResult<String>;

    // ===== 导入配置 =====

    /// 获取响应中返回的行级错误条数上限
    ///
    /// # 默认值
    /// - 10
    fn get_import_error_detail_limit(&self) -> RepositoryResult<usize>;

    /// 获取作业记录中保存的行级错误条数上限
    ///
    /// # 默认值
    /// - 1000
    ///
    /// # 用途
    /// - 防止超大文件把整个错误列表写进 upload 表
    fn get_import_error_store_limit(&self) -> RepositoryResult<usize>;
}
