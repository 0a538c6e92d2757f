// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

#![allow(dead_code)]

use dropship_inventory::config::PipelineConfigReader;
use dropship_inventory::repository::RepositoryResult;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub export_dir: String,
    pub export_currency: String,
    pub error_detail_limit: usize,
    pub error_store_limit: usize,
}

impl MockConfig {
    /// 创建默认配置
    pub fn new(export_dir: &str) -> Self {
        Self {
            export_dir: export_dir.to_string(),
            export_currency: "AUD".to_string(),
            error_detail_limit: 10,
            error_store_limit: 1000,
        }
    }

    /// 自定义错误条数上限
    pub fn with_error_limits(export_dir: &str, detail: usize, store: usize) -> Self {
        let mut config = Self::new(export_dir);
        config.error_detail_limit = detail;
        config.error_store_limit = store;
        config
    }

    /// 自定义币种
    pub fn with_currency(export_dir: &str, currency: &str) -> Self {
        let mut config = Self::new(export_dir);
        config.export_currency = currency.to_string();
        config
    }
}

impl PipelineConfigReader for MockConfig {
    fn get_export_dir(&self) -> RepositoryResult<String> {
        Ok(self.export_dir.clone())
    }

    fn get_export_currency(&self) -> RepositoryResult<String> {
        Ok(self.export_currency.clone())
    }

    fn get_import_error_detail_limit(&self) -> RepositoryResult<usize> {
        Ok(self.error_detail_limit)
    }

    fn get_import_error_store_limit(&self) -> RepositoryResult<usize> {
        Ok(self.error_store_limit)
    }
}
