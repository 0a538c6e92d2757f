// ==========================================
// 代发货库存管理后端 - 配置层
// ==========================================
// 职责: 运行期配置读取 / 写入
// 存储: config_kv 表（scope_id = 'global'）
// ==========================================

pub mod config_manager;
pub mod pipeline_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, defaults, ConfigManager};
pub use pipeline_config_trait::PipelineConfigReader;
