// ==========================================
// 代发货库存管理后端 - 应用层
// ==========================================
// 职责: 装配共享状态，供命令行入口使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
