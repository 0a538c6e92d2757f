// ==========================================
// 代发货库存管理后端 - 应用状态
// ==========================================
// 职责: 打开数据库、装配仓储 / 流水线 / API 实例
// 所有仓储共享同一连接 Arc<Mutex<Connection>>
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::api::{CatalogApi, DashboardApi, ExportApi, ImportApi, ProductApi};
use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigManager, PipelineConfigReader};
use crate::db::{init_schema, open_sqlite_connection};
use crate::exporter::ProductExporter;
use crate::importer::ProductImporter;
use crate::repository::{
    ExportArtifactRepository, ExportArtifactRepositoryImpl, MarketplaceRepository,
    ProductRepository, ProductRepositoryImpl, StorePriceSettingsRepository, StoreRepository,
    UploadRepository, UploadRepositoryImpl, VendorRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 目录管理API
    pub catalog_api: Arc<CatalogApi>,

    /// 商品管理API
    pub product_api: Arc<ProductApi>,

    /// 目录导入API
    pub import_api: Arc<ImportApi>,

    /// 市场导出API
    pub export_api: Arc<ExportApi>,

    /// 仪表盘API
    pub dashboard_api: Arc<DashboardApi>,

    /// 配置管理器（命令行 config 子命令使用）
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在则创建并建表）
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;

        let mut state = Self::from_connection(
            Arc::new(Mutex::new(conn)),
            Arc::new(SystemClock),
        )?;
        state.db_path = db_path;
        Ok(state)
    }

    /// 基于已建表的连接装配（测试注入固定时钟）
    pub fn from_connection(
        conn: Arc<Mutex<Connection>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, String> {
        // ==========================================
        // 初始化Repository层
        // ==========================================
        let vendor_repo = Arc::new(VendorRepository::new(conn.clone()));
        let marketplace_repo = Arc::new(MarketplaceRepository::new(conn.clone()));
        let store_repo = Arc::new(StoreRepository::new(conn.clone()));
        let price_settings_repo = Arc::new(StorePriceSettingsRepository::new(conn.clone()));
        let product_repo: Arc<dyn ProductRepository> =
            Arc::new(ProductRepositoryImpl::new(conn.clone()));
        let upload_repo: Arc<dyn UploadRepository> =
            Arc::new(UploadRepositoryImpl::new(conn.clone()));
        let export_repo: Arc<dyn ExportArtifactRepository> =
            Arc::new(ExportArtifactRepositoryImpl::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let pipeline_config: Arc<dyn PipelineConfigReader> = config_manager.clone();

        // ==========================================
        // 初始化流水线
        // ==========================================
        let importer = Arc::new(ProductImporter::new(
            product_repo.clone(),
            upload_repo.clone(),
            pipeline_config.clone(),
            clock.clone(),
        ));
        let exporter = Arc::new(ProductExporter::new(
            product_repo.clone(),
            export_repo.clone(),
            pipeline_config,
            clock.clone(),
        ));

        // ==========================================
        // 初始化API层
        // ==========================================
        let catalog_api = Arc::new(CatalogApi::new(
            vendor_repo.clone(),
            marketplace_repo.clone(),
            store_repo.clone(),
            price_settings_repo,
            clock.clone(),
        ));
        let product_api = Arc::new(ProductApi::new(
            product_repo.clone(),
            vendor_repo.clone(),
            store_repo.clone(),
            clock,
        ));
        let import_api = Arc::new(ImportApi::new(
            vendor_repo.clone(),
            store_repo.clone(),
            upload_repo,
            importer,
        ));
        let export_api = Arc::new(ExportApi::new(
            store_repo.clone(),
            vendor_repo.clone(),
            export_repo,
            exporter,
        ));
        let dashboard_api = Arc::new(DashboardApi::new(
            vendor_repo,
            marketplace_repo,
            store_repo,
            product_repo,
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path: String::new(),
            catalog_api,
            product_api,
            import_api,
            export_api,
            dashboard_api,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 DROPSHIP_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("DROPSHIP_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./dropship_inventory.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("dropship-inventory");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("dropship_inventory.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::db::open_in_memory;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_state_wires_apis() {
        let conn = Arc::new(Mutex::new(open_in_memory().unwrap()));
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()));
        let state = AppState::from_connection(conn, clock).unwrap();

        assert_eq!(state.dashboard_api.health().status, "healthy");
        let summary = state.dashboard_api.summary().unwrap();
        assert_eq!(summary.vendors, 0);
        assert_eq!(summary.products, 0);
    }
}
