// ==========================================
// 商品目录导入 - 集成测试
// ==========================================
// 覆盖: 幂等 upsert、行级失败编号、错误条数上限、批次级失败、作业状态
// ==========================================


#[path = "helpers/mock_config.rs"]
mod mock_config;

use dropship_inventory::api::{ApiError, ImportRequest};
use dropship_inventory::clock::FixedClock;
use dropship_inventory::db::open_in_memory;
use dropship_inventory::domain::job::Upload;
use dropship_inventory::domain::types::JobStatus;
use dropship_inventory::importer::{ImportError, ImportTarget, ProductImporter};
use dropship_inventory::repository::{
    ProductRepositoryImpl, RepositoryError, RepositoryResult, UploadRepository,
    UploadRepositoryImpl,
};
use mock_config::MockConfig;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use test_helpers::*;

fn only_upload(env: &TestEnv) -> Upload {
    let page = env.state.import_api.list_uploads(1, 20).unwrap();
    assert_eq!(page.total_count, 1);
    page.uploads.into_iter().next().unwrap()
}

#[test]
fn test_three_valid_rows_then_reimport_is_idempotent() {
    let env = create_test_env().unwrap();
    let seed = seed_catalog(&env).unwrap();
    let csv = catalog_csv(3);

    let first = import_csv(&env, &seed, &csv).unwrap();
    assert!(first.success);
    assert_eq!(first.created, 3);
    assert_eq!(first.errors, 0);
    assert!(first.error_details.is_empty());

    let second = import_csv(&env, &seed, &csv).unwrap();
    assert_eq!(second.created, 3);
    assert_eq!(second.errors, 0);
    assert_ne!(first.upload_id, second.upload_id);

    // 同一 (供应商, vendor_sku, 店铺) 只有一条
    assert_eq!(count_product_rows(&env).unwrap(), 3);

    let page = env.state.import_api.list_uploads(1, 20).unwrap();
    assert_eq!(page.total_count, 2);
    assert!(page.uploads.iter().all(|u| u.status == JobStatus::Completed));
}

#[test]
fn test_reimport_overwrites_mutable_fields_and_batch() {
    let env = create_test_env().unwrap();
    let seed = seed_catalog(&env).unwrap();

    let first = import_csv(&env, &seed, "vendor_sku,marketplace_child_sku,title\nA-1,M-1,Old title\n").unwrap();
    let second = import_csv(&env, &seed, "vendor_sku,marketplace_child_sku,title\nA-1,M-9,New title\n").unwrap();
    assert_ne!(first.upload_id, second.upload_id);

    let id = product_id_by_sku(&env, "A-1").unwrap();
    let product = env.state.product_api.get_product(id).unwrap();
    assert_eq!(product.title, "New title");
    assert_eq!(product.marketplace_child_sku, "M-9");
    assert_eq!(product.upload_id.as_deref(), Some(second.upload_id.as_str()));
    assert_eq!(count_product_rows(&env).unwrap(), 1);
}

#[test]
fn test_malformed_row_is_tagged_with_file_line() {
    let env = create_test_env().unwrap();
    let seed = seed_catalog(&env).unwrap();

    // 第 2 条数据行缺少 vendor_sku → 文件第 3 行
    let csv = "vendor_sku,marketplace_child_sku,title\n\
               A-1,M-1,First\n\
               ,M-2,Second\n\
               A-3,M-3,Third\n\
               A-4,M-4,Fourth\n";
    let response = import_csv(&env, &seed, csv).unwrap();

    assert!(response.success);
    assert_eq!(response.created, 3);
    assert_eq!(response.errors, 1);
    assert_eq!(response.error_details.len(), 1);
    assert!(
        response.error_details[0].starts_with("Row 3:"),
        "unexpected detail: {}",
        response.error_details[0]
    );

    let upload = only_upload(&env);
    assert_eq!(upload.status, JobStatus::Completed);
    assert_eq!(upload.total_rows, 4);
    assert_eq!(upload.processed_rows, 4);
    assert_eq!(upload.successful_rows, 3);
    assert_eq!(upload.failed_rows, 1);
    assert_eq!(upload.error_details, response.error_details);
    assert!(upload.started_at.is_some());
    assert!(upload.completed_at.is_some());
}

#[test]
fn test_error_details_capped_in_response_but_kept_on_job() {
    let env = create_test_env().unwrap();
    let seed = seed_catalog(&env).unwrap();

    let mut csv = String::from("vendor_sku,title\n");
    for i in 0..15 {
        csv.push_str(&format!(",Missing sku {}\n", i));
    }
    let response = import_csv(&env, &seed, &csv).unwrap();

    assert_eq!(response.created, 0);
    assert_eq!(response.errors, 15);
    assert_eq!(response.error_details.len(), 10);
    assert_eq!(response.error_details[0], "Row 2: vendor_sku 不能为空");
    assert!(response.error_details[9].starts_with("Row 11:"));

    let upload = only_upload(&env);
    assert_eq!(upload.status, JobStatus::Completed);
    assert_eq!(upload.error_details.len(), 15);
}

#[test]
fn test_separator_only_line_counts_as_failed_row() {
    let env = create_test_env().unwrap();
    let seed = seed_catalog(&env).unwrap();

    // 文件第 3 行只有分隔符，第 5 行缺少 vendor_sku
    let csv = "vendor_sku,marketplace_child_sku,title\n\
               A-1,M-1,First\n\
               ,,\n\
               A-3,M-3,Third\n\
               ,M-4,Fourth\n";
    let response = import_csv(&env, &seed, csv).unwrap();

    assert_eq!(response.created, 2);
    assert_eq!(response.errors, 2);
    assert_eq!(
        response.error_details,
        vec![
            "Row 3: vendor_sku 不能为空".to_string(),
            "Row 5: vendor_sku 不能为空".to_string(),
        ]
    );

    let upload = only_upload(&env);
    assert_eq!(upload.total_rows, 4);
    assert_eq!(upload.failed_rows, 2);
}

#[test]
fn test_field_too_long_is_row_failure() {
    let env = create_test_env().unwrap();
    let seed = seed_catalog(&env).unwrap();

    let csv = format!(
        "vendor_sku,title\nA-1,ok\nA-2,{}\n",
        "t".repeat(501)
    );
    let response = import_csv(&env, &seed, &csv).unwrap();
    assert_eq!(response.created, 1);
    assert_eq!(response.errors, 1);
    assert!(response.error_details[0].starts_with("Row 3:"));
    assert!(response.error_details[0].contains("title"));
}

#[test]
fn test_headers_are_case_insensitive_and_bom_stripped() {
    let env = create_test_env().unwrap();
    let seed = seed_catalog(&env).unwrap();

    let csv = "\u{feff}Vendor_SKU, Title ,SOURCE_URL,extra\n  A-1  ,  Mug  ,https://x.example/a,ignored\n\n";
    let response = import_csv(&env, &seed, csv).unwrap();
    assert_eq!(response.created, 1);
    assert_eq!(response.errors, 0);

    let product = env
        .state
        .product_api
        .get_product(product_id_by_sku(&env, "A-1").unwrap())
        .unwrap();
    assert_eq!(product.title, "Mug");
    assert_eq!(product.source_url, "https://x.example/a");
    assert_eq!(product.marketplace_child_sku, "");
    assert_eq!(product.marketplace_id, seed.marketplace_id);
}

#[test]
fn test_invalid_utf8_record_fails_only_that_row() {
    let env = create_test_env().unwrap();
    let seed = seed_catalog(&env).unwrap();

    let mut content = b"vendor_sku,title\nA-1,Good\nA-2,".to_vec();
    content.extend_from_slice(&[0xff, 0xfe]);
    content.extend_from_slice(b"\nA-3,Also good\n");

    let response = env
        .state
        .import_api
        .import_products(&ImportRequest {
            vendor_id: seed.vendor_id,
            store_id: seed.store_id,
            filename: "mixed.csv".to_string(),
            content,
        })
        .unwrap();
    assert_eq!(response.created, 2);
    assert_eq!(response.errors, 1);
    assert!(response.error_details[0].starts_with("Row 3:"));
}

#[test]
fn test_non_utf8_header_fails_whole_batch() {
    let env = create_test_env().unwrap();
    let seed = seed_catalog(&env).unwrap();

    let mut content = vec![0xff, 0xfe, 0x00];
    content.extend_from_slice(b",title\nA-1,Mug\n");
    let err = env
        .state
        .import_api
        .import_products(&ImportRequest {
            vendor_id: seed.vendor_id,
            store_id: seed.store_id,
            filename: "latin1.csv".to_string(),
            content,
        })
        .unwrap_err();

    assert!(matches!(err, ApiError::ImportError(_)), "got {:?}", err);
    let failure = err.to_failure();
    assert!(!failure.success);
    assert!(failure.error.contains("UTF-8"));

    let upload = only_upload(&env);
    assert_eq!(upload.status, JobStatus::Failed);
    assert!(!upload.error_message.is_empty());
    assert!(upload.completed_at.is_some());
    assert_eq!(count_product_rows(&env).unwrap(), 0);
}

#[test]
fn test_empty_file_fails_batch() {
    let env = create_test_env().unwrap();
    let seed = seed_catalog(&env).unwrap();

    let err = import_csv(&env, &seed, "").unwrap_err();
    assert!(err.to_string().contains("表头"));
    assert_eq!(only_upload(&env).status, JobStatus::Failed);
}

#[test]
fn test_unknown_vendor_or_store_creates_no_upload() {
    let env = create_test_env().unwrap();
    let seed = seed_catalog(&env).unwrap();

    let request = ImportRequest {
        vendor_id: 999,
        store_id: seed.store_id,
        filename: "catalog.csv".to_string(),
        content: catalog_csv(1).into_bytes(),
    };
    assert!(matches!(
        env.state.import_api.import_products(&request),
        Err(ApiError::NotFound(_))
    ));

    let request = ImportRequest {
        vendor_id: seed.vendor_id,
        store_id: 999,
        ..request
    };
    assert!(matches!(
        env.state.import_api.import_products(&request),
        Err(ApiError::NotFound(_))
    ));

    assert_eq!(env.state.import_api.list_uploads(1, 20).unwrap().total_count, 0);
}

#[test]
fn test_upload_history_pagination() {
    let env = create_test_env().unwrap();
    let seed = seed_catalog(&env).unwrap();
    for _ in 0..5 {
        import_csv(&env, &seed, &catalog_csv(1)).unwrap();
    }

    let page1 = env.state.import_api.list_uploads(1, 2).unwrap();
    assert_eq!(page1.total_count, 5);
    assert_eq!(page1.total_pages, 3);
    assert_eq!(page1.uploads.len(), 2);
    assert!(page1.has_next);
    assert!(!page1.has_prev);

    let page3 = env.state.import_api.list_uploads(3, 2).unwrap();
    assert_eq!(page3.uploads.len(), 1);
    assert!(!page3.has_next);
    assert!(page3.has_prev);

    // 超出末页取末页
    let beyond = env.state.import_api.list_uploads(9, 2).unwrap();
    assert_eq!(beyond.page, 3);
    assert_eq!(beyond.uploads.len(), 1);
    assert_eq!(beyond.uploads[0].upload_id, page3.uploads[0].upload_id);
    assert!(!beyond.has_next);

    let id = page3.uploads[0].upload_id.clone();
    assert_eq!(env.state.import_api.get_upload(&id).unwrap().upload_id, id);
    assert!(matches!(
        env.state.import_api.get_upload("missing"),
        Err(ApiError::NotFound(_))
    ));
}

// ==========================================
// 直接装配导入器（Mock 配置）
// ==========================================

/// 内存库 + 一组最小目录数据（vendor / marketplace / store 的 id 均为 1）
fn seeded_memory_conn() -> Arc<Mutex<Connection>> {
    let conn = open_in_memory().unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO vendor (id, name, code, is_active, created_at, updated_at)
            VALUES (1, 'V', 'V', 1, '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z');
        INSERT INTO marketplace (id, code, name, is_active, created_at, updated_at)
            VALUES (1, 'M', 'M', 1, '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z');
        INSERT INTO store (id, marketplace_id, name, scraping_enabled, scraping_interval_hours,
                           price_update_enabled, is_active, created_at, updated_at)
            VALUES (1, 1, 'S', 0, 24, 0, 1, '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z');
        "#,
    )
    .unwrap();
    Arc::new(Mutex::new(conn))
}

fn memory_target() -> ImportTarget {
    ImportTarget {
        vendor_id: 1,
        store_id: 1,
        marketplace_id: 1,
    }
}

#[test]
fn test_importer_honours_configured_error_limits() {
    let conn = seeded_memory_conn();
    let upload_repo = Arc::new(UploadRepositoryImpl::new(conn.clone()));
    let importer = ProductImporter::new(
        Arc::new(ProductRepositoryImpl::new(conn.clone())),
        upload_repo.clone(),
        Arc::new(MockConfig::with_error_limits("unused", 2, 3)),
        Arc::new(FixedClock(fixed_time())),
    );

    let csv = "vendor_sku,title\n,a\n,b\n,c\n,d\nOK-1,e\n";
    let summary = importer
        .import(&memory_target(), "limits.csv", csv.as_bytes())
        .unwrap();

    assert_eq!(summary.total_rows, 5);
    assert_eq!(summary.failed_rows, 4);
    assert_eq!(summary.successful_rows, 1);
    assert_eq!(summary.created_count, 1);
    assert_eq!(summary.updated_count, 0);
    assert_eq!(summary.error_details.len(), 2);

    let upload = upload_repo.find_by_id(&summary.upload_id).unwrap().unwrap();
    assert_eq!(upload.error_details.len(), 3);
    assert_eq!(upload.failed_rows, 4);
}

#[test]
fn test_importer_marks_job_failed_on_missing_header() {
    let conn = seeded_memory_conn();
    let upload_repo = Arc::new(UploadRepositoryImpl::new(conn.clone()));
    let importer = ProductImporter::new(
        Arc::new(ProductRepositoryImpl::new(conn.clone())),
        upload_repo.clone(),
        Arc::new(MockConfig::new("unused")),
        Arc::new(FixedClock(fixed_time())),
    );

    let result = importer.import(&memory_target(), "empty.csv", b"");
    assert!(matches!(result, Err(ImportError::MissingHeader)));

    let uploads = upload_repo.list_page(10, 0).unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].status, JobStatus::Failed);
    assert_eq!(uploads[0].error_message, "CSV 缺少表头");
}

/// 拒绝写入 completed 状态的作业仓储（其余操作透传）
struct RejectCompletionRepo {
    inner: UploadRepositoryImpl,
}

impl UploadRepository for RejectCompletionRepo {
    fn insert(&self, upload: &Upload) -> RepositoryResult<()> {
        self.inner.insert(upload)
    }

    fn update(&self, upload: &Upload) -> RepositoryResult<()> {
        if upload.status == JobStatus::Completed {
            return Err(RepositoryError::DatabaseQueryError("disk I/O error".to_string()));
        }
        self.inner.update(upload)
    }

    fn find_by_id(&self, upload_id: &str) -> RepositoryResult<Option<Upload>> {
        self.inner.find_by_id(upload_id)
    }

    fn list_page(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<Upload>> {
        self.inner.list_page(limit, offset)
    }

    fn count(&self) -> RepositoryResult<i64> {
        self.inner.count()
    }
}

#[test]
fn test_completion_write_failure_marks_job_failed() {
    let conn = seeded_memory_conn();
    let upload_repo = Arc::new(RejectCompletionRepo {
        inner: UploadRepositoryImpl::new(conn.clone()),
    });
    let importer = ProductImporter::new(
        Arc::new(ProductRepositoryImpl::new(conn.clone())),
        upload_repo.clone(),
        Arc::new(MockConfig::new("unused")),
        Arc::new(FixedClock(fixed_time())),
    );

    let result = importer.import(&memory_target(), "ok.csv", b"vendor_sku\nA-1\n");
    assert!(matches!(result, Err(ImportError::Repository(_))));

    let uploads = upload_repo.list_page(10, 0).unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].status, JobStatus::Failed);
    assert!(uploads[0].error_message.contains("disk I/O error"));
    assert!(uploads[0].completed_at.is_some());
    assert_eq!(uploads[0].total_rows, 1);
}
