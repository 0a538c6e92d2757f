// ==========================================
// 目录管理 API - 集成测试
// ==========================================


use dropship_inventory::api::ApiError;
use dropship_inventory::domain::catalog::{NewStore, PriceSettingsInput, StorePatch, VendorPatch};
use test_helpers::*;

#[test]
fn test_vendor_lifecycle() {
    let env = create_test_env().unwrap();
    let api = &env.state.catalog_api;

    let vendor = api.create_vendor("  Acme Supply ", "ACME").unwrap();
    assert_eq!(vendor.name, "Acme Supply");
    assert!(vendor.is_active);
    assert_eq!(vendor.created_at, fixed_time());

    let updated = api
        .update_vendor(
            vendor.id,
            &VendorPatch {
                name: Some("Acme Wholesale".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.name, "Acme Wholesale");
    assert_eq!(updated.code, "ACME");

    assert_eq!(api.list_vendors().unwrap().len(), 1);
    api.delete_vendor(vendor.id).unwrap();
    assert!(api.list_vendors().unwrap().is_empty());

    // 软删除后仍可按 id 查询
    assert!(!api.get_vendor(vendor.id).unwrap().is_active);
}

#[test]
fn test_vendor_validation_and_conflicts() {
    let env = create_test_env().unwrap();
    let api = &env.state.catalog_api;

    assert!(matches!(api.create_vendor("", "X"), Err(ApiError::InvalidInput(_))));
    assert!(matches!(api.create_vendor("X", "  "), Err(ApiError::InvalidInput(_))));

    api.create_vendor("Acme", "ACME").unwrap();
    assert!(matches!(
        api.create_vendor("Another", "ACME"),
        Err(ApiError::BusinessRuleViolation(_))
    ));

    assert!(matches!(api.get_vendor(42), Err(ApiError::NotFound(_))));
    assert!(matches!(api.delete_vendor(42), Err(ApiError::NotFound(_))));
    assert!(matches!(
        api.update_vendor(42, &VendorPatch::default()),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_store_requires_existing_marketplace() {
    let env = create_test_env().unwrap();
    let api = &env.state.catalog_api;

    assert!(matches!(
        api.create_store(&NewStore::new(77, "Orphan")),
        Err(ApiError::NotFound(_))
    ));

    let marketplace = api.create_marketplace("AMZ_AU", "Amazon AU").unwrap();
    let store = api.create_store(&NewStore::new(marketplace.id, "Main")).unwrap();
    assert_eq!(store.marketplace_id, marketplace.id);
    assert_eq!(store.scraping_interval_hours, 24);
    assert_eq!(api.list_marketplaces().unwrap().len(), 1);

    let mut bad = NewStore::new(marketplace.id, "Bad");
    bad.scraping_interval_hours = 0;
    assert!(matches!(api.create_store(&bad), Err(ApiError::InvalidInput(_))));
}

#[test]
fn test_store_update_and_soft_delete() {
    let env = create_test_env().unwrap();
    let seed = seed_catalog(&env).unwrap();
    let api = &env.state.catalog_api;

    let updated = api
        .update_store(
            seed.store_id,
            &StorePatch {
                scraping_enabled: Some(false),
                scraping_interval_hours: Some(6),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(!updated.scraping_enabled);
    assert_eq!(updated.scraping_interval_hours, 6);
    assert_eq!(updated.name, "Acme Store");

    assert!(matches!(
        api.update_store(
            seed.store_id,
            &StorePatch {
                name: Some(" ".to_string()),
                ..Default::default()
            }
        ),
        Err(ApiError::InvalidInput(_))
    ));

    api.delete_store(seed.store_id).unwrap();
    assert!(api.list_stores().unwrap().is_empty());
    assert!(matches!(api.delete_store(999), Err(ApiError::NotFound(_))));
}

#[test]
fn test_price_settings_upsert_and_detail() {
    let env = create_test_env().unwrap();
    let seed = seed_catalog(&env).unwrap();
    let api = &env.state.catalog_api;

    let first = api
        .upsert_price_settings(seed.store_id, seed.vendor_id, &PriceSettingsInput::default())
        .unwrap();
    assert!(first.created);
    assert_eq!(first.settings.purchase_tax_percentage, 10.0);
    assert_eq!(first.settings.marketplace_fee_percentage, 10.0);
    assert_eq!(first.settings.min_margin_percentage, 15.0);

    let second = api
        .upsert_price_settings(
            seed.store_id,
            seed.vendor_id,
            &PriceSettingsInput {
                min_margin_percentage: 25.0,
                ..Default::default()
            },
        )
        .unwrap();
    assert!(!second.created);
    assert_eq!(second.settings.id, first.settings.id);
    assert_eq!(second.settings.min_margin_percentage, 25.0);

    let detail = api.get_store(seed.store_id).unwrap();
    assert_eq!(detail.store.id, seed.store_id);
    assert_eq!(detail.price_settings.len(), 1);
    assert_eq!(api.list_price_settings(seed.store_id).unwrap().len(), 1);
}

#[test]
fn test_price_settings_range_and_references() {
    let env = create_test_env().unwrap();
    let seed = seed_catalog(&env).unwrap();
    let api = &env.state.catalog_api;

    let err = api
        .upsert_price_settings(
            seed.store_id,
            seed.vendor_id,
            &PriceSettingsInput {
                marketplace_fee_percentage: 120.0,
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(ref msg) if msg.contains("marketplace_fee_percentage")));

    assert!(matches!(
        api.upsert_price_settings(seed.store_id, 999, &PriceSettingsInput::default()),
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        api.upsert_price_settings(999, seed.vendor_id, &PriceSettingsInput::default()),
        Err(ApiError::NotFound(_))
    ));
    assert!(api.list_price_settings(seed.store_id).unwrap().is_empty());
}
