// ==========================================
// 代发货库存管理后端 - 命令行入口
// ==========================================
// 用法:
//   dropship-inventory init
//   dropship-inventory import <vendor_id> <store_id> <csv_path>
//   dropship-inventory export <store_id> [vendor_id|-] [price|inventory|full]
//   dropship-inventory uploads [page] [page_size]
//   dropship-inventory exports [store_id]
//   dropship-inventory download <export_id> <out_path>
//   dropship-inventory summary
//   dropship-inventory config [<key> <value>]
// 输出: 成功与失败均为 JSON（stdout），日志写 stderr
// ==========================================

use anyhow::{anyhow, bail, Context};
use dropship_inventory::api::{ApiError, ExportRequest, ImportRequest};
use dropship_inventory::app::{get_default_db_path, AppState};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    dropship_inventory::logging::init();

    tracing::info!("{} v{}", dropship_inventory::APP_NAME, dropship_inventory::VERSION);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let failure = match e.downcast_ref::<ApiError>() {
                Some(api_err) => {
                    tracing::error!(code = api_err.code(), "命令执行失败: {}", api_err);
                    api_err.to_failure()
                }
                None => {
                    tracing::error!("命令执行失败: {:#}", e);
                    dropship_inventory::api::FailureResponse {
                        success: false,
                        error: format!("{:#}", e),
                    }
                }
            };
            // 失败载荷序列化不会出错；兜底直接打印消息
            match serde_json::to_string_pretty(&failure) {
                Ok(json) => println!("{}", json),
                Err(_) => println!("{}", failure.error),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> anyhow::Result<()> {
    let command = args.first().map(String::as_str).unwrap_or("help");
    if command == "help" || command == "--help" || command == "-h" {
        print_usage();
        return Ok(());
    }

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);
    let state = AppState::new(db_path.clone()).map_err(|e| anyhow!(e))?;

    match command {
        "init" => print_json(&serde_json::json!({
            "success": true,
            "db_path": db_path,
            "db_version": dropship_inventory::DB_VERSION,
        })),
        "import" => {
            let vendor_id = parse_id(args.get(1), "vendor_id")?;
            let store_id = parse_id(args.get(2), "store_id")?;
            let csv_path = args.get(3).context("缺少参数 csv_path")?;
            let content =
                std::fs::read(csv_path).with_context(|| format!("无法读取文件: {}", csv_path))?;
            let filename = Path::new(csv_path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| csv_path.clone());

            let response = state.import_api.import_products(&ImportRequest {
                vendor_id,
                store_id,
                filename,
                content,
            })?;
            print_json(&response)
        }
        "export" => {
            let store_id = parse_id(args.get(1), "store_id")?;
            let vendor_id = match args.get(2) {
                Some(raw) if raw != "-" => Some(parse_id(Some(raw), "vendor_id")?),
                _ => None,
            };
            let response = state.export_api.generate_export(&ExportRequest {
                store_id,
                vendor_id,
                export_type: args.get(3).cloned(),
            })?;
            print_json(&response)
        }
        "uploads" => {
            let page = parse_opt_i64(args.get(1), "page")?.unwrap_or(1);
            let page_size = parse_opt_i64(args.get(2), "page_size")?.unwrap_or(0);
            print_json(&state.import_api.list_uploads(page, page_size)?)
        }
        "exports" => {
            let store_id = parse_opt_i64(args.get(1), "store_id")?;
            print_json(&state.export_api.list_exports(store_id, None)?)
        }
        "download" => {
            let export_id = args.get(1).context("缺少参数 export_id")?;
            let out_path = args.get(2).context("缺少参数 out_path")?;
            let download = state.export_api.download_export(export_id)?;
            std::fs::write(out_path, &download.body)
                .with_context(|| format!("无法写入文件: {}", out_path))?;
            print_json(&serde_json::json!({
                "success": true,
                "filename": download.filename,
                "content_type": download.content_type,
                "content_disposition": download.content_disposition,
                "bytes": download.body.len(),
                "out_path": out_path,
            }))
        }
        "summary" => print_json(&serde_json::json!({
            "health": state.dashboard_api.health(),
            "summary": state.dashboard_api.summary()?,
        })),
        "config" => {
            if let (Some(key), Some(value)) = (args.get(1), args.get(2)) {
                state
                    .config_manager
                    .set_global_config_value(key, value)
                    .map_err(ApiError::from)?;
            }
            let snapshot = state
                .config_manager
                .get_config_snapshot()
                .map_err(ApiError::from)?;
            println!("{}", snapshot);
            Ok(())
        }
        other => {
            print_usage();
            bail!("未知命令: {}", other)
        }
    }
}

fn parse_id(raw: Option<&String>, name: &str) -> anyhow::Result<i64> {
    let raw = raw.with_context(|| format!("缺少参数 {}", name))?;
    raw.trim()
        .parse::<i64>()
        .with_context(|| format!("参数 {} 不是整数: {}", name, raw))
}

fn parse_opt_i64(raw: Option<&String>, name: &str) -> anyhow::Result<Option<i64>> {
    raw.map(|r| parse_id(Some(r), name)).transpose()
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_usage() {
    eprintln!(
        "用法:\n  \
         dropship-inventory init\n  \
         dropship-inventory import <vendor_id> <store_id> <csv_path>\n  \
         dropship-inventory export <store_id> [vendor_id|-] [price|inventory|full]\n  \
         dropship-inventory uploads [page] [page_size]\n  \
         dropship-inventory exports [store_id]\n  \
         dropship-inventory download <export_id> <out_path>\n  \
         dropship-inventory summary\n  \
         dropship-inventory config [<key> <value>]"
    );
}
