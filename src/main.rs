// ==========================================
// 表格记录导入器 - 命令行入口
// ==========================================
// 用法:
//   xlsx-record-importer [--json-log] introspect <schema.json>
//   xlsx-record-importer [--json-log] import <schema.json> <rows.json> [settings.json]
//
// 结果以 JSON 输出到 stdout，日志输出到 stderr
// ==========================================

use anyhow::{bail, Context};
use serde_json::json;
use std::process::ExitCode;
use std::sync::Arc;
use xlsx_record_importer::config::ImporterSettings;
use xlsx_record_importer::importer::{load_rows, load_schema, SheetImportReport};
use xlsx_record_importer::{logging, SchemaIntrospector, SheetImporter, SheetImporterImpl};

const USAGE: &str = "用法:
  xlsx-record-importer [--json-log] introspect <schema.json>
  xlsx-record-importer [--json-log] import <schema.json> <rows.json> [settings.json]";

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if let Some(pos) = args.iter().position(|a| a == "--json-log") {
        args.remove(pos);
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!(version = xlsx_record_importer::VERSION, "{}", xlsx_record_importer::APP_NAME);

    match args.first().map(String::as_str) {
        Some("introspect") => {
            let [_, schema_path] = args.as_slice() else {
                bail!("{}", USAGE);
            };
            run_introspect(schema_path)
        }
        Some("import") => match args.as_slice() {
            [_, schema_path, rows_path] => run_import(schema_path, rows_path, None).await,
            [_, schema_path, rows_path, settings_path] => {
                run_import(schema_path, rows_path, Some(settings_path)).await
            }
            _ => bail!("{}", USAGE),
        },
        _ => bail!("{}", USAGE),
    }
}

fn load_settings(settings_path: Option<&String>) -> anyhow::Result<ImporterSettings> {
    match settings_path {
        Some(path) => ImporterSettings::load(path)
            .with_context(|| format!("无法加载导入配置: {}", path)),
        None => ImporterSettings::load_or_default().context("无法加载默认导入配置"),
    }
}

fn run_introspect(schema_path: &str) -> anyhow::Result<ExitCode> {
    let schema = load_schema(schema_path)?;
    let settings = load_settings(None)?;

    let info = SchemaIntrospector::new()
        .with_identity_key(&settings.identity_key)
        .introspect(&schema);

    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(ExitCode::SUCCESS)
}

async fn run_import(
    schema_path: &str,
    rows_path: &str,
    settings_path: Option<&String>,
) -> anyhow::Result<ExitCode> {
    let settings = load_settings(settings_path)?;
    let schema = Arc::new(load_schema(schema_path)?);

    // 网格输入需要目录来绑定表头
    let info = SchemaIntrospector::new()
        .with_identity_key(&settings.identity_key)
        .introspect(&schema);
    let rows = load_rows(rows_path)?
        .into_rows(&info, &settings)
        .with_context(|| format!("无法整形行数据: {}", rows_path))?;

    let importer = SheetImporterImpl::from_settings(Arc::clone(&schema), &settings);
    let report = importer.import_rows(rows).await?;

    println!("{}", serde_json::to_string_pretty(&report_json(&report))?);

    if report.failed_count() == 0 && report.skipped_rows == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn report_json(report: &SheetImportReport) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = report
        .rows
        .iter()
        .map(|row| {
            json!({
                "index": row.index,
                "name": row.report.row_name,
                "success": row.report.success,
                "record": row.record.to_json(),
                "problems": row
                    .report
                    .problems
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    json!({
        "batch_id": report.batch_id,
        "record": report.record_name,
        "started_at": report.started_at.to_rfc3339(),
        "elapsed_ms": report.elapsed_ms,
        "summary": {
            "rows": report.rows.len(),
            "success": report.success_count(),
            "failed": report.failed_count(),
            "structural_problems": report.structural_count(),
            "advisory_problems": report.advisory_count(),
            "skipped_rows": report.skipped_rows,
        },
        "rows": rows,
    })
}
