// ==========================================
// 输入文件加载测试
// ==========================================
// 测试目标: schema / 行数据 JSON 文件 → 整表导入
// ==========================================


use serde_json::json;
use std::sync::Arc;
use test_helpers::write_temp_json;
use xlsx_record_importer::config::ImporterSettings;
use xlsx_record_importer::importer::{load_rows, load_schema, RowsInput};
use xlsx_record_importer::{
    FieldKind, FieldValue, ImportError, SchemaIntrospector, SheetImporter, SheetImporterImpl,
};

fn schema_json() -> serde_json::Value {
    json!({
        "name": "Item",
        "fields": [
            {
                "name": "Count",
                "type": {"type": "numeric", "repr": "int32"},
                "metadata": {"ImportFromXlsx": ""}
            },
            {
                "name": "Rarity",
                "type": {
                    "type": "enum",
                    "enum": {"name": "ERarity", "variants": [
                        {"name": "Common", "value": 0},
                        {"name": "Rare", "value": 1}
                    ]}
                },
                "metadata": {"ImportFromXlsx": "", "DataTableImportOptional": ""}
            },
            {
                "name": "Cache",
                "type": {"type": "bool"}
            }
        ]
    })
}

#[test]
fn test_load_schema_from_json() {
    let file = write_temp_json(&schema_json());
    let schema = load_schema(file.path()).unwrap();

    assert_eq!(schema.name, "Item");
    assert_eq!(schema.fields.len(), 3);

    let info = SchemaIntrospector::new().introspect(&schema);
    let kinds: Vec<FieldKind> = info.all_fields.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![FieldKind::Other, FieldKind::Numeric, FieldKind::Enum]);
}

#[test]
fn test_load_rows_rejects_scalar_document() {
    let file = write_temp_json(&json!(42));
    assert!(matches!(
        load_rows(file.path()),
        Err(ImportError::RowsFormatError(_))
    ));
}

#[tokio::test]
async fn test_value_rows_file_import() {
    let schema = Arc::new(load_schema(write_temp_json(&schema_json()).path()).unwrap());
    let rows_file = write_temp_json(&json!([
        {"Name": "Potion", "Count": 3, "Rarity": "Rare"},
        {"Name": "Elixir", "Count": 1.5}
    ]));

    let input = load_rows(rows_file.path()).unwrap();
    assert!(matches!(input, RowsInput::Values(_)));

    let settings = ImporterSettings::default();
    let info = SchemaIntrospector::new().introspect(&schema);
    let rows = input.into_rows(&info, &settings).unwrap();

    let report = SheetImporterImpl::from_settings(Arc::clone(&schema), &settings)
        .import_rows(rows)
        .await
        .unwrap();

    assert_eq!(report.rows[0].record.get("Rarity"), Some(&FieldValue::Enum(1)));
    assert!(report.rows[0].report.is_clean());

    // 1.5 不是整数；Rarity 可缺省
    let elixir = &report.rows[1].report;
    assert!(!elixir.success);
    assert_eq!(elixir.problems.len(), 1);
}

#[tokio::test]
async fn test_cell_grid_file_import() {
    let schema = Arc::new(load_schema(write_temp_json(&schema_json()).path()).unwrap());
    let rows_file = write_temp_json(&json!({
        "cells": [
            ["Name", "Count", "Rarity"],
            ["Potion", 3, "Common"],
            ["Potion", 4, null]
        ]
    }));

    let settings = ImporterSettings::default();
    let info = SchemaIntrospector::new().introspect(&schema);
    let rows = load_rows(rows_file.path())
        .unwrap()
        .into_rows(&info, &settings)
        .unwrap();
    assert_eq!(rows.len(), 2);

    let report = SheetImporterImpl::from_settings(Arc::clone(&schema), &settings)
        .import_rows(rows)
        .await
        .unwrap();

    assert_eq!(report.success_count(), 1);
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.rows[1].record.get("Count"), Some(&FieldValue::Int(4)));
}
