// ==========================================
// 工作表整形测试
// ==========================================
// 测试目标: 表头绑定、单元格整形、错误定位、整表到记录的完整流程
// ==========================================


use serde_json::json;
use std::sync::Arc;
use test_helpers::schema_builder::*;
use test_helpers::{grid, import_json};
use xlsx_record_importer::config::ImporterSettings;
use xlsx_record_importer::worksheet::{shape_grid, ColumnTarget};
use xlsx_record_importer::{
    FieldType, FieldValue, RecordSchema, SchemaIntrospector, SheetImporter, SheetImporterImpl,
    ValueNode, WorksheetError, WorksheetLayout, WorksheetTypeInfo,
};

fn headers(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

fn hero_schema() -> RecordSchema {
    RecordBuilder::new("Hero")
        .field("Level", int32())
        .field("Active", FieldType::Bool)
        .field("Tags", FieldType::array(name()))
        .split("Stats", FieldType::record(stats_schema()))
        .split("Loadout", FieldType::array(FieldType::record(stats_schema())))
        .field("Extra", FieldType::record(stats_schema()))
        .build()
}

fn hero_info() -> WorksheetTypeInfo {
    SchemaIntrospector::new().introspect(&hero_schema())
}

#[test]
fn test_build_row_shapes_nested_values() {
    let info = hero_info();
    let layout = WorksheetLayout::bind(
        &info,
        &headers(&[
            "Name",
            "Level",
            "Active",
            "Tags",
            "Stats.Hp",
            "Stats.Speed",
            "Loadout[0].Hp",
            "Loadout[0].Speed",
            "Loadout[1].Hp",
            "Extra",
        ]),
    )
    .unwrap();

    let row = layout
        .build_row(
            &headers(&[
                "Hero1",
                "7",
                "TRUE",
                "[a, b]",
                "30",
                "1.5",
                "4",
                "2",
                "5",
                r#"{"Hp": 1, "Speed": 2}"#,
            ]),
            2,
        )
        .unwrap();

    let expected = ValueNode::from(json!({
        "Name": "Hero1",
        "Level": 7.0,
        "Active": true,
        "Tags": ["a", "b"],
        "Stats": {"Hp": 30.0, "Speed": 1.5},
        "Loadout": [{"Hp": 4.0, "Speed": 2.0}, {"Hp": 5.0}],
        "Extra": {"Hp": 1.0, "Speed": 2.0},
    }));
    assert_eq!(row, expected);
}

#[test]
fn test_indexed_columns_stop_at_first_empty() {
    let info = hero_info();
    let layout = WorksheetLayout::bind(
        &info,
        &headers(&["Name", "Tags[0]", "Tags[1]", "Tags[2]", "Loadout[0].Hp", "Loadout[1].Hp", "Loadout[2].Hp"]),
    )
    .unwrap();

    let row = layout
        .build_row(&headers(&["H", "a", "", "c", "1", "", "3"]), 5)
        .unwrap();

    assert_eq!(row.get("Tags"), Some(&ValueNode::from(json!(["a"]))));
    assert_eq!(row.get("Loadout"), Some(&ValueNode::from(json!([{"Hp": 1.0}]))));
}

#[test]
fn test_unknown_header_passes_through() {
    let info = hero_info();
    let layout = WorksheetLayout::bind(&info, &headers(&["Name", "Colour", "", "Level"])).unwrap();

    assert!(matches!(
        layout.columns.last().map(|c| &c.target),
        Some(ColumnTarget::Unbound { key }) if key == "Colour"
    ));

    let row = layout.build_row(&headers(&["H", "red", "ignored", "3"]), 2).unwrap();
    assert_eq!(row.get("Colour"), Some(&ValueNode::String("red".into())));
    assert_eq!(row.get("Level"), Some(&ValueNode::Number(3.0)));
}

#[test]
fn test_bind_errors_carry_column_letter() {
    let info = hero_info();

    let err = WorksheetLayout::bind(&info, &headers(&["Name", "Level", "Level"])).unwrap_err();
    assert_eq!(
        err,
        WorksheetError::DuplicateHeader {
            column: "C".into(),
            row: 1,
            header: "Level".into()
        }
    );

    let err = WorksheetLayout::bind(&info, &headers(&["Name", "Loadout.Hp"])).unwrap_err();
    assert!(matches!(err, WorksheetError::InvalidHeader { ref column, .. } if column == "B"));

    let err = WorksheetLayout::bind(&info, &headers(&["Tags", "Tags[0]"])).unwrap_err();
    assert!(matches!(err, WorksheetError::InvalidHeader { ref column, .. } if column == "B"));

    let err = WorksheetLayout::bind(&info, &headers(&["Stats.Mana"])).unwrap_err();
    assert!(err.to_string().contains("A1"));
}

#[test]
fn test_indexed_columns_must_be_consecutive() {
    let info = hero_info();

    let err = WorksheetLayout::bind(&info, &headers(&["Name", "Tags[0]", "Tags[2]"])).unwrap_err();
    assert!(matches!(
        err,
        WorksheetError::InvalidHeader { ref column, ref reason, .. }
            if column == "C" && reason.contains("expect 1 got 2")
    ));

    let err = WorksheetLayout::bind(&info, &headers(&["Name", "Tags[1]"])).unwrap_err();
    assert!(matches!(err, WorksheetError::InvalidHeader { ref column, .. } if column == "B"));

    // 重复组: 同一下标的多列属于同一组
    let err = WorksheetLayout::bind(
        &info,
        &headers(&["Loadout[0].Hp", "Loadout[0].Speed", "Loadout[2].Hp"]),
    )
    .unwrap_err();
    assert!(matches!(err, WorksheetError::InvalidHeader { ref column, .. } if column == "C"));
}

#[test]
fn test_huge_index_rejected_at_bind() {
    let info = hero_info();

    let err = WorksheetLayout::bind(&info, &headers(&["Name", "Tags[18446744073709551615]"]))
        .unwrap_err();
    assert!(matches!(err, WorksheetError::InvalidHeader { .. }));

    let err = WorksheetLayout::bind(&info, &headers(&["Name", "Tags[1000000000]"])).unwrap_err();
    assert!(matches!(err, WorksheetError::InvalidHeader { .. }));

    // 超出 usize 的下标在解析阶段即被拒绝
    let err = WorksheetLayout::bind(&info, &headers(&["Tags[99999999999999999999999]"]))
        .unwrap_err();
    assert!(matches!(err, WorksheetError::InvalidHeader { .. }));
}

#[test]
fn test_array_inside_record_rejected() {
    let inner = RecordBuilder::new("Bag")
        .field("Items", FieldType::array(name()))
        .shared();
    let schema = RecordBuilder::new("Row")
        .split("Bag", FieldType::record(inner))
        .build();
    let info = SchemaIntrospector::new().introspect(&schema);

    let err = WorksheetLayout::bind(&info, &headers(&["Name", "Bag.Items"])).unwrap_err();
    assert_eq!(
        err,
        WorksheetError::ArrayInRecord {
            column: "B".into(),
            row: 1,
            header: "Bag.Items".into(),
            field: "Items".into()
        }
    );
}

#[test]
fn test_invalid_json_cell_reports_location() {
    let info = hero_info();
    let layout = WorksheetLayout::bind(&info, &headers(&["Name", "Extra"])).unwrap();

    let err = layout.build_row(&headers(&["H", "{Hp: 1"]), 9).unwrap_err();
    assert!(matches!(
        err,
        WorksheetError::InvalidCell { ref column, row: 9, .. } if column == "B"
    ));
}

#[test]
fn test_shape_grid_uses_header_and_data_rows() {
    let info = SchemaIntrospector::new().introspect(&count_tags_schema());
    let cells = grid(&[
        &["Item table", "", ""],
        &["Name", "Count", "Tags"],
        &["Row1", "3", "x, y"],
        &["", "", ""],
        &["Row2", "4", ""],
    ]);

    let rows = shape_grid(&info, &cells, 2, 3).unwrap();
    assert_eq!(rows.len(), 2);

    let (dest, report) = import_json(
        &count_tags_schema(),
        serde_json::to_value(&rows[0]).unwrap(),
    );
    assert!(report.is_clean());
    assert_eq!(dest.get("Count"), Some(&FieldValue::Int(3)));
    assert_eq!(
        dest.get("Tags"),
        Some(&FieldValue::Array(vec![
            FieldValue::Str("x".into()),
            FieldValue::Str("y".into())
        ]))
    );

    let err = shape_grid(&info, &cells, 9, 10).unwrap_err();
    assert_eq!(err, WorksheetError::HeaderRowMissing { row: 9, rows: 5 });
}

#[tokio::test]
async fn test_grid_to_records_pipeline() {
    let schema = Arc::new(hero_schema());
    let settings = ImporterSettings::default();
    let info = SchemaIntrospector::new().introspect(&schema);
    let cells = grid(&[
        &["Name", "Level", "Active", "Tags", "Stats.Hp", "Stats.Speed", "Loadout[0].Hp", "Loadout[0].Speed", "Extra"],
        &["Knight", "3", "true", "tank", "50", "1", "10", "0.5", "(Hp=1,Speed=1)"],
        &["Rogue", "high", "false", "", "20", "3", "", "", "(Hp=2,Speed=4)"],
    ]);

    let rows = shape_grid(&info, &cells, settings.header_row, settings.data_start_row).unwrap();
    let importer = SheetImporterImpl::from_settings(Arc::clone(&schema), &settings);
    let report = importer.import_rows(rows).await.unwrap();

    let knight = &report.rows[0];
    assert!(knight.report.is_clean(), "{:?}", knight.report.problems);
    let Some(FieldValue::Array(loadout)) = knight.record.get("Loadout") else {
        panic!("expected loadout array");
    };
    assert_eq!(loadout.len(), 1);

    // Level 类型错误 + Tags、Loadout 缺失
    let rogue = &report.rows[1];
    assert!(!rogue.report.success);
    assert_eq!(rogue.report.structural_count(), 1);
    assert!(rogue.report.problems[0].message.contains("expected Integer"));
    assert_eq!(rogue.report.advisory_count(), 2);
}
