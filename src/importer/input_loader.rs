// ==========================================
// 表格记录导入器 - 输入文件加载
// ==========================================
// 职责: 读取 schema JSON 与行数据 JSON
// 行数据格式:
// - 数组: 每个元素为一行值树
// - 对象 { "cells": [[...], ...] }: 单元格网格，按表头行绑定后整形
// ==========================================

use crate::config::ImporterSettings;
use crate::domain::schema::RecordSchema;
use crate::domain::value::ValueNode;
use crate::importer::error::{ImportError, ImportResult};
use crate::introspector::WorksheetTypeInfo;
use crate::worksheet::shape_grid;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// 行数据输入
#[derive(Debug, Clone, PartialEq)]
pub enum RowsInput {
    Values(Vec<ValueNode>),
    Cells(Vec<Vec<String>>),
}

impl RowsInput {
    pub fn len(&self) -> usize {
        match self {
            RowsInput::Values(rows) => rows.len(),
            RowsInput::Cells(grid) => grid.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 转为行值树（网格按配置的表头行/数据起始行整形）
    pub fn into_rows(
        self,
        info: &WorksheetTypeInfo,
        settings: &ImporterSettings,
    ) -> ImportResult<Vec<ValueNode>> {
        match self {
            RowsInput::Values(rows) => Ok(rows),
            RowsInput::Cells(grid) => Ok(shape_grid(
                info,
                &grid,
                settings.header_row,
                settings.data_start_row,
            )?),
        }
    }
}

fn read_file(path: &Path) -> ImportResult<String> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?)
}

/// 加载记录 schema
pub fn load_schema<P: AsRef<Path>>(path: P) -> ImportResult<RecordSchema> {
    let path = path.as_ref();
    let content = read_file(path)?;
    let schema: RecordSchema =
        serde_json::from_str(&content).map_err(|e| ImportError::SchemaLoadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    debug!(path = %path.display(), record = %schema.name, fields = schema.fields.len(), "schema 加载完成");
    Ok(schema)
}

/// 加载行数据
pub fn load_rows<P: AsRef<Path>>(path: P) -> ImportResult<RowsInput> {
    let path = path.as_ref();
    let content = read_file(path)?;
    let value: Value = serde_json::from_str(&content)?;

    let input = parse_rows(value)?;
    debug!(path = %path.display(), rows = input.len(), "行数据加载完成");
    Ok(input)
}

/// 解析行数据 JSON
pub fn parse_rows(value: Value) -> ImportResult<RowsInput> {
    match value {
        Value::Array(rows) => Ok(RowsInput::Values(
            rows.into_iter().map(ValueNode::from).collect(),
        )),
        Value::Object(mut object) => match object.remove("cells") {
            Some(Value::Array(lines)) => lines
                .into_iter()
                .enumerate()
                .map(|(i, line)| match line {
                    Value::Array(cells) => Ok(cells.into_iter().map(cell_text).collect()),
                    other => Err(ImportError::RowsFormatError(format!(
                        "cells 第 {} 行不是数组: {}",
                        i + 1,
                        other
                    ))),
                })
                .collect::<ImportResult<Vec<Vec<String>>>>()
                .map(RowsInput::Cells),
            _ => Err(ImportError::RowsFormatError(
                "对象格式的行数据需要 cells 数组".to_string(),
            )),
        },
        other => Err(ImportError::RowsFormatError(format!(
            "行数据必须是数组或包含 cells 的对象，实际为: {}",
            other
        ))),
    }
}

fn cell_text(cell: Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_rows_values() {
        let input = parse_rows(json!([{"Name": "Row1"}, {"Name": "Row2"}])).unwrap();
        assert_eq!(input.len(), 2);
        assert!(matches!(input, RowsInput::Values(_)));
    }

    #[test]
    fn test_parse_rows_cells() {
        let input = parse_rows(json!({"cells": [["Name", "Count"], ["Row1", 3], [null, true]]}))
            .unwrap();
        assert_eq!(
            input,
            RowsInput::Cells(vec![
                vec!["Name".into(), "Count".into()],
                vec!["Row1".into(), "3".into()],
                vec!["".into(), "true".into()],
            ])
        );
    }

    #[test]
    fn test_parse_rows_invalid() {
        assert!(matches!(
            parse_rows(json!("rows")),
            Err(ImportError::RowsFormatError(_))
        ));
        assert!(matches!(
            parse_rows(json!({"cells": [1]})),
            Err(ImportError::RowsFormatError(_))
        ));
    }

    #[test]
    fn test_load_schema_errors() {
        assert!(matches!(
            load_schema("missing_schema.json"),
            Err(ImportError::FileNotFound(_))
        ));

        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{{ not json").unwrap();
        assert!(matches!(
            load_schema(temp_file.path()),
            Err(ImportError::SchemaLoadError { .. })
        ));
    }
}
