// ==========================================
// 表格记录导入器 - 工作表布局
// ==========================================
// 职责: 表头 → 扁平字段目录的列绑定；单元格行 → 行值树
// 规则:
// - 标量一列；展开记录每个子字段一列（点分路径）
// - 标量数组: 单列（`a, b` 或 `[a, b]`）或下标列（Tags[0]、Tags[1]）
// - 展开记录数组: 重复组（Items[0].A、Items[0].B、Items[1].A）
// - 未展开记录/映射: 单列，`{...}` 按 JSON 解析
// - 记录内不允许数组；重复组遇到第一个空元素即截止
// - 下标列从 0 起连续，否则表头无效
// 红线: 不做字段级校验，数据问题留给结构化导入器
// ==========================================

use crate::domain::types::FieldKind;
use crate::domain::value::{ValueNode, ValueObject};
use crate::introspector::{FlattenedField, WorksheetTypeInfo};
use crate::worksheet::error::{WorksheetError, WorksheetResult};
use crate::worksheet::header::{column_name, parse_header, HeaderSegment};
use std::collections::{HashMap, HashSet};
use tracing::debug;

// ==========================================
// 列绑定
// ==========================================

/// 值树路径步
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

/// 单元格转换方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellMode {
    Scalar(FieldKind), // 按字段种类转换单值
    List(FieldKind),   // 单列列表，按元素种类转换每项
    Json,              // `{...}` / `[...]` 按 JSON 解析，否则原样字符串
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnTarget {
    Field {
        field: usize, // 目录中的叶字段索引
        path: Vec<PathStep>,
        mode: CellMode,
    },
    // 未匹配任何字段的表头，原样放入顶层（由导入器报告多余字段）
    Unbound { key: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundColumn {
    pub column: usize, // 0 起
    pub header: String,
    pub target: ColumnTarget,
}

// ==========================================
// WorksheetLayout
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct WorksheetLayout {
    pub record_name: String,
    pub header_row: usize,
    pub columns: Vec<BoundColumn>,
    indexed_keys: Vec<String>, // 使用下标列的顶层数组字段
}

impl WorksheetLayout {
    /// 绑定表头（表头位于第 1 行）
    pub fn bind(info: &WorksheetTypeInfo, header_cells: &[String]) -> WorksheetResult<Self> {
        Self::bind_at(info, header_cells, 1)
    }

    /// 绑定表头（指定表头行号，仅用于错误定位）
    pub fn bind_at(
        info: &WorksheetTypeInfo,
        header_cells: &[String],
        header_row: usize,
    ) -> WorksheetResult<Self> {
        let mut columns = Vec::new();
        let mut seen = HashSet::new();
        let mut whole_lists = HashSet::new();
        let mut indexed_keys: Vec<String> = Vec::new();
        let mut last_index: HashMap<String, usize> = HashMap::new();

        for (column, raw) in header_cells.iter().enumerate() {
            let header = raw.trim();
            if header.is_empty() {
                continue;
            }

            let binder = ColumnBinder {
                info,
                column,
                row: header_row,
                header,
            };

            if !seen.insert(header.to_string()) {
                return Err(WorksheetError::DuplicateHeader {
                    column: column_name(column),
                    row: header_row,
                    header: header.to_string(),
                });
            }

            let target = binder.bind()?;

            // 同一数组不能同时使用整列与下标列
            if let ColumnTarget::Field { path, mode, .. } = &target {
                if let Some(PathStep::Key(top)) = path.first() {
                    let index = match path.get(1) {
                        Some(PathStep::Index(i)) => Some(*i),
                        _ => None,
                    };
                    let indexed = index.is_some();
                    let whole = matches!(mode, CellMode::List(_));
                    if (indexed && whole_lists.contains(top))
                        || (whole && indexed_keys.contains(top))
                    {
                        return Err(binder.invalid("mixes whole-list and indexed columns"));
                    }

                    // 下标从 0 起连续；重复组内同一下标可跨多列
                    if let Some(index) = index {
                        let last = last_index.get(top).copied();
                        let expected = last.map_or(0, |l| l + 1);
                        if index != expected && Some(index) != last {
                            return Err(binder.invalid(format!(
                                "array index is wrong, expect {} got {}",
                                expected, index
                            )));
                        }
                        last_index.insert(top.clone(), index);
                    }
                    if indexed && !indexed_keys.contains(top) {
                        indexed_keys.push(top.clone());
                    }
                    if whole {
                        whole_lists.insert(top.clone());
                    }
                }
            }

            columns.push(BoundColumn {
                column,
                header: header.to_string(),
                target,
            });
        }

        // 按目录顺序排列（同一字段按表头顺序）
        columns.sort_by_key(|c| match &c.target {
            ColumnTarget::Field { field, .. } => (0, info.top_field_of(*field)),
            ColumnTarget::Unbound { .. } => (1, c.column),
        });

        debug!(
            record = %info.record_name,
            columns = columns.len(),
            "表头绑定完成"
        );

        Ok(Self {
            record_name: info.record_name.clone(),
            header_row,
            columns,
            indexed_keys,
        })
    }

    /// 单元格行 → 行值树（空单元格不产生键）
    ///
    /// # 参数
    /// - cells: 该行全部单元格文本（按列顺序）
    /// - row_number: 行号（1 起，仅用于错误定位）
    pub fn build_row(&self, cells: &[String], row_number: usize) -> WorksheetResult<ValueNode> {
        let mut root = ValueObject::new();

        for bound in &self.columns {
            let cell = cells.get(bound.column).map(|c| c.trim()).unwrap_or("");
            if cell.is_empty() {
                continue;
            }

            match &bound.target {
                ColumnTarget::Unbound { key } => {
                    root.insert(key.clone(), ValueNode::String(cell.to_string()));
                }
                ColumnTarget::Field { path, mode, .. } => {
                    let value = convert_cell(cell, *mode).map_err(|message| {
                        WorksheetError::InvalidCell {
                            column: column_name(bound.column),
                            row: row_number,
                            message,
                        }
                    })?;
                    insert_at(&mut root, path, value);
                }
            }
        }

        // 重复组截止于第一个空元素
        for key in &self.indexed_keys {
            if let Some(ValueNode::Array(items)) = root.get_mut(key) {
                if let Some(first_empty) = items.iter().position(ValueNode::is_null) {
                    items.truncate(first_empty);
                }
            }
        }

        Ok(ValueNode::Object(root))
    }
}

/// 整表整形：按表头行绑定，数据起始行起逐行构建（全空行跳过）
///
/// # 参数
/// - grid: 单元格文本（grid[0] 为第 1 行）
/// - header_row / data_start_row: 行号（1 起）
pub fn shape_grid(
    info: &WorksheetTypeInfo,
    grid: &[Vec<String>],
    header_row: usize,
    data_start_row: usize,
) -> WorksheetResult<Vec<ValueNode>> {
    let header = header_row
        .checked_sub(1)
        .and_then(|i| grid.get(i))
        .ok_or(WorksheetError::HeaderRowMissing {
            row: header_row,
            rows: grid.len(),
        })?;
    let layout = WorksheetLayout::bind_at(info, header, header_row)?;

    let mut rows = Vec::new();
    for (i, cells) in grid.iter().enumerate().skip(data_start_row.saturating_sub(1)) {
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        rows.push(layout.build_row(cells, i + 1)?);
    }

    debug!(record = %info.record_name, rows = rows.len(), "工作表整形完成");
    Ok(rows)
}

// ==========================================
// ColumnBinder - 单列绑定
// ==========================================
struct ColumnBinder<'a> {
    info: &'a WorksheetTypeInfo,
    column: usize,
    row: usize,
    header: &'a str,
}

impl<'a> ColumnBinder<'a> {
    fn invalid(&self, reason: impl Into<String>) -> WorksheetError {
        WorksheetError::InvalidHeader {
            column: column_name(self.column),
            row: self.row,
            header: self.header.to_string(),
            reason: reason.into(),
        }
    }

    fn bind(&self) -> WorksheetResult<ColumnTarget> {
        let segments = parse_header(self.header).map_err(|reason| self.invalid(reason))?;
        let (first, rest) = match segments.split_first() {
            Some(split) => split,
            None => return Err(self.invalid("empty header")),
        };

        let top = self
            .info
            .top_fields
            .iter()
            .filter_map(|&i| self.info.field(i))
            .find(|f| f.name == first.name);
        let Some(top) = top else {
            return Ok(ColumnTarget::Unbound {
                key: self.header.to_string(),
            });
        };

        let mut path = vec![PathStep::Key(top.name.clone())];

        // 展开的记录数组: Items[i].Child
        if top.split_struct && top.kind == FieldKind::Array {
            let Some(index) = first.index else {
                return Err(self.invalid(format!(
                    "expects an indexed group such as {}[0].<field>",
                    top.name
                )));
            };
            path.push(PathStep::Index(index));
            return self.bind_children(top, rest, path);
        }

        if first.index.is_some() && !matches!(top.kind, FieldKind::Array | FieldKind::Set) {
            return Err(self.invalid(format!("{} is not an array", top.name)));
        }

        // 展开的记录: Stats.Child
        if top.split_struct {
            return self.bind_children(top, rest, path);
        }

        if !rest.is_empty() {
            return Err(self.invalid(format!("{} has no inline fields", top.name)));
        }

        let mode = match (top.kind, first.index) {
            (FieldKind::Array | FieldKind::Set, Some(index)) => {
                path.push(PathStep::Index(index));
                CellMode::Scalar(top.element_kind)
            }
            (FieldKind::Array | FieldKind::Set, None) => CellMode::List(top.element_kind),
            (FieldKind::Record | FieldKind::Map, _) => CellMode::Json,
            (kind, _) => CellMode::Scalar(kind),
        };

        Ok(ColumnTarget::Field {
            field: top.index,
            path,
            mode,
        })
    }

    fn bind_children(
        &self,
        parent: &FlattenedField,
        segments: &[HeaderSegment],
        mut path: Vec<PathStep>,
    ) -> WorksheetResult<ColumnTarget> {
        let (segment, rest) = match segments.split_first() {
            Some(split) => split,
            None => {
                return Err(self.invalid(format!(
                    "names no field inside {}",
                    parent.name
                )))
            }
        };

        let child = parent
            .child_indices
            .iter()
            .filter_map(|&i| self.info.field(i))
            .find(|f| f.name == segment.name)
            .ok_or_else(|| self.invalid(format!("{} has no field {}", parent.name, segment.name)))?;

        if child.kind.is_container() {
            return Err(WorksheetError::ArrayInRecord {
                column: column_name(self.column),
                row: self.row,
                header: self.header.to_string(),
                field: child.name.clone(),
            });
        }
        if segment.index.is_some() {
            return Err(self.invalid(format!("{} is not an array", child.name)));
        }

        path.push(PathStep::Key(child.name.clone()));

        if child.split_struct {
            return self.bind_children(child, rest, path);
        }
        if !rest.is_empty() {
            return Err(self.invalid(format!("{} has no inline fields", child.name)));
        }

        let mode = match child.kind {
            FieldKind::Record => CellMode::Json,
            kind => CellMode::Scalar(kind),
        };
        Ok(ColumnTarget::Field {
            field: child.index,
            path,
            mode,
        })
    }
}

// ==========================================
// 单元格转换
// ==========================================

fn convert_cell(cell: &str, mode: CellMode) -> Result<ValueNode, String> {
    match mode {
        CellMode::Scalar(kind) => Ok(convert_scalar(cell, kind)),
        CellMode::List(element_kind) => {
            let inner = cell
                .strip_prefix('[')
                .and_then(|s| s.strip_suffix(']'))
                .unwrap_or(cell);
            let items = inner
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| convert_scalar(item, element_kind))
                .collect();
            Ok(ValueNode::Array(items))
        }
        CellMode::Json => {
            if cell.starts_with('{') || cell.starts_with('[') {
                serde_json::from_str::<serde_json::Value>(cell)
                    .map(ValueNode::from)
                    .map_err(|e| e.to_string())
            } else {
                Ok(ValueNode::String(cell.to_string()))
            }
        }
    }
}

// 数值/布尔列尽量转换，失败保留字符串（由导入器报告类型问题）
fn convert_scalar(cell: &str, kind: FieldKind) -> ValueNode {
    match kind {
        FieldKind::Numeric => match cell.parse::<f64>() {
            Ok(n) => ValueNode::Number(n),
            Err(_) => ValueNode::String(cell.to_string()),
        },
        FieldKind::Boolean => match cell.to_ascii_lowercase().as_str() {
            "true" => ValueNode::Boolean(true),
            "false" => ValueNode::Boolean(false),
            _ => ValueNode::String(cell.to_string()),
        },
        _ => ValueNode::String(cell.to_string()),
    }
}

fn insert_at(object: &mut ValueObject, path: &[PathStep], value: ValueNode) {
    let Some((PathStep::Key(key), rest)) = path.split_first() else {
        return;
    };

    match rest.split_first() {
        None => {
            object.insert(key.clone(), value);
        }
        Some((PathStep::Index(index), tail)) => {
            let slot = object
                .entry(key.clone())
                .or_insert_with(|| ValueNode::Array(Vec::new()));
            let ValueNode::Array(items) = slot else {
                return;
            };
            let Some(len) = index.checked_add(1) else {
                return;
            };
            if items.len() < len {
                items.resize(len, ValueNode::Null);
            }
            if tail.is_empty() {
                items[*index] = value;
            } else {
                if items[*index].is_null() {
                    items[*index] = ValueNode::Object(ValueObject::new());
                }
                if let ValueNode::Object(inner) = &mut items[*index] {
                    insert_at(inner, tail, value);
                }
            }
        }
        Some((PathStep::Key(_), _)) => {
            let slot = object
                .entry(key.clone())
                .or_insert_with(|| ValueNode::Object(ValueObject::new()));
            if let ValueNode::Object(inner) = slot {
                insert_at(inner, rest, value);
            }
        }
    }
}
