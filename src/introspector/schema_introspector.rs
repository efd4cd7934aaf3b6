// ==========================================
// 表格记录导入器 - Schema 内省器
// ==========================================
// 职责: 记录类型 → 扁平字段目录（供表格桥接层确定列及顺序）
// 规则:
// - 索引 0 固定为合成的行标识字段（种类 Other）
// - 基类字段在前，派生类字段在后
// - 仅收录带 ImportFromXlsx 标记的字段
// - 带 SplitStructInXlsx 标记的 Record / Array<Record> 递归展开
// 红线: 只描述结构，不校验数据，永不失败
// ==========================================

use crate::domain::schema::{markers, RecordSchema};
use crate::domain::types::FieldKind;
use crate::domain::FieldType;
use crate::reflection::{ReflectionProvider, SchemaReflection};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 默认行标识键
pub const DEFAULT_IDENTITY_KEY: &str = "Name";

// 合成标识字段的类型名
const IDENTITY_TYPE_NAME: &str = "Name";

// ==========================================
// FlattenedField - 扁平字段
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlattenedField {
    pub index: usize,
    pub parent_index: Option<usize>, // None = 顶层字段
    pub child_indices: Vec<usize>,   // 仅展开的记录字段非空
    pub name: String,
    pub kind: FieldKind,
    pub type_name: String,
    pub element_kind: FieldKind,     // 非容器字段为 Other
    pub element_type_name: String,   // 非容器字段为空
    pub split_struct: bool,
}

impl FlattenedField {
    fn new(index: usize, name: &str, kind: FieldKind, type_name: String) -> Self {
        Self {
            index,
            parent_index: None,
            child_indices: Vec::new(),
            name: name.to_string(),
            kind,
            type_name,
            element_kind: FieldKind::Other,
            element_type_name: String::new(),
            split_struct: false,
        }
    }
}

// ==========================================
// WorksheetTypeInfo - 内省结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorksheetTypeInfo {
    pub record_name: String,
    pub top_fields: Vec<usize>,
    pub all_fields: Vec<FlattenedField>,
}

impl WorksheetTypeInfo {
    pub fn field(&self, index: usize) -> Option<&FlattenedField> {
        self.all_fields.get(index)
    }

    /// 从顶层字段到当前字段的名称链
    pub fn field_path(&self, index: usize) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self.all_fields.get(index);
        while let Some(field) = current {
            path.push(field.name.as_str());
            current = field.parent_index.and_then(|p| self.all_fields.get(p));
        }
        path.reverse();
        path
    }

    /// 所属顶层字段索引
    pub fn top_field_of(&self, index: usize) -> usize {
        let mut current = index;
        while let Some(parent) = self.all_fields.get(current).and_then(|f| f.parent_index) {
            current = parent;
        }
        current
    }
}

// ==========================================
// 字段分类
// ==========================================
// 优先级: Enum > Numeric > Boolean > Array > Set > Map > Record > Other
// 字节型枚举（Numeric + enum_hint）归类为 Numeric
pub fn classify_field<P: ReflectionProvider + ?Sized>(provider: &P, ty: &FieldType) -> FieldKind {
    if provider.is_enum(ty) {
        FieldKind::Enum
    } else if provider.is_numeric(ty) {
        FieldKind::Numeric
    } else if provider.is_bool(ty) {
        FieldKind::Boolean
    } else if provider.is_array(ty) {
        FieldKind::Array
    } else if provider.is_set(ty) {
        FieldKind::Set
    } else if provider.is_map(ty) {
        FieldKind::Map
    } else if provider.is_record(ty) {
        FieldKind::Record
    } else {
        FieldKind::Other
    }
}

// ==========================================
// SchemaIntrospector
// ==========================================
pub struct SchemaIntrospector<P: ReflectionProvider = SchemaReflection> {
    provider: P,
    identity_key: String,
}

impl SchemaIntrospector<SchemaReflection> {
    pub fn new() -> Self {
        Self::with_provider(SchemaReflection)
    }
}

impl Default for SchemaIntrospector<SchemaReflection> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ReflectionProvider> SchemaIntrospector<P> {
    pub fn with_provider(provider: P) -> Self {
        Self {
            provider,
            identity_key: DEFAULT_IDENTITY_KEY.to_string(),
        }
    }

    pub fn with_identity_key(mut self, identity_key: &str) -> Self {
        self.identity_key = identity_key.to_string();
        self
    }

    /// 生成扁平字段目录（每次调用重新生成，不缓存）
    pub fn introspect(&self, schema: &RecordSchema) -> WorksheetTypeInfo {
        let mut info = WorksheetTypeInfo {
            record_name: schema.name.clone(),
            top_fields: vec![0],
            all_fields: vec![FlattenedField::new(
                0,
                &self.identity_key,
                FieldKind::Other,
                IDENTITY_TYPE_NAME.to_string(),
            )],
        };

        let mut top_fields = Vec::new();
        self.read_struct(schema, &mut info.all_fields, &mut top_fields);
        info.top_fields.extend(top_fields);

        debug!(
            record = %schema.name,
            top_fields = info.top_fields.len(),
            all_fields = info.all_fields.len(),
            "schema 内省完成"
        );
        info
    }

    fn read_struct(
        &self,
        schema: &RecordSchema,
        all_fields: &mut Vec<FlattenedField>,
        out_indices: &mut Vec<usize>,
    ) {
        for field in self.provider.list_fields(schema, true) {
            if !self.provider.has_marker(field, markers::IMPORT_FROM_XLSX) {
                continue;
            }

            let index = all_fields.len();
            let kind = classify_field(&self.provider, &field.ty);
            let mut flat = FlattenedField::new(index, &field.name, kind, field.ty.type_name());

            if let Some(element) = field.ty.element() {
                flat.element_kind = classify_field(&self.provider, element);
                flat.element_type_name = element.type_name();
            }

            all_fields.push(flat);
            out_indices.push(index);

            // Record / Array<Record> 按标记展开
            let Some(nested) = field.ty.nested_record() else {
                continue;
            };
            if !self
                .provider
                .has_marker(field, markers::SPLIT_STRUCT_IN_XLSX)
            {
                continue;
            }

            let mut child_indices = Vec::new();
            self.read_struct(nested, all_fields, &mut child_indices);
            for &child in &child_indices {
                all_fields[child].parent_index = Some(index);
            }
            all_fields[index].split_struct = true;
            all_fields[index].child_indices = child_indices;
        }
    }
}
