// ==========================================
// 表格记录导入器 - 记录 Schema 模型
// ==========================================
// 职责: 描述记录类型（字段、元数据标记、嵌套记录、继承）
// 用途: 反射提供者的数据源；内省器与导入器只读
// 生命周期: 批次内不可变，通过 Arc 在线程间共享
// ==========================================

use crate::domain::types::{NumericRepr, ScalarType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

// ==========================================
// 元数据标记名
// ==========================================
pub mod markers {
    /// 字段参与表格导入
    pub const IMPORT_FROM_XLSX: &str = "ImportFromXlsx";
    /// 嵌套记录在表格中按列展开
    pub const SPLIT_STRUCT_IN_XLSX: &str = "SplitStructInXlsx";
    /// 缺失时不报告问题
    pub const IMPORT_OPTIONAL: &str = "DataTableImportOptional";
}

// ==========================================
// EnumDef - 枚举定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumVariant {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    pub variants: Vec<EnumVariant>,
}

impl EnumDef {
    pub fn new(name: &str, variants: &[(&str, i64)]) -> Self {
        Self {
            name: name.to_string(),
            variants: variants
                .iter()
                .map(|(n, v)| EnumVariant {
                    name: n.to_string(),
                    value: *v,
                })
                .collect(),
        }
    }

    /// 按符号名查找枚举值，接受 `Variant` 与 `Enum::Variant` 两种写法
    pub fn value_of(&self, symbol: &str) -> Option<i64> {
        let symbol = symbol.trim();
        let short = match symbol.split_once("::") {
            Some((prefix, rest)) if prefix == self.name => rest,
            Some(_) => return None,
            None => symbol,
        };
        self.variants
            .iter()
            .find(|v| v.name == short)
            .map(|v| v.value)
    }

    /// 文本 → 枚举值：先按符号名，再按声明过的序数（如 "5"）
    pub fn resolve(&self, text: &str) -> Option<i64> {
        self.value_of(text).or_else(|| {
            text.trim()
                .parse::<i64>()
                .ok()
                .filter(|v| self.contains_value(*v))
        })
    }

    pub fn contains_value(&self, value: i64) -> bool {
        self.variants.iter().any(|v| v.value == value)
    }
}

// ==========================================
// FieldType - 字段声明类型
// ==========================================
// 说明: Numeric.enum_hint 对应"字节型枚举"，仍归类为 Numeric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    Enum {
        #[serde(rename = "enum")]
        def: Arc<EnumDef>,
    },
    Numeric {
        repr: NumericRepr,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        enum_hint: Option<Arc<EnumDef>>,
    },
    Bool,
    Array {
        element: Box<FieldType>,
    },
    Set {
        element: Box<FieldType>,
    },
    Map {
        key: Box<FieldType>,
        value: Box<FieldType>,
    },
    Record {
        schema: Arc<RecordSchema>,
    },
    Scalar {
        scalar: ScalarType,
    },
}

impl FieldType {
    pub fn numeric(repr: NumericRepr) -> Self {
        FieldType::Numeric {
            repr,
            enum_hint: None,
        }
    }

    pub fn byte_enum(def: Arc<EnumDef>) -> Self {
        FieldType::Numeric {
            repr: NumericRepr::UInt8,
            enum_hint: Some(def),
        }
    }

    pub fn enumeration(def: Arc<EnumDef>) -> Self {
        FieldType::Enum { def }
    }

    pub fn scalar(scalar: ScalarType) -> Self {
        FieldType::Scalar { scalar }
    }

    pub fn array(element: FieldType) -> Self {
        FieldType::Array {
            element: Box::new(element),
        }
    }

    pub fn set(element: FieldType) -> Self {
        FieldType::Set {
            element: Box::new(element),
        }
    }

    pub fn map(key: FieldType, value: FieldType) -> Self {
        FieldType::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn record(schema: Arc<RecordSchema>) -> Self {
        FieldType::Record { schema }
    }

    /// 容器元素类型（Array/Set 的元素，Map 的值）
    pub fn element(&self) -> Option<&FieldType> {
        match self {
            FieldType::Array { element } | FieldType::Set { element } => Some(element),
            FieldType::Map { value, .. } => Some(value),
            _ => None,
        }
    }

    /// 嵌套记录类型（Record 本身或 Array<Record>）
    pub fn nested_record(&self) -> Option<&Arc<RecordSchema>> {
        match self {
            FieldType::Record { schema } => Some(schema),
            FieldType::Array { element } => match element.as_ref() {
                FieldType::Record { schema } => Some(schema),
                _ => None,
            },
            _ => None,
        }
    }

    /// 类型显示名（如 `int32`、`Array<Name>`、`Map<Name, float>`）
    pub fn type_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Enum { def } => write!(f, "{}", def.name),
            FieldType::Numeric { repr, .. } => write!(f, "{}", repr),
            FieldType::Bool => write!(f, "bool"),
            FieldType::Array { element } => write!(f, "Array<{}>", element),
            FieldType::Set { element } => write!(f, "Set<{}>", element),
            FieldType::Map { key, value } => write!(f, "Map<{}, {}>", key, value),
            FieldType::Record { schema } => write!(f, "{}", schema.name),
            FieldType::Scalar { scalar } => write!(f, "{}", scalar),
        }
    }
}

fn default_array_dim() -> usize {
    1
}

// ==========================================
// FieldDescriptor - 字段描述
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: FieldType,

    // 元数据标记（键 → 值，值通常为空串）
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    // 导出列名（缺省为字段名）
    #[serde(default)]
    pub display_name: Option<String>,

    // 备用导入列名
    #[serde(default)]
    pub import_names: Vec<String>,

    // 定长数组长度（1 表示普通字段）
    #[serde(default = "default_array_dim")]
    pub array_dim: usize,
}

impl FieldDescriptor {
    pub fn new(name: &str, ty: FieldType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            metadata: BTreeMap::new(),
            display_name: None,
            import_names: Vec::new(),
            array_dim: 1,
        }
    }

    pub fn with_marker(mut self, marker: &str) -> Self {
        self.metadata.insert(marker.to_string(), String::new());
        self
    }

    pub fn importable(self) -> Self {
        self.with_marker(markers::IMPORT_FROM_XLSX)
    }

    pub fn optional(self) -> Self {
        self.with_marker(markers::IMPORT_OPTIONAL)
    }

    pub fn split(self) -> Self {
        self.with_marker(markers::SPLIT_STRUCT_IN_XLSX)
    }

    pub fn display_name(mut self, name: &str) -> Self {
        self.display_name = Some(name.to_string());
        self
    }

    pub fn import_name(mut self, name: &str) -> Self {
        self.import_names.push(name.to_string());
        self
    }

    pub fn fixed(mut self, array_dim: usize) -> Self {
        self.array_dim = array_dim.max(1);
        self
    }

    /// 导出列名
    pub fn export_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// 可接受的输入键：字段名、导出名、备用名（去重，保持顺序）
    pub fn accepted_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(2 + self.import_names.len());
        let candidates = std::iter::once(self.name.as_str())
            .chain(self.display_name.as_deref())
            .chain(self.import_names.iter().map(String::as_str));
        for candidate in candidates {
            if !names.iter().any(|n| n == candidate) {
                names.push(candidate.to_string());
            }
        }
        names
    }
}

// ==========================================
// RecordSchema - 记录类型
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSchema {
    pub name: String,

    #[serde(default)]
    pub base: Option<Arc<RecordSchema>>,

    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl RecordSchema {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base: None,
            fields: Vec::new(),
        }
    }

    pub fn with_base(mut self, base: Arc<RecordSchema>) -> Self {
        self.base = Some(base);
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// 继承链（根基类在前，自身在最后）
    pub fn inheritance_chain(&self) -> Vec<&RecordSchema> {
        let mut chain = Vec::new();
        let mut current = Some(self);
        while let Some(schema) = current {
            chain.push(schema);
            current = schema.base.as_deref();
        }
        chain.reverse();
        chain
    }

    pub fn into_shared(self) -> Arc<RecordSchema> {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_enum() -> EnumDef {
        EnumDef::new("EColor", &[("Red", 0), ("Green", 1), ("Blue", 4)])
    }

    #[test]
    fn test_enum_lookup() {
        let def = color_enum();
        assert_eq!(def.value_of("Green"), Some(1));
        assert_eq!(def.value_of("EColor::Blue"), Some(4));
        assert_eq!(def.value_of("EOther::Blue"), None);
        assert_eq!(def.value_of("Purple"), None);
        assert_eq!(def.resolve("Blue"), Some(4));
        assert_eq!(def.resolve(" 4 "), Some(4));
        assert_eq!(def.resolve("2"), None);
        assert!(!def.contains_value(2));
    }

    #[test]
    fn test_type_name() {
        let ty = FieldType::map(
            FieldType::scalar(ScalarType::Name),
            FieldType::array(FieldType::numeric(NumericRepr::Float)),
        );
        assert_eq!(ty.type_name(), "Map<Name, Array<float>>");
    }

    #[test]
    fn test_inheritance_chain_base_first() {
        let root = RecordSchema::new("Root").into_shared();
        let mid = RecordSchema::new("Mid").with_base(root).into_shared();
        let leaf = RecordSchema::new("Leaf").with_base(mid);

        let names: Vec<&str> = leaf
            .inheritance_chain()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Root", "Mid", "Leaf"]);
    }

    #[test]
    fn test_schema_from_json() {
        let json = r#"{
            "name": "Item",
            "fields": [
                { "name": "Count", "type": { "type": "numeric", "repr": "int32" },
                  "metadata": { "ImportFromXlsx": "" } },
                { "name": "Tags", "type": { "type": "array",
                  "element": { "type": "scalar", "scalar": "name" } } }
            ]
        }"#;
        let schema: RecordSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.fields[0].array_dim, 1);
        assert!(schema.fields[0].metadata.contains_key(markers::IMPORT_FROM_XLSX));
        assert_eq!(schema.fields[1].ty.type_name(), "Array<Name>");
    }
}
