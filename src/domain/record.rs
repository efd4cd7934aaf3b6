// ==========================================
// 表格记录导入器 - 目标记录实例
// ==========================================
// 用途: 导入器写入的目标（调用方持有，导入器仅借用可变引用）
// 红线: 嵌套记录由外层记录持有，无独立生命周期
// ==========================================

use crate::domain::schema::{FieldDescriptor, FieldType, RecordSchema};
use crate::domain::types::ScalarType;
use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde_json::json;
use uuid::Uuid;

// ==========================================
// FieldValue - 字段运行时值
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Enum(i64),
    Str(String),
    Guid(Uuid),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Array(Vec<FieldValue>),
    Set(Vec<FieldValue>),
    Map(Vec<(FieldValue, FieldValue)>),
    Record(RecordInstance),
}

impl FieldValue {
    /// 按声明类型生成默认值
    pub fn default_for(ty: &FieldType) -> FieldValue {
        match ty {
            FieldType::Enum { def } => {
                FieldValue::Enum(def.variants.first().map(|v| v.value).unwrap_or(0))
            }
            FieldType::Numeric { repr, .. } => match repr.integer_range() {
                Some((min, _)) if min < 0 => FieldValue::Int(0),
                Some(_) => FieldValue::UInt(0),
                None => FieldValue::Float(0.0),
            },
            FieldType::Bool => FieldValue::Bool(false),
            FieldType::Array { .. } => FieldValue::Array(Vec::new()),
            FieldType::Set { .. } => FieldValue::Set(Vec::new()),
            FieldType::Map { .. } => FieldValue::Map(Vec::new()),
            FieldType::Record { schema } => FieldValue::Record(RecordInstance::new(schema)),
            FieldType::Scalar { scalar } => match scalar {
                ScalarType::String | ScalarType::Name | ScalarType::Text => {
                    FieldValue::Str(String::new())
                }
                ScalarType::Guid => FieldValue::Guid(Uuid::nil()),
                ScalarType::Date => FieldValue::Date(NaiveDate::default()),
                ScalarType::DateTime => FieldValue::DateTime(DateTime::<Utc>::default()),
            },
        }
    }

    /// 字段槽位默认值（定长字段为定长数组）
    pub fn default_for_field(field: &FieldDescriptor) -> FieldValue {
        if field.array_dim > 1 {
            FieldValue::Array(vec![FieldValue::default_for(&field.ty); field.array_dim])
        } else {
            FieldValue::default_for(&field.ty)
        }
    }

    /// 集合重排：相等元素只保留首次出现
    pub fn rehash_set(items: &mut Vec<FieldValue>) {
        let mut unique: Vec<FieldValue> = Vec::with_capacity(items.len());
        for item in items.drain(..) {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        *items = unique;
    }

    /// 映射重排：同键保留首次出现的位置，值取最后一次
    pub fn rehash_map(entries: &mut Vec<(FieldValue, FieldValue)>) {
        let mut unique: Vec<(FieldValue, FieldValue)> = Vec::with_capacity(entries.len());
        for (key, value) in entries.drain(..) {
            match unique.iter_mut().find(|(k, _)| *k == key) {
                Some(existing) => existing.1 = value,
                None => unique.push((key, value)),
            }
        }
        *entries = unique;
    }

    /// 转为 JSON（供 CLI 输出与比对）
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Int(v) => json!(v),
            FieldValue::UInt(v) => json!(v),
            FieldValue::Float(v) => json!(v),
            FieldValue::Bool(v) => json!(v),
            FieldValue::Enum(v) => json!(v),
            FieldValue::Str(v) => json!(v),
            FieldValue::Guid(v) => json!(v.to_string()),
            FieldValue::Date(v) => json!(v.format("%Y-%m-%d").to_string()),
            FieldValue::DateTime(v) => json!(v.to_rfc3339()),
            FieldValue::Array(items) | FieldValue::Set(items) => {
                serde_json::Value::Array(items.iter().map(FieldValue::to_json).collect())
            }
            FieldValue::Map(entries) => {
                let mut map = serde_json::Map::new();
                for (key, value) in entries {
                    let key = match key.to_json() {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    map.insert(key, value.to_json());
                }
                serde_json::Value::Object(map)
            }
            FieldValue::Record(record) => record.to_json(),
        }
    }
}

// ==========================================
// RecordInstance - 记录实例
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct RecordInstance {
    pub schema_name: String,
    values: IndexMap<String, FieldValue>,
}

impl RecordInstance {
    /// 按 schema 创建记录，字段均为默认值（基类字段在前）
    pub fn new(schema: &RecordSchema) -> Self {
        let mut values = IndexMap::new();
        for level in schema.inheritance_chain() {
            for field in &level.fields {
                values.insert(field.name.clone(), FieldValue::default_for_field(field));
            }
        }
        Self {
            schema_name: schema.name.clone(),
            values,
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: &str, value: FieldValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// 字段槽位（不存在时按默认值补齐）
    pub fn slot_mut(&mut self, field: &FieldDescriptor) -> &mut FieldValue {
        self.values
            .entry(field.name.clone())
            .or_insert_with(|| FieldValue::default_for_field(field))
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}
