// ==========================================
// 表格记录导入器 - 半结构化值树
// ==========================================
// 用途: 表格桥接层产出、结构化导入器只读的输入
// 红线: 导入核心不修改 ValueNode
// ==========================================

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 对象节点（键唯一，保持插入顺序）
pub type ValueObject = IndexMap<String, ValueNode>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueNode {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<ValueNode>),
    Object(ValueObject),
}

impl ValueNode {
    /// 节点形状名，用于问题描述
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueNode::Null => "Null",
            ValueNode::Boolean(_) => "Boolean",
            ValueNode::Number(_) => "Number",
            ValueNode::String(_) => "String",
            ValueNode::Array(_) => "Array",
            ValueNode::Object(_) => "Object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ValueNode::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ValueNode::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ValueNode]> {
        match self {
            ValueNode::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ValueObject> {
        match self {
            ValueNode::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&ValueNode> {
        self.as_object().and_then(|map| map.get(key))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ValueNode::Null)
    }

    /// 简短的值描述（用于问题文本）
    pub fn describe(&self) -> String {
        match self {
            ValueNode::Null => "null".to_string(),
            ValueNode::Boolean(b) => b.to_string(),
            ValueNode::Number(n) => n.to_string(),
            ValueNode::String(s) => s.clone(),
            ValueNode::Array(items) => format!("[{} items]", items.len()),
            ValueNode::Object(map) => format!("{{{} keys}}", map.len()),
        }
    }
}

impl From<serde_json::Value> for ValueNode {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ValueNode::Null,
            serde_json::Value::Bool(b) => ValueNode::Boolean(b),
            serde_json::Value::Number(n) => ValueNode::Number(n.as_f64().unwrap_or_default()),
            serde_json::Value::String(s) => ValueNode::String(s),
            serde_json::Value::Array(items) => {
                ValueNode::Array(items.into_iter().map(ValueNode::from).collect())
            }
            serde_json::Value::Object(map) => ValueNode::Object(
                map.into_iter()
                    .map(|(k, v)| (k, ValueNode::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ValueNode {
    fn from(value: &str) -> Self {
        ValueNode::String(value.to_string())
    }
}

impl From<f64> for ValueNode {
    fn from(value: f64) -> Self {
        ValueNode::Number(value)
    }
}

impl From<bool> for ValueNode {
    fn from(value: bool) -> Self {
        ValueNode::Boolean(value)
    }
}
