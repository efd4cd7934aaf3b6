// ==========================================
// 表格记录导入器 - 领域类型定义
// ==========================================
// 职责: 字段种类、数值表示、标量类型、问题分级
// 红线: 全部为封闭集合，分派处必须穷举匹配
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 字段种类 (Field Kind)
// ==========================================
// 内省器与导入器共用的分派标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldKind {
    Enum,    // 枚举类型字段
    Numeric, // 数值（含带枚举提示的字节型）
    Boolean, // 布尔
    Array,   // 动态数组
    Set,     // 集合
    Map,     // 映射
    Record,  // 嵌套记录
    Other,   // 字符串/名称/日期等通用标量
}

impl FieldKind {
    /// 是否为容器种类（容器条目内不允许再嵌套）
    pub fn is_container(&self) -> bool {
        matches!(self, FieldKind::Array | FieldKind::Set | FieldKind::Map)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Enum => write!(f, "ENUM"),
            FieldKind::Numeric => write!(f, "NUMERIC"),
            FieldKind::Boolean => write!(f, "BOOLEAN"),
            FieldKind::Array => write!(f, "ARRAY"),
            FieldKind::Set => write!(f, "SET"),
            FieldKind::Map => write!(f, "MAP"),
            FieldKind::Record => write!(f, "RECORD"),
            FieldKind::Other => write!(f, "OTHER"),
        }
    }
}

// ==========================================
// 数值底层表示 (Numeric Representation)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericRepr {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
}

impl NumericRepr {
    /// 整数表示返回 true，浮点表示返回 false
    pub fn is_integer(&self) -> bool {
        !matches!(self, NumericRepr::Float | NumericRepr::Double)
    }

    /// 整数表示的取值范围（浮点返回 None）
    pub fn integer_range(&self) -> Option<(i128, i128)> {
        match self {
            NumericRepr::Int8 => Some((i8::MIN as i128, i8::MAX as i128)),
            NumericRepr::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            NumericRepr::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            NumericRepr::Int64 => Some((i64::MIN as i128, i64::MAX as i128)),
            NumericRepr::UInt8 => Some((0, u8::MAX as i128)),
            NumericRepr::UInt16 => Some((0, u16::MAX as i128)),
            NumericRepr::UInt32 => Some((0, u32::MAX as i128)),
            NumericRepr::UInt64 => Some((0, u64::MAX as i128)),
            NumericRepr::Float | NumericRepr::Double => None,
        }
    }
}

impl fmt::Display for NumericRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericRepr::Int8 => write!(f, "int8"),
            NumericRepr::Int16 => write!(f, "int16"),
            NumericRepr::Int32 => write!(f, "int32"),
            NumericRepr::Int64 => write!(f, "int64"),
            NumericRepr::UInt8 => write!(f, "uint8"),
            NumericRepr::UInt16 => write!(f, "uint16"),
            NumericRepr::UInt32 => write!(f, "uint32"),
            NumericRepr::UInt64 => write!(f, "uint64"),
            NumericRepr::Float => write!(f, "float"),
            NumericRepr::Double => write!(f, "double"),
        }
    }
}

// ==========================================
// 通用标量类型 (Other 种类的具体类型)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    String,   // 任意文本
    Name,     // 标识名（受限字符集）
    Text,     // 展示文本
    Guid,     // 全局唯一标识
    Date,     // 日期
    DateTime, // 日期时间（UTC）
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::String => write!(f, "String"),
            ScalarType::Name => write!(f, "Name"),
            ScalarType::Text => write!(f, "Text"),
            ScalarType::Guid => write!(f, "Guid"),
            ScalarType::Date => write!(f, "Date"),
            ScalarType::DateTime => write!(f, "DateTime"),
        }
    }
}

// ==========================================
// 问题严重度 (Problem Severity)
// ==========================================
// Structural: 形状/内容错误，行不可落库
// Advisory: 未知列/缺失列等提示，不影响 success
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemSeverity {
    Advisory,
    Structural,
}

impl fmt::Display for ProblemSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemSeverity::Advisory => write!(f, "ADVISORY"),
            ProblemSeverity::Structural => write!(f, "STRUCTURAL"),
        }
    }
}

// ==========================================
// 问题类型 (Problem Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemKind {
    EmptyInput,        // 输入对象为空
    TypeMismatch,      // 形状与声明种类不符
    InvalidEnumValue,  // 枚举名/序数非法
    CoercionFailed,    // 字符串转换失败
    NestedContainer,   // 容器内嵌套容器
    MapKey,            // 映射键转换失败
    UnknownField,      // 输入中出现未声明字段
    MissingField,      // 行缺少必填字段
    FixedArrayLength,  // 定长数组长度不符
    InvalidRowName,    // 行标识为空
    DuplicateRowName,  // 行标识重复
}

impl ProblemKind {
    /// 问题类型对应的严重度
    pub fn severity(&self) -> ProblemSeverity {
        match self {
            ProblemKind::UnknownField
            | ProblemKind::MissingField
            | ProblemKind::FixedArrayLength
            | ProblemKind::InvalidRowName => ProblemSeverity::Advisory,
            ProblemKind::EmptyInput
            | ProblemKind::TypeMismatch
            | ProblemKind::InvalidEnumValue
            | ProblemKind::CoercionFailed
            | ProblemKind::NestedContainer
            | ProblemKind::MapKey
            | ProblemKind::DuplicateRowName => ProblemSeverity::Structural,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_kinds() {
        assert!(FieldKind::Array.is_container());
        assert!(FieldKind::Set.is_container());
        assert!(FieldKind::Map.is_container());
        assert!(!FieldKind::Record.is_container());
        assert!(!FieldKind::Other.is_container());
    }

    #[test]
    fn test_integer_range() {
        assert_eq!(NumericRepr::UInt8.integer_range(), Some((0, 255)));
        assert_eq!(NumericRepr::Double.integer_range(), None);
        assert!(NumericRepr::Int64.is_integer());
        assert!(!NumericRepr::Float.is_integer());
    }

    #[test]
    fn test_problem_severity() {
        assert_eq!(ProblemKind::MissingField.severity(), ProblemSeverity::Advisory);
        assert_eq!(ProblemKind::UnknownField.severity(), ProblemSeverity::Advisory);
        assert_eq!(ProblemKind::TypeMismatch.severity(), ProblemSeverity::Structural);
        assert_eq!(ProblemKind::NestedContainer.severity(), ProblemSeverity::Structural);
    }

    #[test]
    fn test_field_kind_serde() {
        let json = serde_json::to_string(&FieldKind::Numeric).unwrap();
        assert_eq!(json, "\"NUMERIC\"");
    }
}
