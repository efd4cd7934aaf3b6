// ==========================================
// 表格记录导入器 - 内省层
// ==========================================
// 职责: 记录类型 → 扁平字段目录
// 下游: worksheet 模块（列绑定与行整形）、外部桥接层
// ==========================================

pub mod schema_introspector;

pub use schema_introspector::{
    classify_field, FlattenedField, SchemaIntrospector, WorksheetTypeInfo, DEFAULT_IDENTITY_KEY,
};
