// ==========================================
// 表格记录导入器 - 反射层
// ==========================================
// 职责: 为内省器与导入器提供字段枚举、标记、别名与字符串转换
// ==========================================

pub mod error;
pub mod reflection_trait;
pub mod schema_reflection;
pub mod string_coercion;

pub use error::{CoercionError, CoercionResult};
pub use reflection_trait::ReflectionProvider;
pub use schema_reflection::SchemaReflection;
