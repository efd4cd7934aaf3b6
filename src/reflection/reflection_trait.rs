// ==========================================
// 表格记录导入器 - 反射提供者 Trait
// ==========================================
// 职责: 定义内省器与导入器所需的反射接口（不包含实现）
// 实现者: SchemaReflection（基于 RecordSchema 的默认实现）
// ==========================================

use crate::domain::record::FieldValue;
use crate::domain::schema::{FieldDescriptor, FieldType, RecordSchema};
use crate::reflection::error::CoercionResult;

// ==========================================
// ReflectionProvider Trait
// ==========================================
pub trait ReflectionProvider: Send + Sync {
    /// 列出记录字段
    ///
    /// # 参数
    /// - schema: 记录类型
    /// - include_inherited: 是否包含基类字段（基类字段在前）
    fn list_fields<'a>(
        &self,
        schema: &'a RecordSchema,
        include_inherited: bool,
    ) -> Vec<&'a FieldDescriptor>;

    /// 字段是否带有指定元数据标记
    fn has_marker(&self, field: &FieldDescriptor, marker: &str) -> bool;

    /// 字段可接受的输入键（按优先级排列）
    fn accepted_names(&self, field: &FieldDescriptor) -> Vec<String>;

    /// 字段导出名（问题文本与列名使用）
    fn export_name<'a>(&self, field: &'a FieldDescriptor) -> &'a str {
        field.export_name()
    }

    /// 通过字符串为字段赋值（字段级）
    fn assign_from_string(
        &self,
        text: &str,
        field: &FieldDescriptor,
        dest: &mut FieldValue,
    ) -> CoercionResult<()>;

    /// 通过字符串为单个槽位赋值（容器条目/映射键）
    fn assign_from_string_direct(
        &self,
        text: &str,
        ty: &FieldType,
        dest: &mut FieldValue,
    ) -> CoercionResult<()>;

    // ===== 类型判定 =====

    fn is_enum(&self, ty: &FieldType) -> bool {
        matches!(ty, FieldType::Enum { .. })
    }

    fn is_numeric(&self, ty: &FieldType) -> bool {
        matches!(ty, FieldType::Numeric { .. })
    }

    fn is_bool(&self, ty: &FieldType) -> bool {
        matches!(ty, FieldType::Bool)
    }

    fn is_array(&self, ty: &FieldType) -> bool {
        matches!(ty, FieldType::Array { .. })
    }

    fn is_set(&self, ty: &FieldType) -> bool {
        matches!(ty, FieldType::Set { .. })
    }

    fn is_map(&self, ty: &FieldType) -> bool {
        matches!(ty, FieldType::Map { .. })
    }

    fn is_record(&self, ty: &FieldType) -> bool {
        matches!(ty, FieldType::Record { .. })
    }
}
