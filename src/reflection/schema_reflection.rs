// ==========================================
// 表格记录导入器 - 基于 RecordSchema 的反射实现
// ==========================================
// 职责: 字段枚举（含继承）、标记查询、列名别名、字符串转换
// ==========================================

use crate::domain::record::FieldValue;
use crate::domain::schema::{FieldDescriptor, FieldType, RecordSchema};
use crate::reflection::error::{CoercionError, CoercionResult};
use crate::reflection::reflection_trait::ReflectionProvider;
use crate::reflection::string_coercion;

#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaReflection;

impl ReflectionProvider for SchemaReflection {
    fn list_fields<'a>(
        &self,
        schema: &'a RecordSchema,
        include_inherited: bool,
    ) -> Vec<&'a FieldDescriptor> {
        if !include_inherited {
            return schema.fields.iter().collect();
        }

        schema
            .inheritance_chain()
            .into_iter()
            .flat_map(|level| level.fields.iter())
            .collect()
    }

    fn has_marker(&self, field: &FieldDescriptor, marker: &str) -> bool {
        field.metadata.contains_key(marker)
    }

    fn accepted_names(&self, field: &FieldDescriptor) -> Vec<String> {
        field.accepted_names()
    }

    fn assign_from_string(
        &self,
        text: &str,
        field: &FieldDescriptor,
        dest: &mut FieldValue,
    ) -> CoercionResult<()> {
        if field.array_dim > 1 {
            return Err(CoercionError::ContainerFromString(format!(
                "{}[{}]",
                field.ty, field.array_dim
            )));
        }
        string_coercion::assign_str(text, &field.ty, dest)
    }

    fn assign_from_string_direct(
        &self,
        text: &str,
        ty: &FieldType,
        dest: &mut FieldValue,
    ) -> CoercionResult<()> {
        string_coercion::assign_str(text, ty, dest)
    }
}
