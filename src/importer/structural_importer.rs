// ==========================================
// 表格记录导入器 - 结构化导入器
// ==========================================
// 职责: 单行值树 → 目标记录（按字段种类分派赋值）
// 流程: 空行检查 → 行标识 → 多余键扫描 → 递归字段赋值 → 汇总 success
// 红线:
// - 问题只追加，结构级问题只终止当前字段，不终止同级字段与整行
// - 容器条目内不允许再嵌套容器（只支持一层）
// - success = 无结构级问题（缺失/多余字段等提示不影响）
// ==========================================

use crate::config::{ImportOptions, ImporterSettings};
use crate::domain::problem::{EntryContext, ImportProblem, RowImportReport};
use crate::domain::record::{FieldValue, RecordInstance};
use crate::domain::schema::{markers, FieldDescriptor, FieldType, RecordSchema};
use crate::domain::types::{FieldKind, ProblemKind};
use crate::domain::value::{ValueNode, ValueObject};
use crate::importer::importer_trait::RowImporter;
use crate::introspector::{classify_field, DEFAULT_IDENTITY_KEY};
use crate::reflection::string_coercion::numeric_value;
use crate::reflection::{CoercionResult, ReflectionProvider, SchemaReflection};
use std::collections::HashSet;
use tracing::debug;

// ==========================================
// RowContext - 单行导入上下文
// ==========================================
struct RowContext {
    row: String,
    problems: Vec<ImportProblem>,
}

impl RowContext {
    fn new(row: &str) -> Self {
        Self {
            row: row.to_string(),
            problems: Vec::new(),
        }
    }

    fn report(&mut self, kind: ProblemKind, at: &Target<'_>, message: String) {
        debug!(
            row = %self.row,
            field = %at.field,
            kind = ?kind,
            message = %message,
            "记录导入问题"
        );
        let problem = ImportProblem::new(&self.row, kind, message)
            .with_field(at.field)
            .with_entry(at.entry.clone());
        self.problems.push(problem);
    }

    fn report_row(&mut self, kind: ProblemKind, message: String) {
        debug!(row = %self.row, kind = ?kind, message = %message, "记录导入问题");
        self.problems
            .push(ImportProblem::new(&self.row, kind, message));
    }

    fn structural_count(&self) -> usize {
        self.problems.iter().filter(|p| p.is_structural()).count()
    }

    fn finish(self) -> RowImportReport {
        let success = !self.problems.iter().any(ImportProblem::is_structural);
        RowImportReport {
            row_name: self.row,
            success,
            problems: self.problems,
        }
    }
}

// ==========================================
// Target - 当前赋值位置
// ==========================================
// entry 非空 = 容器条目（Array/Set/Map/定长数组的元素）
struct Target<'a> {
    field: &'a str,
    descriptor: Option<&'a FieldDescriptor>,
    entry: Option<EntryContext>,
}

impl<'a> Target<'a> {
    fn named(field: &'a str) -> Self {
        Self {
            field,
            descriptor: None,
            entry: None,
        }
    }

    fn field(field: &'a str, descriptor: &'a FieldDescriptor) -> Self {
        Self {
            field,
            descriptor: Some(descriptor),
            entry: None,
        }
    }

    fn entry(&self, entry: EntryContext) -> Self {
        Self {
            field: self.field,
            descriptor: None,
            entry: Some(entry),
        }
    }

    fn in_container(&self) -> bool {
        self.entry.is_some()
    }

    /// 嵌套记录字段的路径前缀（如 `Items[2]`、`Stats`）
    fn nested_prefix(&self) -> String {
        match &self.entry {
            Some(EntryContext::Index(i)) => format!("{}[{}]", self.field, i),
            Some(EntryContext::Key(k)) => format!("{}[{}]", self.field, k),
            None => self.field.to_string(),
        }
    }
}

fn mismatch_message(expected: &str, value: &ValueNode) -> String {
    format!(
        "Incorrect type: expected {}, got {}.",
        expected,
        value.type_name()
    )
}

// 整值且在 i64 范围内的 JSON 数值
fn ordinal_of(value: f64) -> Option<i64> {
    let in_range = value >= i64::MIN as f64 && value <= i64::MAX as f64;
    (value.is_finite() && value.fract() == 0.0 && in_range).then_some(value as i64)
}

fn integer_of(value: &FieldValue) -> Option<i64> {
    match value {
        FieldValue::Int(v) | FieldValue::Enum(v) => Some(*v),
        FieldValue::UInt(v) => i64::try_from(*v).ok(),
        _ => None,
    }
}

// ==========================================
// StructuralImporter
// ==========================================
pub struct StructuralImporter<P: ReflectionProvider = SchemaReflection> {
    provider: P,
    options: ImportOptions,
    identity_key: String,
}

impl StructuralImporter<SchemaReflection> {
    pub fn new() -> Self {
        Self::with_provider(SchemaReflection)
    }

    /// 按导入配置创建（选项 + 行标识键）
    pub fn from_settings(settings: &ImporterSettings) -> Self {
        Self::new()
            .with_options(settings.options)
            .with_identity_key(&settings.identity_key)
    }
}

impl Default for StructuralImporter<SchemaReflection> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ReflectionProvider> StructuralImporter<P> {
    pub fn with_provider(provider: P) -> Self {
        Self {
            provider,
            options: ImportOptions::default(),
            identity_key: DEFAULT_IDENTITY_KEY.to_string(),
        }
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_identity_key(mut self, identity_key: &str) -> Self {
        self.identity_key = identity_key.to_string();
        self
    }

    pub fn identity_key(&self) -> &str {
        &self.identity_key
    }

    // ===== 行级 =====

    /// 扫描未声明的输入键（仅顶层；匹配全部字段的可接受名，含非导入字段）
    fn scan_extra_keys(&self, ctx: &mut RowContext, object: &ValueObject, schema: &RecordSchema) {
        let accepted: HashSet<String> = self
            .provider
            .list_fields(schema, true)
            .into_iter()
            .flat_map(|field| self.provider.accepted_names(field))
            .collect();

        for key in object.keys() {
            if *key == self.identity_key || accepted.contains(key) {
                continue;
            }
            let message = format!(
                "Not found on record type '{}'.",
                schema.name
            );
            ctx.report(ProblemKind::UnknownField, &Target::named(key), message);
        }
    }

    /// 按 schema 逐字段赋值（基类字段在前）
    fn assign_struct(
        &self,
        ctx: &mut RowContext,
        object: &ValueObject,
        schema: &RecordSchema,
        dest: &mut RecordInstance,
        prefix: Option<&str>,
    ) {
        for field in self.provider.list_fields(schema, true) {
            if !self.provider.has_marker(field, markers::IMPORT_FROM_XLSX) {
                continue;
            }

            let export_name = self.provider.export_name(field);
            let path = match prefix {
                Some(prefix) => format!("{}.{}", prefix, export_name),
                None => export_name.to_string(),
            };

            let names = self.provider.accepted_names(field);
            let Some(value) = names.iter().find_map(|name| object.get(name.as_str())) else {
                let optional = self.provider.has_marker(field, markers::IMPORT_OPTIONAL);
                if !optional && !self.options.ignore_missing_fields {
                    let message = "Missing an entry in the row data.".to_string();
                    ctx.report(ProblemKind::MissingField, &Target::named(&path), message);
                }
                continue;
            };

            let at = Target::field(&path, field);
            if field.array_dim > 1 {
                self.assign_fixed_array(ctx, value, field, dest.slot_mut(field), &at);
            } else {
                self.assign_value(ctx, value, &field.ty, dest.slot_mut(field), &at);
            }
        }
    }

    /// 定长数组：长度不符为提示级问题，已有条目照常赋值
    fn assign_fixed_array(
        &self,
        ctx: &mut RowContext,
        value: &ValueNode,
        field: &FieldDescriptor,
        dest: &mut FieldValue,
        at: &Target<'_>,
    ) -> bool {
        let dim = field.array_dim;
        let Some(items) = value.as_array() else {
            ctx.report(
                ProblemKind::TypeMismatch,
                at,
                mismatch_message("Array", value),
            );
            return false;
        };

        if items.len() != dim {
            let message = format!(
                "Expects exactly {} entries, got {}.",
                dim,
                items.len()
            );
            ctx.report(ProblemKind::FixedArrayLength, at, message);
        }

        if !matches!(&*dest, FieldValue::Array(slots) if slots.len() == dim) {
            *dest = FieldValue::default_for_field(field);
        }
        let FieldValue::Array(slots) = dest else {
            return false;
        };

        let mut ok = true;
        for (i, (item, slot)) in items.iter().zip(slots.iter_mut()).enumerate() {
            let entry_at = at.entry(EntryContext::Index(i));
            ok &= self.assign_value(ctx, item, &field.ty, slot, &entry_at);
        }
        ok
    }

    // ===== 分派 =====

    /// 按字段种类分派（容器条目与顶层字段共用，条目内拒绝嵌套容器）
    fn assign_value(
        &self,
        ctx: &mut RowContext,
        value: &ValueNode,
        ty: &FieldType,
        dest: &mut FieldValue,
        at: &Target<'_>,
    ) -> bool {
        let kind = classify_field(&self.provider, ty);

        if at.in_container() && (kind.is_container() || matches!(value, ValueNode::Array(_))) {
            let message = format!(
                "Cannot nest containers: got {} for element type {}.",
                value.type_name(),
                ty
            );
            ctx.report(ProblemKind::NestedContainer, at, message);
            return false;
        }

        match kind {
            FieldKind::Enum => self.assign_enum(ctx, value, ty, dest, at),
            FieldKind::Numeric => self.assign_numeric(ctx, value, ty, dest, at),
            FieldKind::Boolean => self.assign_bool(ctx, value, dest, at),
            FieldKind::Array => self.assign_array(ctx, value, ty, dest, at),
            FieldKind::Set => self.assign_set(ctx, value, ty, dest, at),
            FieldKind::Map => self.assign_map(ctx, value, ty, dest, at),
            FieldKind::Record => self.assign_record(ctx, value, ty, dest, at),
            FieldKind::Other => self.assign_other(ctx, value, ty, dest, at),
        }
    }

    fn assign_enum(
        &self,
        ctx: &mut RowContext,
        value: &ValueNode,
        ty: &FieldType,
        dest: &mut FieldValue,
        at: &Target<'_>,
    ) -> bool {
        let FieldType::Enum { def } = ty else {
            return self.assign_other(ctx, value, ty, dest, at);
        };

        // 先按符号名，再按声明过的序数
        let resolved = match value {
            ValueNode::String(text) => def.resolve(text),
            ValueNode::Number(n) => ordinal_of(*n).filter(|v| def.contains_value(*v)),
            _ => None,
        };

        match resolved {
            Some(v) => {
                *dest = FieldValue::Enum(v);
                true
            }
            None => {
                let message = format!(
                    "Invalid enum value '{}' for {}.",
                    value.describe(),
                    def.name
                );
                ctx.report(ProblemKind::InvalidEnumValue, at, message);
                false
            }
        }
    }

    fn assign_numeric(
        &self,
        ctx: &mut RowContext,
        value: &ValueNode,
        ty: &FieldType,
        dest: &mut FieldValue,
        at: &Target<'_>,
    ) -> bool {
        let FieldType::Numeric { repr, enum_hint } = ty else {
            return self.assign_other(ctx, value, ty, dest, at);
        };

        match (value, enum_hint) {
            (ValueNode::Number(n), _) => match numeric_value(*repr, *n) {
                Ok(converted) => {
                    if let Some(def) = enum_hint {
                        if !integer_of(&converted).is_some_and(|v| def.contains_value(v)) {
                            let message = format!(
                                "Invalid enum value '{}' for {}.",
                                n, def.name
                            );
                            ctx.report(ProblemKind::InvalidEnumValue, at, message);
                            return false;
                        }
                    }
                    *dest = converted;
                    true
                }
                Err(e) => {
                    let message = format!(
                        "Could not be imported from {}: {}.",
                        n, e
                    );
                    ctx.report(ProblemKind::CoercionFailed, at, message);
                    false
                }
            },
            (ValueNode::String(text), Some(def)) => {
                match self.provider.assign_from_string_direct(text, ty, dest) {
                    Ok(()) => true,
                    Err(e) => {
                        let message = format!(
                            "Invalid enum value '{}' for {}: {}.",
                            text, def.name, e
                        );
                        ctx.report(ProblemKind::InvalidEnumValue, at, message);
                        false
                    }
                }
            }
            _ => {
                let expected = if repr.is_integer() { "Integer" } else { "Double" };
                ctx.report(
                    ProblemKind::TypeMismatch,
                    at,
                    mismatch_message(expected, value),
                );
                false
            }
        }
    }

    fn assign_bool(
        &self,
        ctx: &mut RowContext,
        value: &ValueNode,
        dest: &mut FieldValue,
        at: &Target<'_>,
    ) -> bool {
        match value {
            ValueNode::Boolean(b) => {
                *dest = FieldValue::Bool(*b);
                true
            }
            _ => {
                ctx.report(
                    ProblemKind::TypeMismatch,
                    at,
                    mismatch_message("Boolean", value),
                );
                false
            }
        }
    }

    /// 动态数组：整体替换；失败条目保留默认值
    fn assign_array(
        &self,
        ctx: &mut RowContext,
        value: &ValueNode,
        ty: &FieldType,
        dest: &mut FieldValue,
        at: &Target<'_>,
    ) -> bool {
        let (Some(element), Some(items)) = (ty.element(), value.as_array()) else {
            ctx.report(
                ProblemKind::TypeMismatch,
                at,
                mismatch_message("Array", value),
            );
            return false;
        };

        let mut ok = true;
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let mut slot = FieldValue::default_for(element);
            ok &= self.assign_value(ctx, item, element, &mut slot, &at.entry(EntryContext::Index(i)));
            out.push(slot);
        }

        *dest = FieldValue::Array(out);
        ok
    }

    /// 集合：失败条目丢弃，全部插入后重排一次（重复元素不报告问题）
    fn assign_set(
        &self,
        ctx: &mut RowContext,
        value: &ValueNode,
        ty: &FieldType,
        dest: &mut FieldValue,
        at: &Target<'_>,
    ) -> bool {
        let (Some(element), Some(items)) = (ty.element(), value.as_array()) else {
            ctx.report(
                ProblemKind::TypeMismatch,
                at,
                mismatch_message("Array", value),
            );
            return false;
        };

        let mut ok = true;
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let mut slot = FieldValue::default_for(element);
            if self.assign_value(ctx, item, element, &mut slot, &at.entry(EntryContext::Index(i))) {
                out.push(slot);
            } else {
                ok = false;
            }
        }

        FieldValue::rehash_set(&mut out);
        *dest = FieldValue::Set(out);
        ok
    }

    /// 映射：键走通用字符串转换；键或值失败只丢弃该条目
    fn assign_map(
        &self,
        ctx: &mut RowContext,
        value: &ValueNode,
        ty: &FieldType,
        dest: &mut FieldValue,
        at: &Target<'_>,
    ) -> bool {
        let (FieldType::Map { key, value: value_ty }, Some(object)) = (ty, value.as_object()) else {
            ctx.report(
                ProblemKind::TypeMismatch,
                at,
                mismatch_message("Object", value),
            );
            return false;
        };

        let mut ok = true;
        let mut entries = Vec::with_capacity(object.len());
        for (raw_key, item) in object {
            let entry_at = at.entry(EntryContext::Key(raw_key.clone()));

            let mut key_slot = FieldValue::default_for(key);
            if let Err(e) = self
                .provider
                .assign_from_string_direct(raw_key, key, &mut key_slot)
            {
                let message = format!(
                    "Key '{}' could not be converted: {}.",
                    raw_key, e
                );
                ctx.report(ProblemKind::MapKey, &entry_at, message);
                ok = false;
                continue;
            }

            let mut value_slot = FieldValue::default_for(value_ty);
            if self.assign_value(ctx, item, value_ty, &mut value_slot, &entry_at) {
                entries.push((key_slot, value_slot));
            } else {
                ok = false;
            }
        }

        FieldValue::rehash_map(&mut entries);
        *dest = FieldValue::Map(entries);
        ok
    }

    /// 嵌套记录：对象递归赋值；字符串走记录文本转换
    fn assign_record(
        &self,
        ctx: &mut RowContext,
        value: &ValueNode,
        ty: &FieldType,
        dest: &mut FieldValue,
        at: &Target<'_>,
    ) -> bool {
        let FieldType::Record { schema } = ty else {
            return self.assign_other(ctx, value, ty, dest, at);
        };

        match value {
            ValueNode::Object(object) => {
                if !matches!(&*dest, FieldValue::Record(_)) {
                    *dest = FieldValue::Record(RecordInstance::new(schema));
                }
                let FieldValue::Record(record) = dest else {
                    return false;
                };

                let before = ctx.structural_count();
                let prefix = at.nested_prefix();
                self.assign_struct(ctx, object, schema, record, Some(&prefix));
                ctx.structural_count() == before
            }
            ValueNode::String(text) => self.assign_text(ctx, text, ty, dest, at),
            _ => {
                ctx.report(
                    ProblemKind::TypeMismatch,
                    at,
                    mismatch_message("Object", value),
                );
                false
            }
        }
    }

    fn assign_other(
        &self,
        ctx: &mut RowContext,
        value: &ValueNode,
        ty: &FieldType,
        dest: &mut FieldValue,
        at: &Target<'_>,
    ) -> bool {
        match value {
            ValueNode::String(text) => self.assign_text(ctx, text, ty, dest, at),
            _ => {
                ctx.report(
                    ProblemKind::TypeMismatch,
                    at,
                    mismatch_message("String", value),
                );
                false
            }
        }
    }

    /// 通用字符串转换（字段级用 assign_from_string，条目级用 direct 变体）
    fn assign_text(
        &self,
        ctx: &mut RowContext,
        text: &str,
        ty: &FieldType,
        dest: &mut FieldValue,
        at: &Target<'_>,
    ) -> bool {
        let result: CoercionResult<()> = match at.descriptor {
            Some(field) if !at.in_container() => {
                self.provider.assign_from_string(text, field, dest)
            }
            _ => self.provider.assign_from_string_direct(text, ty, dest),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                let message = format!(
                    "Could not be imported from '{}': {}.",
                    text, e
                );
                ctx.report(ProblemKind::CoercionFailed, at, message);
                false
            }
        }
    }
}

impl<P: ReflectionProvider> RowImporter for StructuralImporter<P> {
    fn import_row(
        &self,
        value: &ValueNode,
        schema: &RecordSchema,
        dest: &mut RecordInstance,
    ) -> RowImportReport {
        let row_name = self.row_identity(value);
        let mut ctx = RowContext::new(&row_name);
        debug!(row = %row_name, record = %schema.name, "开始导入行");

        match value {
            ValueNode::Object(object) if object.is_empty() => {
                ctx.report_row(ProblemKind::EmptyInput, "Input data is empty.".to_string());
            }
            ValueNode::Object(object) => {
                if !self.options.ignore_extra_fields {
                    self.scan_extra_keys(&mut ctx, object, schema);
                }
                self.assign_struct(&mut ctx, object, schema, dest, None);
            }
            other => {
                let message = format!("Row data must be an Object, got {}.", other.type_name());
                ctx.report_row(ProblemKind::TypeMismatch, message);
            }
        }

        let report = ctx.finish();
        debug!(
            row = %report.row_name,
            success = report.success,
            problems = report.problems.len(),
            "行导入完成"
        );
        report
    }

    fn row_identity(&self, value: &ValueNode) -> String {
        match value.get(&self.identity_key) {
            Some(ValueNode::String(name)) => name.clone(),
            Some(ValueNode::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{NumericRepr, ScalarType};
    use serde_json::json;

    fn import(schema: &RecordSchema, value: serde_json::Value) -> (RecordInstance, RowImportReport) {
        let mut dest = RecordInstance::new(schema);
        let report = StructuralImporter::new().import_row(&ValueNode::from(value), schema, &mut dest);
        (dest, report)
    }

    #[test]
    fn test_empty_object_fails_fast() {
        let schema = RecordSchema::new("Row").field(
            FieldDescriptor::new("Count", FieldType::numeric(NumericRepr::Int32)).importable(),
        );
        let (_, report) = import(&schema, json!({}));
        assert!(!report.success);
        assert_eq!(report.problems.len(), 1);
        assert_eq!(report.problems[0].kind, ProblemKind::EmptyInput);
        assert_eq!(report.problems[0].message, "Input data is empty.");
    }

    #[test]
    fn test_non_object_row() {
        let schema = RecordSchema::new("Row");
        let (_, report) = import(&schema, json!([1, 2]));
        assert!(!report.success);
        assert_eq!(report.problems[0].kind, ProblemKind::TypeMismatch);
    }

    #[test]
    fn test_numeric_identity_rendered_as_text() {
        let importer = StructuralImporter::new();
        assert_eq!(importer.row_identity(&ValueNode::from(json!({"Name": 42}))), "42");
        assert_eq!(importer.row_identity(&ValueNode::from(json!({"Name": true}))), "");
        assert_eq!(importer.row_identity(&ValueNode::from(json!({"Other": "x"}))), "");
    }

    #[test]
    fn test_non_importable_field_untouched_and_not_extra() {
        let schema = RecordSchema::new("Row")
            .field(FieldDescriptor::new("Count", FieldType::numeric(NumericRepr::Int32)).importable())
            .field(FieldDescriptor::new("Internal", FieldType::scalar(ScalarType::String)));
        let (dest, report) = import(&schema, json!({"Name": "R", "Count": 1, "Internal": "x"}));
        assert!(report.is_clean());
        assert_eq!(dest.get("Internal"), Some(&FieldValue::Str(String::new())));
    }

    #[test]
    fn test_nested_problem_path() {
        let inner = RecordSchema::new("Stats")
            .field(FieldDescriptor::new("Hp", FieldType::numeric(NumericRepr::Int32)).importable())
            .into_shared();
        let schema = RecordSchema::new("Row")
            .field(FieldDescriptor::new("Stats", FieldType::record(inner)).importable());
        let (_, report) = import(&schema, json!({"Name": "R", "Stats": {"Hp": "high"}}));
        assert!(!report.success);
        assert_eq!(report.problems[0].field.as_deref(), Some("Stats.Hp"));
    }
}
