// ==========================================
// Schema 构建器 - 用于集成测试
// ==========================================

use std::sync::Arc;
use xlsx_record_importer::domain::schema::{EnumDef, FieldDescriptor, FieldType, RecordSchema};
use xlsx_record_importer::domain::types::{NumericRepr, ScalarType};

// ==========================================
// RecordBuilder
// ==========================================

pub struct RecordBuilder {
    schema: RecordSchema,
}

impl RecordBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            schema: RecordSchema::new(name),
        }
    }

    pub fn base(mut self, base: Arc<RecordSchema>) -> Self {
        self.schema = self.schema.with_base(base);
        self
    }

    /// 可导入字段
    pub fn field(mut self, name: &str, ty: FieldType) -> Self {
        self.schema = self
            .schema
            .field(FieldDescriptor::new(name, ty).importable());
        self
    }

    /// 可导入且可缺省的字段
    pub fn optional(mut self, name: &str, ty: FieldType) -> Self {
        self.schema = self
            .schema
            .field(FieldDescriptor::new(name, ty).importable().optional());
        self
    }

    /// 可导入且按列展开的记录字段
    pub fn split(mut self, name: &str, ty: FieldType) -> Self {
        self.schema = self
            .schema
            .field(FieldDescriptor::new(name, ty).importable().split());
        self
    }

    /// 不参与导入的字段
    pub fn hidden(mut self, name: &str, ty: FieldType) -> Self {
        self.schema = self.schema.field(FieldDescriptor::new(name, ty));
        self
    }

    /// 自定义描述（别名、定长等）
    pub fn descriptor(mut self, field: FieldDescriptor) -> Self {
        self.schema = self.schema.field(field);
        self
    }

    pub fn build(self) -> RecordSchema {
        self.schema
    }

    pub fn shared(self) -> Arc<RecordSchema> {
        Arc::new(self.schema)
    }
}

// ==========================================
// 常用类型
// ==========================================

pub fn int32() -> FieldType {
    FieldType::numeric(NumericRepr::Int32)
}

pub fn uint8() -> FieldType {
    FieldType::numeric(NumericRepr::UInt8)
}

pub fn float() -> FieldType {
    FieldType::numeric(NumericRepr::Float)
}

pub fn double() -> FieldType {
    FieldType::numeric(NumericRepr::Double)
}

pub fn name() -> FieldType {
    FieldType::scalar(ScalarType::Name)
}

pub fn string() -> FieldType {
    FieldType::scalar(ScalarType::String)
}

pub fn rarity_enum() -> Arc<EnumDef> {
    Arc::new(EnumDef::new(
        "ERarity",
        &[("Common", 0), ("Rare", 1), ("Epic", 2), ("Legendary", 5)],
    ))
}

// ==========================================
// 常用 schema
// ==========================================

/// Stats { Hp: int32, Speed: float }
pub fn stats_schema() -> Arc<RecordSchema> {
    RecordBuilder::new("Stats")
        .field("Hp", int32())
        .field("Speed", float())
        .shared()
}

/// 基类 Entry { Id: int32 }
pub fn entry_base() -> Arc<RecordSchema> {
    RecordBuilder::new("Entry").field("Id", int32()).shared()
}

/// 计数 + 名称数组（最小往返场景）
pub fn count_tags_schema() -> RecordSchema {
    RecordBuilder::new("CountTags")
        .field("Count", int32())
        .field("Tags", FieldType::array(name()))
        .build()
}
