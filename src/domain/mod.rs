// ==========================================
// 表格记录导入器 - 领域模型层
// ==========================================
// 职责: 定义 schema、输入值树、目标记录、导入问题
// 红线: 不含导入算法,不含表格解析
// ==========================================

pub mod problem;
pub mod record;
pub mod schema;
pub mod types;
pub mod value;

// 重导出核心类型
pub use problem::{EntryContext, ImportProblem, RowImportReport};
pub use record::{FieldValue, RecordInstance};
pub use schema::{markers, EnumDef, EnumVariant, FieldDescriptor, FieldType, RecordSchema};
pub use types::{FieldKind, NumericRepr, ProblemKind, ProblemSeverity, ScalarType};
pub use value::{ValueNode, ValueObject};
