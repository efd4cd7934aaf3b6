// ==========================================
// 表格记录导入器 - 核心库
// ==========================================
// 系统定位: 表格行 → 强类型记录（逐字段校验，问题汇总而非中断）
// 核心: Schema 内省器 + 结构化导入器
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - schema、值树、记录、问题
pub mod domain;

// 反射层 - 字段枚举与字符串转换
pub mod reflection;

// 内省层 - 扁平字段目录
pub mod introspector;

// 导入层 - 单行与整表导入
pub mod importer;

// 工作表整形 - 单元格 → 值树
pub mod worksheet;

// 配置层 - 导入配置
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{FieldKind, NumericRepr, ProblemKind, ProblemSeverity, ScalarType};

// 领域实体
pub use domain::{
    EntryContext, EnumDef, FieldDescriptor, FieldType, FieldValue, ImportProblem,
    RecordInstance, RecordSchema, RowImportReport, ValueNode,
};

// 内省与导入
pub use importer::{
    ImportError, ImportResult, RowImporter, SheetImportReport, SheetImporter, SheetImporterImpl,
    StructuralImporter,
};
pub use introspector::{FlattenedField, SchemaIntrospector, WorksheetTypeInfo};
pub use reflection::{ReflectionProvider, SchemaReflection};

// 配置与工作表
pub use config::{ImportOptions, ImporterSettings};
pub use worksheet::{WorksheetError, WorksheetLayout};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "表格记录导入器";
