// ==========================================
// 表格记录导入器 - 导入层
// ==========================================
// 职责: 行值树 → 目标记录（单行结构化导入 + 整表批量导入）
// 问题: 字段级问题作为数据返回；基础设施失败走 ImportError
// ==========================================

// 模块声明
pub mod error;
pub mod importer_trait;
pub mod input_loader;
pub mod sheet_importer;
pub mod structural_importer;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use input_loader::{load_rows, load_schema, parse_rows, RowsInput};
pub use sheet_importer::{SheetImportReport, SheetImporterImpl, SheetRowOutcome};
pub use structural_importer::StructuralImporter;

// 重导出 Trait 接口
pub use importer_trait::{RowImporter, SheetImporter};
