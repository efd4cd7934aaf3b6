// ==========================================
// 表格记录导入器 - 工作表整形层
// ==========================================
// 职责: 内存中的单元格文本 → 行值树（不读取表格文件）
// 依赖: introspector 产出的扁平字段目录
// ==========================================

pub mod error;
pub mod header;
pub mod layout;

pub use error::{WorksheetError, WorksheetResult};
pub use header::column_name;
pub use layout::{shape_grid, BoundColumn, CellMode, ColumnTarget, PathStep, WorksheetLayout};
