// ==========================================
// 表格记录导入器 - 工作表整形错误类型
// ==========================================
// 工具: thiserror 派生宏
// 定位: 列字母 + 行号（与表格软件一致，如 B1、AA7）
// ==========================================

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorksheetError {
    #[error("表头行 {row} 不存在（工作表共 {rows} 行）")]
    HeaderRowMissing { row: usize, rows: usize },

    #[error("单元格 {column}{row} 表头重复: '{header}'")]
    DuplicateHeader {
        column: String,
        row: usize,
        header: String,
    },

    #[error("单元格 {column}{row} 表头无效 '{header}': {reason}")]
    InvalidHeader {
        column: String,
        row: usize,
        header: String,
        reason: String,
    },

    #[error("单元格 {column}{row} 表头 '{header}' 指向记录内的容器字段 '{field}'，记录内不支持数组")]
    ArrayInRecord {
        column: String,
        row: usize,
        header: String,
        field: String,
    },

    #[error("单元格 {column}{row} 无法解析为 JSON: {message}")]
    InvalidCell {
        column: String,
        row: usize,
        message: String,
    },
}

/// Result 类型别名
pub type WorksheetResult<T> = Result<T, WorksheetError>;
