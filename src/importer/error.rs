// ==========================================
// 表格记录导入器 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 字段级问题以 ImportProblem 数据返回，不走此错误类型；
//       此处仅覆盖文件、配置、任务调度等基础设施失败
// ==========================================

use crate::worksheet::WorksheetError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("JSON 解析失败: {0}")]
    JsonParseError(String),

    // ===== 输入数据错误 =====
    #[error("schema 加载失败 ({path}): {message}")]
    SchemaLoadError { path: String, message: String },

    #[error("行数据格式错误: {0}")]
    RowsFormatError(String),

    #[error("工作表整形失败: {0}")]
    Worksheet(#[from] WorksheetError),

    // ===== 配置错误 =====
    #[error("配置读取失败 ({path}): {message}")]
    ConfigReadError { path: String, message: String },

    #[error("配置值错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 任务错误 =====
    #[error("行导入任务失败 (行 {row}): {message}")]
    TaskError { row: usize, message: String },
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::JsonParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
