// ==========================================
// 表格记录导入器 - 字符串转换错误类型
// ==========================================
// 工具: thiserror 派生宏
// 用途: 通用字符串转换失败的具体原因，由导入器附加到问题文本
// ==========================================

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    // ===== 数值 =====
    #[error("'{text}' is not a valid {repr}")]
    InvalidNumber { text: String, repr: String },

    #[error("value {value} is out of range for {repr}")]
    OutOfRange { value: String, repr: String },

    #[error("value {value} is not an integer")]
    NotIntegral { value: String },

    // ===== 布尔 / 枚举 =====
    #[error("'{0}' is not a valid bool (expected true or false)")]
    InvalidBool(String),

    #[error("'{text}' is not a value of enum {enum_name}")]
    InvalidEnum { text: String, enum_name: String },

    // ===== 标量 =====
    #[error("'{0}' contains characters not allowed in a Name")]
    InvalidName(String),

    #[error("'{text}' is not a valid Guid: {message}")]
    InvalidGuid { text: String, message: String },

    #[error("'{0}' is not a valid Date (expected YYYYMMDD or YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("'{0}' is not a valid DateTime")]
    InvalidDateTime(String),

    // ===== 记录文本 =====
    #[error("malformed record text '{text}': {message}")]
    RecordText { text: String, message: String },

    #[error("record {record} has no field '{field}'")]
    UnknownRecordField { record: String, field: String },

    #[error("field '{field}': {source}")]
    RecordField {
        field: String,
        #[source]
        source: Box<CoercionError>,
    },

    // ===== 容器 =====
    #[error("{0} cannot be assigned from a string")]
    ContainerFromString(String),
}

/// Result 类型别名
pub type CoercionResult<T> = Result<T, CoercionError>;
