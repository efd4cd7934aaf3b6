// ==========================================
// 表格记录导入器 - 配置层
// ==========================================
// 职责: 导入选项与导入器配置的加载、校验
// 存储: JSON 配置文件
// ==========================================

pub mod import_settings;

// 重导出核心配置
pub use import_settings::{ImportOptions, ImporterSettings, SETTINGS_PATH_ENV};
