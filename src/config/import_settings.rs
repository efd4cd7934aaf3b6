// ==========================================
// 表格记录导入器 - 导入配置
// ==========================================
// 职责: 导入选项、行标识键、表头/数据行位置、错误上限
// 存储: JSON 文件（缺省位于用户配置目录）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::introspector::DEFAULT_IDENTITY_KEY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 配置文件路径环境变量
pub const SETTINGS_PATH_ENV: &str = "XLSX_IMPORTER_SETTINGS";

// 用户配置目录下的子目录与文件名
const SETTINGS_DIR_NAME: &str = "xlsx-record-importer";
const SETTINGS_FILE_NAME: &str = "settings.json";

// ==========================================
// ImportOptions - 单行导入选项
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    pub ignore_extra_fields: bool,   // 不报告未声明的输入键
    pub ignore_missing_fields: bool, // 不报告缺失字段
}

// ==========================================
// ImporterSettings - 导入器配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterSettings {
    pub identity_key: String,  // 行标识键（默认 "Name"）
    pub options: ImportOptions,
    pub header_row: usize,     // 表头行号（1 起）
    pub data_start_row: usize, // 数据起始行号（1 起）
    pub max_errors: usize,     // 问题数达到上限后停止派发新行
}

impl Default for ImporterSettings {
    fn default() -> Self {
        Self {
            identity_key: DEFAULT_IDENTITY_KEY.to_string(),
            options: ImportOptions::default(),
            header_row: 1,
            data_start_row: 2,
            max_errors: 100,
        }
    }
}

impl ImporterSettings {
    /// 从 JSON 文件加载配置（缺省字段取默认值）
    pub fn load<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let path = path.as_ref();
        let read_error = |message: String| ImportError::ConfigReadError {
            path: path.display().to_string(),
            message,
        };

        let content = std::fs::read_to_string(path).map_err(|e| read_error(e.to_string()))?;
        let settings: ImporterSettings =
            serde_json::from_str(&content).map_err(|e| read_error(e.to_string()))?;
        settings.validate()?;

        debug!(path = %path.display(), "导入配置加载完成");
        Ok(settings)
    }

    /// 缺省配置文件路径
    ///
    /// # 优先级
    /// 1. 环境变量 XLSX_IMPORTER_SETTINGS
    /// 2. 用户配置目录/xlsx-record-importer/settings.json
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(SETTINGS_PATH_ENV) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }

        dirs::config_dir().map(|dir| dir.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    /// 从缺省路径加载；文件不存在时返回默认配置
    pub fn load_or_default() -> ImportResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => {
                info!("未找到导入配置文件，使用默认配置");
                Ok(Self::default())
            }
        }
    }

    /// 校验配置取值
    pub fn validate(&self) -> ImportResult<()> {
        if self.identity_key.trim().is_empty() {
            return Err(ImportError::ConfigValueError {
                key: "identity_key".to_string(),
                value: self.identity_key.clone(),
                message: "行标识键不能为空".to_string(),
            });
        }

        if self.header_row == 0 {
            return Err(ImportError::ConfigValueError {
                key: "header_row".to_string(),
                value: self.header_row.to_string(),
                message: "行号从 1 开始".to_string(),
            });
        }

        if self.data_start_row <= self.header_row {
            return Err(ImportError::ConfigValueError {
                key: "data_start_row".to_string(),
                value: self.data_start_row.to_string(),
                message: format!("数据起始行必须大于表头行 {}", self.header_row),
            });
        }

        if self.max_errors == 0 {
            return Err(ImportError::ConfigValueError {
                key: "max_errors".to_string(),
                value: "0".to_string(),
                message: "错误上限至少为 1".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_settings() {
        let settings = ImporterSettings::default();
        assert_eq!(settings.identity_key, "Name");
        assert!(!settings.options.ignore_extra_fields);
        assert!(!settings.options.ignore_missing_fields);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"{{ "options": {{ "ignore_missing_fields": true }}, "max_errors": 5 }}"#
        )
        .unwrap();

        let settings = ImporterSettings::load(temp_file.path()).unwrap();
        assert!(settings.options.ignore_missing_fields);
        assert!(!settings.options.ignore_extra_fields);
        assert_eq!(settings.max_errors, 5);
        assert_eq!(settings.header_row, 1);
    }

    #[test]
    fn test_load_invalid_rows() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, r#"{{ "header_row": 3, "data_start_row": 2 }}"#).unwrap();

        let result = ImporterSettings::load(temp_file.path());
        assert!(matches!(
            result,
            Err(ImportError::ConfigValueError { ref key, .. }) if key == "data_start_row"
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ImporterSettings::load("non_existent_settings.json");
        assert!(matches!(result, Err(ImportError::ConfigReadError { .. })));
    }
}
