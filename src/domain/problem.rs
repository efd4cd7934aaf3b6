// ==========================================
// 表格记录导入器 - 导入问题模型
// ==========================================
// 用途: 导入器向调用方汇报的问题（数据，而非异常）
// 红线: 只追加，不中断整行导入
// ==========================================

use crate::domain::types::{ProblemKind, ProblemSeverity};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// EntryContext - 容器条目定位
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum EntryContext {
    Index(usize), // Array/Set/定长数组的位置
    Key(String),  // Map 的键
}

impl fmt::Display for EntryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryContext::Index(i) => write!(f, "entry {}", i),
            EntryContext::Key(k) => write!(f, "key '{}'", k),
        }
    }
}

// ==========================================
// ImportProblem - 单条问题
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportProblem {
    pub row: String,
    pub field: Option<String>,
    pub entry: Option<EntryContext>,
    pub kind: ProblemKind,
    pub message: String,
}

impl ImportProblem {
    pub fn new(row: &str, kind: ProblemKind, message: impl Into<String>) -> Self {
        Self {
            row: row.to_string(),
            field: None,
            entry: None,
            kind,
            message: message.into(),
        }
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    pub fn with_entry(mut self, entry: Option<EntryContext>) -> Self {
        self.entry = entry;
        self
    }

    pub fn severity(&self) -> ProblemSeverity {
        self.kind.severity()
    }

    pub fn is_structural(&self) -> bool {
        self.severity() == ProblemSeverity::Structural
    }
}

impl fmt::Display for ImportProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] Row '{}'", self.severity(), self.row)?;
        if let Some(field) = &self.field {
            write!(f, ", property '{}'", field)?;
        }
        if let Some(entry) = &self.entry {
            write!(f, ", {}", entry)?;
        }
        write!(f, ": {}", self.message)
    }
}

// ==========================================
// RowImportReport - 单行导入结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowImportReport {
    pub row_name: String,
    pub success: bool,
    pub problems: Vec<ImportProblem>,
}

impl RowImportReport {
    pub fn structural_count(&self) -> usize {
        self.problems.iter().filter(|p| p.is_structural()).count()
    }

    pub fn advisory_count(&self) -> usize {
        self.problems.len() - self.structural_count()
    }

    /// 无任何问题（含提示级）
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_display_with_entry() {
        let problem = ImportProblem::new("Row1", ProblemKind::TypeMismatch, "Expected Integer, got String.")
            .with_field("Counts")
            .with_entry(Some(EntryContext::Index(2)));
        assert_eq!(
            problem.to_string(),
            "[STRUCTURAL] Row 'Row1', property 'Counts', entry 2: Expected Integer, got String."
        );
    }

    #[test]
    fn test_problem_display_with_key() {
        let problem = ImportProblem::new("Row1", ProblemKind::MapKey, "bad key")
            .with_field("Weights")
            .with_entry(Some(EntryContext::Key("k1".into())));
        assert!(problem.to_string().contains("key 'k1'"));
    }

    #[test]
    fn test_report_counts() {
        let report = RowImportReport {
            row_name: "Row1".into(),
            success: false,
            problems: vec![
                ImportProblem::new("Row1", ProblemKind::MissingField, "missing"),
                ImportProblem::new("Row1", ProblemKind::CoercionFailed, "bad"),
            ],
        };
        assert_eq!(report.structural_count(), 1);
        assert_eq!(report.advisory_count(), 1);
        assert!(!report.is_clean());
    }
}
