// ==========================================
// 表格记录导入器 - 整表导入
// ==========================================
// 职责: 多行并行导入、行标识校验、错误上限截断
// 流程: 分批派发 → 阻塞线程池逐行导入 → 按输入顺序收集 → 标识校验 → 汇总
// 红线:
// - schema 只读共享（Arc），每行独立目标记录与问题列表
// - 问题总数达到上限后不再派发新行，已派发的行照常完成
// ==========================================

use crate::config::ImporterSettings;
use crate::domain::problem::{ImportProblem, RowImportReport};
use crate::domain::record::RecordInstance;
use crate::domain::schema::RecordSchema;
use crate::domain::types::ProblemKind;
use crate::domain::value::ValueNode;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::{RowImporter, SheetImporter};
use crate::importer::structural_importer::StructuralImporter;
use crate::reflection::{ReflectionProvider, SchemaReflection};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

// 默认单批派发行数（取不到 CPU 数时）
const FALLBACK_CONCURRENCY: usize = 4;

// ==========================================
// SheetRowOutcome - 单行导入产物
// ==========================================
#[derive(Debug, Clone)]
pub struct SheetRowOutcome {
    pub index: usize, // 输入中的行序号（0 起）
    pub record: RecordInstance,
    pub report: RowImportReport,
}

// ==========================================
// SheetImportReport - 整表导入结果
// ==========================================
#[derive(Debug, Clone)]
pub struct SheetImportReport {
    pub batch_id: String,
    pub record_name: String,
    pub started_at: DateTime<Utc>,
    pub rows: Vec<SheetRowOutcome>,
    pub skipped_rows: usize, // 因错误上限未派发的行数
    pub elapsed_ms: u64,
}

impl SheetImportReport {
    fn new(record_name: &str) -> Self {
        Self {
            batch_id: Uuid::new_v4().to_string(),
            record_name: record_name.to_string(),
            started_at: Utc::now(),
            rows: Vec::new(),
            skipped_rows: 0,
            elapsed_ms: 0,
        }
    }

    /// 全部问题（按行顺序）
    pub fn problems(&self) -> impl Iterator<Item = &ImportProblem> {
        self.rows.iter().flat_map(|row| row.report.problems.iter())
    }

    pub fn total_problems(&self) -> usize {
        self.rows.iter().map(|row| row.report.problems.len()).sum()
    }

    pub fn structural_count(&self) -> usize {
        self.rows.iter().map(|row| row.report.structural_count()).sum()
    }

    pub fn advisory_count(&self) -> usize {
        self.total_problems() - self.structural_count()
    }

    pub fn success_count(&self) -> usize {
        self.rows.iter().filter(|row| row.report.success).count()
    }

    pub fn failed_count(&self) -> usize {
        self.rows.len() - self.success_count()
    }

    /// 无任何问题且无跳过行
    pub fn is_clean(&self) -> bool {
        self.skipped_rows == 0 && self.total_problems() == 0
    }

    /// 可落库的记录（success 的行）
    pub fn successful_records(&self) -> impl Iterator<Item = &RecordInstance> {
        self.rows
            .iter()
            .filter(|row| row.report.success)
            .map(|row| &row.record)
    }
}

// ==========================================
// SheetImporterImpl
// ==========================================
pub struct SheetImporterImpl<P: ReflectionProvider + 'static = SchemaReflection> {
    importer: Arc<StructuralImporter<P>>,
    schema: Arc<RecordSchema>,
    max_errors: usize,
    concurrency: usize,
}

impl SheetImporterImpl<SchemaReflection> {
    /// 按导入配置创建（选项、行标识键、错误上限）
    pub fn from_settings(schema: Arc<RecordSchema>, settings: &ImporterSettings) -> Self {
        Self::new(StructuralImporter::from_settings(settings), schema)
            .with_max_errors(settings.max_errors)
    }
}

impl<P: ReflectionProvider + 'static> SheetImporterImpl<P> {
    pub fn new(importer: StructuralImporter<P>, schema: Arc<RecordSchema>) -> Self {
        let concurrency = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(FALLBACK_CONCURRENCY);
        Self {
            importer: Arc::new(importer),
            schema,
            max_errors: ImporterSettings::default().max_errors,
            concurrency,
        }
    }

    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors.max(1);
        self
    }

    /// 单批派发行数（至少 1）
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// 行标识校验：空标识为提示级，重复标识为结构级（记在后出现的行上）
    fn check_identity(&self, report: &mut RowImportReport, seen: &mut HashSet<String>) {
        if report.row_name.is_empty() {
            let message = format!(
                "No value for identity key '{}'.",
                self.importer.identity_key()
            );
            report
                .problems
                .push(ImportProblem::new("", ProblemKind::InvalidRowName, message));
            return;
        }

        if !seen.insert(report.row_name.clone()) {
            report.problems.push(ImportProblem::new(
                &report.row_name,
                ProblemKind::DuplicateRowName,
                "Name is already used by an earlier row.",
            ));
            report.success = false;
        }
    }
}

#[async_trait]
impl<P: ReflectionProvider + 'static> SheetImporter for SheetImporterImpl<P> {
    #[instrument(skip(self, rows), fields(record = %self.schema.name))]
    async fn import_rows(&self, rows: Vec<ValueNode>) -> ImportResult<SheetImportReport> {
        let started = Instant::now();
        let total_rows = rows.len();
        let mut report = SheetImportReport::new(&self.schema.name);
        info!(
            batch_id = %report.batch_id,
            rows = total_rows,
            max_errors = self.max_errors,
            "开始导入表格"
        );

        let mut seen = HashSet::new();
        let mut pending = rows.into_iter().enumerate().peekable();

        while pending.peek().is_some() {
            // === 错误上限检查 ===
            if report.total_problems() >= self.max_errors {
                report.skipped_rows = total_rows - report.rows.len();
                warn!(
                    batch_id = %report.batch_id,
                    problems = report.total_problems(),
                    skipped_rows = report.skipped_rows,
                    "问题数达到上限，停止派发新行"
                );
                break;
            }

            // === 派发一批行到阻塞线程池 ===
            let (indices, tasks): (Vec<usize>, Vec<_>) = pending
                .by_ref()
                .take(self.concurrency)
                .map(|(index, row)| {
                    let importer = Arc::clone(&self.importer);
                    let schema = Arc::clone(&self.schema);
                    let task = tokio::task::spawn_blocking(move || {
                        let mut record = RecordInstance::new(&schema);
                        let row_report = importer.import_row(&row, &schema, &mut record);
                        (record, row_report)
                    });
                    (index, task)
                })
                .unzip();

            // === 按输入顺序收集 ===
            let results = join_all(tasks).await;
            for (index, result) in indices.into_iter().zip(results) {
                let (record, mut row_report) = result.map_err(|e| ImportError::TaskError {
                    row: index,
                    message: e.to_string(),
                })?;
                self.check_identity(&mut row_report, &mut seen);
                report.rows.push(SheetRowOutcome {
                    index,
                    record,
                    report: row_report,
                });
            }
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            batch_id = %report.batch_id,
            imported = report.rows.len(),
            success = report.success_count(),
            failed = report.failed_count(),
            structural = report.structural_count(),
            advisory = report.advisory_count(),
            skipped = report.skipped_rows,
            elapsed_ms = report.elapsed_ms,
            "表格导入完成"
        );
        Ok(report)
    }
}
