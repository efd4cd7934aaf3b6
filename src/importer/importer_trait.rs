// ==========================================
// 表格记录导入器 - 导入 Trait
// ==========================================
// 职责: 定义单行导入与整表导入接口（不包含实现）
// 实现者: StructuralImporter（单行）、SheetImporterImpl（整表）
// ==========================================

use crate::domain::problem::RowImportReport;
use crate::domain::record::RecordInstance;
use crate::domain::schema::RecordSchema;
use crate::domain::value::ValueNode;
use crate::importer::error::ImportResult;
use crate::importer::sheet_importer::SheetImportReport;
use async_trait::async_trait;

// ==========================================
// RowImporter Trait
// ==========================================
// 用途: 单行值树 → 目标记录
// 红线: 问题以数据返回，永不中断整行
pub trait RowImporter: Send + Sync {
    /// 导入单行
    ///
    /// # 参数
    /// - value: 行值树（通常为 Object）
    /// - schema: 目标记录类型
    /// - dest: 调用方持有的目标记录（原地写入）
    ///
    /// # 返回
    /// - RowImportReport: 行标识、success、问题列表
    ///   success 仅在出现结构级问题时为 false
    fn import_row(
        &self,
        value: &ValueNode,
        schema: &RecordSchema,
        dest: &mut RecordInstance,
    ) -> RowImportReport;

    /// 从值树中提取行标识（标识键缺失时为空串）
    fn row_identity(&self, value: &ValueNode) -> String;
}

// ==========================================
// SheetImporter Trait
// ==========================================
// 用途: 整表多行导入（行间并行，结果保持输入顺序）
// 实现者: SheetImporterImpl
#[async_trait]
pub trait SheetImporter: Send + Sync {
    /// 导入多行
    ///
    /// # 参数
    /// - rows: 行值树列表（按表格行顺序）
    ///
    /// # 返回
    /// - Ok(SheetImportReport): 每行的记录与问题、跳过行数、汇总统计
    /// - Err: 行任务异常终止（字段问题不走此路径）
    ///
    /// # 说明
    /// - 每行使用独立的目标记录与问题列表
    /// - 问题总数达到上限后不再派发新行
    async fn import_rows(&self, rows: Vec<ValueNode>) -> ImportResult<SheetImportReport>;
}
