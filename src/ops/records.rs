//! # 记录变更操作
//!
//! 编辑引擎对外的两个变更入口：
//! - `delete_records` - 批量删除记录（校验 + 重新挂接 + 持久化）
//! - `compact_record` - 压缩一条记录的工具配对内容
//!
//! 每个操作都是一次独立的同步流水线：读流 → 建索引 → 校验 → 变更 →
//! 备份 → 覆写，结束后不保留任何内存状态。同一路径上的并发变更
//! 需要由调用方串行化。

use std::collections::HashSet;

use crate::config::{Clock, StoreConfig};
use crate::error::EditError;
use crate::models::outcome::{CompactionOutcome, DeletionOutcome};
use crate::services::index::StreamIndex;
use crate::services::{compactor, parser, planner, writer};

/// 从一条会话流中批量删除记录
///
/// 校验全部通过后才发生任何变更；孤儿后代会沿原始流序重新挂接，
/// 压缩边界只能经由 `leafId` 跨越。变更前自动创建备份。
///
/// # 参数
/// - `config` - 存储配置（根目录）
/// - `clock` - 备份时间戳来源
/// - `project` - 项目目录名（编码形式）
/// - `stream_id` - 会话流 ID
/// - `record_ids` - 请求删除的记录 ID 列表
///
/// # 返回值
/// 删除统计与备份路径
///
/// # 错误
/// 流不存在、校验违规（完整清单）、或备份 / 写入失败
pub async fn delete_records(
    config: &StoreConfig,
    clock: &dyn Clock,
    project: &str,
    stream_id: &str,
    record_ids: &[String],
) -> Result<DeletionOutcome, EditError> {
    let path = config.stream_path(project, stream_id);
    let entries = parser::read_stream(&path).await?;
    let index = StreamIndex::build(&entries);

    // HashSet 保证批量请求的 O(1) 查找
    let requested: HashSet<String> = record_ids.iter().cloned().collect();
    let plan = planner::plan_deletion(&entries, &index, &requested)?;

    let backup = writer::persist(&path, &plan.entries, clock).await?;

    Ok(DeletionOutcome {
        deleted: plan.deleted,
        remaining: plan.entries.len(),
        reparented: plan.reparented,
        backup_path: backup.display(),
    })
}

/// 压缩一条记录参与的全部工具配对
///
/// 所有配对的结果正文通过失败指示词检查后，配对两侧的调用参数和
/// 结果正文统一替换为占位字符串。变更前自动创建备份。
///
/// # 参数
/// - `config` - 存储配置（根目录）
/// - `clock` - 备份时间戳来源
/// - `project` - 项目目录名（编码形式）
/// - `stream_id` - 会话流 ID
/// - `record_id` - 目标记录 ID
///
/// # 返回值
/// 压缩统计与备份路径
///
/// # 错误
/// 流 / 记录不存在、指示词命中（完整清单）、或备份 / 写入失败
pub async fn compact_record(
    config: &StoreConfig,
    clock: &dyn Clock,
    project: &str,
    stream_id: &str,
    record_id: &str,
) -> Result<CompactionOutcome, EditError> {
    let path = config.stream_path(project, stream_id);
    let entries = parser::read_stream(&path).await?;
    let index = StreamIndex::build(&entries);

    let plan = compactor::compact(&entries, &index, record_id)?;

    let backup = writer::persist(&path, &plan.entries, clock).await?;

    Ok(CompactionOutcome {
        compacted_blocks: plan.compacted_blocks,
        backup_path: backup.display(),
    })
}
