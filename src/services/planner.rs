//! # 删除规划器
//!
//! 对一批请求删除的记录 ID 执行两阶段处理：
//!
//! 1. **校验**：思考块记录、压缩边界记录、被拆散的工具配对都会阻止
//!    整个删除请求。校验运行到底，把全部违规一次性收集后整体报告，
//!    绝不部分删除。
//! 2. **过滤 + 重新挂接**：按**原始流序**输出存活行；父记录被删除的
//!    存活记录沿原始流序向前回溯，跳过其他被删记录，找到新的挂接点。
//!
//! ## 压缩边界规则
//! 回溯遇到 summary 记录立即停止：summary 代表一个剪切点，它之前的
//! 祖先关系不能直接推断。有 `leafId` 时挂到 `leafId`，否则清空父引用
//! （记录成为根）。回溯穷尽整条流也清空父引用。

use std::collections::HashSet;

use crate::error::{EditError, ValidationError, Violation};
use crate::services::index::StreamIndex;
use crate::services::parser::StreamEntry;

/// 删除规划的产物：过滤并重新挂接后的新流
#[derive(Debug)]
pub struct DeletionPlan {
    /// 存活的行，保持原始顺序；被改写过父引用的记录已重新序列化
    pub entries: Vec<StreamEntry>,
    /// 实际移除的记录条数
    pub deleted: usize,
    /// 父引用被改写的存活记录条数
    pub reparented: usize,
}

/// 校验并规划一次批量删除
///
/// 请求中不存在于流内的 ID 不视为错误（对它们的删除是空操作）。
///
/// # 参数
/// - `entries` - 解析后的完整会话流
/// - `index` - 当前流的树与配对索引
/// - `requested` - 请求删除的记录 ID 集合
///
/// # 错误
/// 任何校验违规都会以完整清单的形式整体返回，流保持原样
pub fn plan_deletion(
    entries: &[StreamEntry],
    index: &StreamIndex,
    requested: &HashSet<String>,
) -> Result<DeletionPlan, EditError> {
    let mut violations = Vec::new();

    // ---- 校验阶段 1：逐条检查被请求记录的不可删除属性 ----
    for entry in entries {
        let Some(record) = &entry.record else {
            continue;
        };
        if !requested.contains(&record.id) {
            continue;
        }
        if record.has_thinking() {
            violations.push(Violation::ThinkingRecord {
                id: record.id.clone(),
            });
        }
        if record.is_summary() {
            violations.push(Violation::SummaryRecord {
                id: record.id.clone(),
            });
        }
    }

    // ---- 校验阶段 2：检查工具配对是否被拆散 ----
    // 只有一侧被请求、另一侧存在却未被请求时违规；配对不完整
    // （结果缺失）时允许单独删除调用侧。
    for pair in &index.pairs {
        let Some(result_record_id) = &pair.result_record_id else {
            continue;
        };
        let invocation_requested = requested.contains(&pair.invocation_record_id);
        let result_requested = requested.contains(result_record_id);
        if invocation_requested != result_requested {
            let (requested_id, partner_id) = if invocation_requested {
                (pair.invocation_record_id.clone(), result_record_id.clone())
            } else {
                (result_record_id.clone(), pair.invocation_record_id.clone())
            };
            violations.push(Violation::BrokenPair {
                invocation_id: pair.invocation_id.clone(),
                requested_id,
                partner_id,
            });
        }
    }

    if !violations.is_empty() {
        return Err(ValidationError { violations }.into());
    }

    // 实际会被删除的 ID：请求集与流内已解析记录的交集
    let deleted_ids: HashSet<&str> = entries
        .iter()
        .filter_map(|e| e.record.as_ref())
        .filter(|r| requested.contains(&r.id))
        .map(|r| r.id.as_str())
        .collect();

    // ---- 过滤 + 重新挂接，按原始流序处理 ----
    let mut survivors = Vec::with_capacity(entries.len());
    let mut reparented = 0;

    for (position, entry) in entries.iter().enumerate() {
        let Some(record) = &entry.record else {
            // 未解析行永远存活
            survivors.push(entry.clone());
            continue;
        };

        if deleted_ids.contains(record.id.as_str()) {
            continue;
        }

        let parent_deleted = record
            .parent_id
            .as_deref()
            .is_some_and(|pid| deleted_ids.contains(pid));

        if !parent_deleted {
            survivors.push(entry.clone());
            continue;
        }

        // 父记录被删除：沿原始流序回溯寻找新挂接点
        let new_parent = relink_target(entries, position, &deleted_ids);
        let mut rewritten = entry.clone();
        if let Some(r) = rewritten.record.as_mut() {
            r.parent_id = new_parent;
        }
        rewritten.sync_raw()?;
        survivors.push(rewritten);
        reparented += 1;
    }

    Ok(DeletionPlan {
        entries: survivors,
        deleted: deleted_ids.len(),
        reparented,
    })
}

/// 从 `position` 沿原始流序向前回溯，决定新的父引用
///
/// - 被删除的记录：跳过，继续回溯
/// - summary 记录：停止；有 `leafId` 挂到 `leafId`，否则清空父引用
/// - 其他存活记录：停止，挂到该记录
/// - 回溯穷尽：清空父引用（记录成为根）
///
/// 回溯必须基于**原始**流序而非过滤后的列表，否则跨越多条连续
/// 被删记录时会得到不同的挂接结果。
fn relink_target(
    entries: &[StreamEntry],
    position: usize,
    deleted_ids: &HashSet<&str>,
) -> Option<String> {
    for prior in entries[..position].iter().rev() {
        let Some(record) = &prior.record else {
            continue;
        };
        if deleted_ids.contains(record.id.as_str()) {
            continue;
        }
        if record.is_summary() {
            // 压缩边界：只能经由 leafId 跨越
            return record.leaf_id.clone();
        }
        return Some(record.id.clone());
    }
    None
}
