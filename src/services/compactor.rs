//! # 工具内容压缩引擎
//!
//! 把一条记录参与的全部工具配对的大体积载荷（调用参数、结果正文）
//! 替换为固定占位字符串，显著缩小会话流体积。
//!
//! ## 成功前置门
//! 压缩前检查所有涉及配对的结果正文：命中任何失败指示词
//! （"error"、"failed"、"timeout" 等，大小写不敏感）都会整体中止，
//! 绝不部分压缩——失败的工具往返保留完整现场供排查。
//!
//! 指示词扫描用 `memchr::memmem` 在小写化正文上做 SIMD 加速子串匹配。
//! 纯文本正文里合法出现 "error" 字样会误报并阻止压缩，这是已知的
//! 启发式局限，因此指示词列表通过 [`compact_with_indicators`] 开放给
//! 调用方替换。

use serde_json::Value;

use crate::error::{EditError, ValidationError, Violation};
use crate::models::record::ContentBlock;
use crate::services::index::StreamIndex;
use crate::services::parser::StreamEntry;

/// 压缩后写入工具块的占位字符串
pub const COMPACTION_PLACEHOLDER: &str = "Tool executed successfully";

/// 默认的失败指示词列表（全部小写）
///
/// 结果正文小写化后包含其中任何一个子串即判定工具失败。
pub const DEFAULT_FAILURE_INDICATORS: &[&str] = &[
    "error",
    "failed",
    "exception",
    "traceback",
    "stderr",
    "not found",
    "permission denied",
    "timeout",
    "invalid",
    "unable to",
    "could not",
    "cannot",
    "missing",
];

/// 压缩规划的产物
#[derive(Debug)]
pub struct CompactionPlan {
    /// 完整的流，受影响的记录已重新序列化，其余行原样保留
    pub entries: Vec<StreamEntry>,
    /// 被替换为占位内容的工具块数量
    pub compacted_blocks: usize,
}

/// 用默认失败指示词列表压缩一条记录的工具配对
pub fn compact(
    entries: &[StreamEntry],
    index: &StreamIndex,
    target_record_id: &str,
) -> Result<CompactionPlan, EditError> {
    compact_with_indicators(entries, index, target_record_id, DEFAULT_FAILURE_INDICATORS)
}

/// 用调用方提供的失败指示词列表压缩一条记录的工具配对
///
/// 目标记录可以持有调用块、结果块或两者兼有；它参与的每组配对都会
/// 被整体处理：配对两侧（可能分布在不同记录中）的调用参数和结果
/// 正文一起替换为占位字符串，其余字段与其余记录不受影响。
///
/// # 参数
/// - `entries` - 解析后的完整会话流
/// - `index` - 当前流的树与配对索引
/// - `target_record_id` - 目标记录 ID
/// - `indicators` - 失败指示词列表（应为小写）
///
/// # 错误
/// - 目标记录不存在或不含工具块时返回 `RecordNotFound`
/// - 任何涉及配对的结果正文命中指示词时返回完整违规清单，流保持原样
pub fn compact_with_indicators(
    entries: &[StreamEntry],
    index: &StreamIndex,
    target_record_id: &str,
    indicators: &[&str],
) -> Result<CompactionPlan, EditError> {
    let Some(&target_position) = index.position_by_id.get(target_record_id) else {
        return Err(EditError::RecordNotFound {
            id: target_record_id.to_string(),
        });
    };

    // 目标记录参与的全部调用标识符（自身持有的调用块 + 结果块）
    let Some(target_record) = entries[target_position].record.as_ref() else {
        return Err(EditError::RecordNotFound {
            id: target_record_id.to_string(),
        });
    };
    let mut invocation_ids: Vec<String> = Vec::new();
    for block in target_record.blocks() {
        let id = match block {
            ContentBlock::ToolInvocation(invocation) => &invocation.id,
            ContentBlock::ToolResult(result) => &result.tool_use_id,
            _ => continue,
        };
        if !invocation_ids.iter().any(|known| known == id) {
            invocation_ids.push(id.clone());
        }
    }

    if invocation_ids.is_empty() {
        // 与记录缺失同级：没有可压缩的工具内容
        return Err(EditError::RecordNotFound {
            id: target_record_id.to_string(),
        });
    }

    // ---- 成功前置门：扫描所有涉及配对的结果正文，收集全部违规 ----
    let mut violations = Vec::new();
    for entry in entries {
        let Some(record) = &entry.record else {
            continue;
        };
        for block in record.blocks() {
            let ContentBlock::ToolResult(result) = block else {
                continue;
            };
            if !invocation_ids.contains(&result.tool_use_id) {
                continue;
            }
            let body = result_body_text(&result.content);
            if let Some(indicator) = find_failure_indicator(&body, indicators) {
                violations.push(Violation::FailureIndicator {
                    record_id: record.id.clone(),
                    invocation_id: result.tool_use_id.clone(),
                    indicator: indicator.to_string(),
                });
            }
        }
    }
    if !violations.is_empty() {
        return Err(ValidationError { violations }.into());
    }

    // ---- 替换阶段：配对两侧的工具块载荷统一换成占位字符串 ----
    let mut compacted_blocks = 0;
    let mut survivors = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(record) = &entry.record else {
            survivors.push(entry.clone());
            continue;
        };
        let involved = record.blocks().iter().any(|block| match block {
            ContentBlock::ToolInvocation(invocation) => {
                invocation_ids.contains(&invocation.id)
            }
            ContentBlock::ToolResult(result) => {
                invocation_ids.contains(&result.tool_use_id)
            }
            _ => false,
        });
        if !involved {
            survivors.push(entry.clone());
            continue;
        }

        let mut rewritten = entry.clone();
        if let Some(rewritten_record) = rewritten.record.as_mut() {
            for block in rewritten_record.blocks_mut() {
                match block {
                    ContentBlock::ToolInvocation(invocation)
                        if invocation_ids.contains(&invocation.id) =>
                    {
                        invocation.input = Value::String(COMPACTION_PLACEHOLDER.to_string());
                        compacted_blocks += 1;
                    }
                    ContentBlock::ToolResult(result)
                        if invocation_ids.contains(&result.tool_use_id) =>
                    {
                        result.content = Value::String(COMPACTION_PLACEHOLDER.to_string());
                        compacted_blocks += 1;
                    }
                    _ => {}
                }
            }
        }
        rewritten.sync_raw()?;
        survivors.push(rewritten);
    }

    Ok(CompactionPlan {
        entries: survivors,
        compacted_blocks,
    })
}

/// 从结果块的 content 字段提取可检查的正文文本
///
/// 兼容两种格式：
/// - 字符串：直接使用
/// - 嵌套内容块数组：拼接所有 text 字段
fn result_body_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let mut buf = String::new();
            for item in items {
                if let Some(t) = item.get("text").and_then(|v| v.as_str()) {
                    if !buf.is_empty() {
                        buf.push('\n');
                    }
                    buf.push_str(t);
                }
            }
            buf
        }
        _ => String::new(),
    }
}

/// 在正文中查找第一个命中的失败指示词
///
/// 正文先整体小写化，再用 memmem 逐词扫描。
fn find_failure_indicator<'a>(body: &str, indicators: &[&'a str]) -> Option<&'a str> {
    let lowered = body.to_lowercase();
    indicators
        .iter()
        .find(|indicator| memchr::memmem::find(lowered.as_bytes(), indicator.as_bytes()).is_some())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResultStatus;
    use crate::services::parser::parse_stream;

    fn run(content: &str, target: &str) -> Result<CompactionPlan, EditError> {
        let entries = parse_stream(content);
        let index = StreamIndex::build(&entries);
        compact(&entries, &index, target)
    }

    fn paired_stream(result_body: &str) -> String {
        let invocation = r#"{"id":"A","kind":"assistant","content":[{"type":"text","text":"running"},{"type":"tool_use","id":"toolu_1","name":"Bash","input":{"command":"cargo check"}}]}"#;
        let result = format!(
            r#"{{"id":"R","parentId":"A","kind":"user","content":[{{"type":"tool_result","tool_use_id":"toolu_1","content":"{}"}}]}}"#,
            result_body
        );
        format!("{invocation}\n{result}\n")
    }

    #[test]
    fn test_compacts_both_sides_of_the_pair() {
        // 目标是结果侧记录：配对的调用侧（另一条记录）同时被压缩
        let plan = run(&paired_stream("Finished in 2.1s"), "R").unwrap();
        assert_eq!(plan.compacted_blocks, 2);

        let invocation = plan.entries[0].record.as_ref().unwrap();
        match &invocation.blocks()[1] {
            ContentBlock::ToolInvocation(b) => {
                assert_eq!(b.input, Value::String(COMPACTION_PLACEHOLDER.into()));
            }
            other => panic!("unexpected block: {other:?}"),
        }
        let result = plan.entries[1].record.as_ref().unwrap();
        match &result.blocks()[0] {
            ContentBlock::ToolResult(b) => {
                assert_eq!(b.content, Value::String(COMPACTION_PLACEHOLDER.into()));
            }
            other => panic!("unexpected block: {other:?}"),
        }
    }

    #[test]
    fn test_failure_indicator_aborts_whole_compaction() {
        let err = run(&paired_stream("command FAILED with status 1"), "A").unwrap_err();
        assert_eq!(err.status(), ResultStatus::ValidationError);
        assert_eq!(
            err.violations(),
            &[Violation::FailureIndicator {
                record_id: "R".into(),
                invocation_id: "toolu_1".into(),
                indicator: "failed".into(),
            }]
        );
    }

    #[test]
    fn test_indicator_match_is_case_insensitive() {
        for body in ["Permission Denied", "TIMEOUT waiting", "Unable To open"] {
            assert!(run(&paired_stream(body), "A").is_err(), "body: {body}");
        }
    }

    #[test]
    fn test_untouched_blocks_and_records_survive_verbatim() {
        let extra_line = r#"{"id":"Z","kind":"user","content":"unrelated","cwd":"/w"}"#;
        let content = format!("{}{}\n", paired_stream("done"), extra_line);
        let plan = run(&content, "A").unwrap();
        // 无关记录按原始字节保留
        assert!(plan.entries.iter().any(|e| e.raw == extra_line));
        // 目标记录中的文本块不受影响
        let invocation = plan.entries[0].record.as_ref().unwrap();
        match &invocation.blocks()[0] {
            ContentBlock::Text(b) => assert_eq!(b.text, "running"),
            other => panic!("unexpected block: {other:?}"),
        }
    }

    #[test]
    fn test_nested_result_body_is_gated() {
        let content = concat!(
            r#"{"id":"A","kind":"assistant","content":[{"type":"tool_use","id":"toolu_1","name":"Read","input":{}}]}"#,
            "\n",
            r#"{"id":"R","kind":"user","content":[{"type":"tool_result","tool_use_id":"toolu_1","content":[{"type":"text","text":"file NOT FOUND"}]}]}"#,
            "\n",
        );
        let err = run(content, "A").unwrap_err();
        assert_eq!(err.violations().len(), 1);
    }

    #[test]
    fn test_multiple_pairs_gate_collects_all_violations() {
        let content = concat!(
            r#"{"id":"A","kind":"assistant","content":[{"type":"tool_use","id":"toolu_1","name":"Bash","input":{}},{"type":"tool_use","id":"toolu_2","name":"Bash","input":{}}]}"#,
            "\n",
            r#"{"id":"R1","kind":"user","content":[{"type":"tool_result","tool_use_id":"toolu_1","content":"error: exit 1"}]}"#,
            "\n",
            r#"{"id":"R2","kind":"user","content":[{"type":"tool_result","tool_use_id":"toolu_2","content":"timeout after 30s"}]}"#,
            "\n",
        );
        let err = run(content, "A").unwrap_err();
        // 两组配对的违规一次性全部报告，流保持原样
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn test_incomplete_pair_compacts_invocation_only() {
        let content = concat!(
            r#"{"id":"A","kind":"assistant","content":[{"type":"tool_use","id":"toolu_1","name":"Bash","input":{"command":"ls"}}]}"#,
            "\n",
        );
        let plan = run(content, "A").unwrap();
        assert_eq!(plan.compacted_blocks, 1);
    }

    #[test]
    fn test_unknown_record_is_not_found() {
        let err = run(&paired_stream("ok"), "nope").unwrap_err();
        assert_eq!(err.status(), ResultStatus::NotFound);
    }

    #[test]
    fn test_record_without_tool_blocks_is_not_found() {
        let content = r#"{"id":"A","kind":"user","content":[{"type":"text","text":"hi"}]}"#;
        let err = run(&format!("{content}\n"), "A").unwrap_err();
        assert_eq!(err.status(), ResultStatus::NotFound);
    }
}
