//! # 树与配对索引
//!
//! 对解析后的记录序列做一次线性扫描，建立两类结构关系：
//! - 祖先查询：记录 ID → 流中位置
//! - 工具配对：调用标识符 → 持有调用块的记录，以及（可能缺失的）
//!   持有结果块的记录
//!
//! 索引只服务于当前这一次操作：记录集每次变化后都重新构建，不持久化。
//! 调用标识符在单条流中唯一，配对用普通 HashMap 即可。

use std::collections::HashMap;

use crate::models::record::ContentBlock;
use crate::services::parser::StreamEntry;

/// 一组工具调用 / 结果配对
///
/// `result_record_id` 缺失表示配对不完整：调用已出现，匹配的结果
/// 还没有写入流中（或永远不会写入）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPair {
    /// 调用标识符（tool_use 块的 id / tool_result 块的 tool_use_id）
    pub invocation_id: String,
    /// 持有调用块的记录 ID
    pub invocation_record_id: String,
    /// 持有结果块的记录 ID；无匹配结果时缺失
    pub result_record_id: Option<String>,
}

/// 会话流的树与配对索引
#[derive(Debug, Default)]
pub struct StreamIndex {
    /// 记录 ID → 该记录在流中的条目下标
    pub position_by_id: HashMap<String, usize>,
    /// 调用标识符 → 持有调用块的记录 ID
    pub invocation_owner: HashMap<String, String>,
    /// 流中全部配对，按调用块出现顺序排列
    pub pairs: Vec<ToolPair>,
    /// 调用标识符 → `pairs` 下标，供 O(1) 配对查询
    pair_index: HashMap<String, usize>,
}

impl StreamIndex {
    /// 对记录序列做单次线性扫描，构建完整索引
    ///
    /// 未解析的行不产生任何索引条目。结果块先于调用块出现
    /// （违反流顺序约束）时不建立配对，该结果块视为无主。
    /// 同一调用标识符出现多个结果块时，只记第一个。
    pub fn build(entries: &[StreamEntry]) -> Self {
        let mut index = StreamIndex::default();

        for (position, entry) in entries.iter().enumerate() {
            let Some(record) = &entry.record else {
                continue;
            };

            // ID 重复时保留首次出现的位置
            index
                .position_by_id
                .entry(record.id.clone())
                .or_insert(position);

            for block in record.blocks() {
                match block {
                    ContentBlock::ToolInvocation(invocation) => {
                        if index.pair_index.contains_key(&invocation.id) {
                            continue;
                        }
                        index
                            .invocation_owner
                            .insert(invocation.id.clone(), record.id.clone());
                        index.pair_index.insert(invocation.id.clone(), index.pairs.len());
                        index.pairs.push(ToolPair {
                            invocation_id: invocation.id.clone(),
                            invocation_record_id: record.id.clone(),
                            result_record_id: None,
                        });
                    }
                    ContentBlock::ToolResult(result) => {
                        if let Some(&at) = index.pair_index.get(&result.tool_use_id) {
                            let pair = &mut index.pairs[at];
                            if pair.result_record_id.is_none() {
                                pair.result_record_id = Some(record.id.clone());
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        index
    }

    /// 按调用标识符查询配对
    pub fn pair_for(&self, invocation_id: &str) -> Option<&ToolPair> {
        self.pair_index
            .get(invocation_id)
            .map(|&at| &self.pairs[at])
    }
}
