//! # 记录数据模型
//!
//! 定义会话流中单条记录（Record）及其内容块（ContentBlock）的类型化结构，
//! 对应 JSONL 文件中的每一行。
//!
//! ## 设计决策
//! - 记录级字段采用封闭的类型化结构，但通过 `#[serde(flatten)]` 的 extra map
//!   保留所有未建模字段（cwd、sessionId、version 等），保证改写后的记录
//!   不丢失任何原始数据。
//! - 内容块采用按 `type` 标签封闭的枚举；未知的块类型落入 `Opaque` 变体，
//!   以原始 `serde_json::Value` 原样保留，不参与结构分析。
//! - `content` 同时兼容数组和纯字符串两种格式（老版本会话流中存在
//!   `content: "..."` 的写法），字符串格式没有结构化块，仅原样保留。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 记录类型：决定该行在会话树中的角色
///
/// `summary` 记录是压缩边界标记，既不可删除也不参与内容压缩。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// 用户记录
    User,
    /// 助手记录
    Assistant,
    /// 压缩边界：此前的详细历史已被浓缩为 `summaryText`
    Summary,
}

/// 会话流中的一条记录
///
/// 对应 JSONL 文件中的一行。结构化字段之外的所有键都收集在 `extra` 中，
/// 重新序列化时原样写回。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// 记录唯一标识符，在整条会话流中不重复
    pub id: String,

    /// 父记录 ID：指向流中更早出现的记录；缺失或为 null 表示根记录
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// 记录类型
    pub kind: RecordKind,

    /// 内容：user/assistant 记录的内容块序列（或纯字符串格式）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<RecordContent>,

    /// 摘要文本：仅 summary 记录携带
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_text: Option<String>,

    /// 压缩前最后一条记录的 ID：仅 summary 记录携带（可能缺失）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf_id: Option<String>,

    /// 时间戳：仅用于显示，不参与结构分析
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// 未建模字段的原样保留区
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 记录内容的两种格式
///
/// 新格式是内容块数组；老格式是纯字符串（等价于单个文本块，但没有
/// 结构化信息）。反序列化时按先后顺序尝试匹配。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordContent {
    /// 内容块数组格式
    Blocks(Vec<ContentBlock>),
    /// 纯字符串格式
    Text(String),
}

/// 内容块：按 `type` 字段区分的封闭枚举
///
/// 已知的五种块类型携带结构化字段；未知类型落入 `Opaque`，
/// 序列化时原样写回，不参与工具配对和删除校验。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    /// 文本块
    #[serde(rename = "text")]
    Text(TextBlock),
    /// 思考块：所在记录整体不可删除
    #[serde(rename = "thinking")]
    Thinking(ThinkingBlock),
    /// 工具调用块
    #[serde(rename = "tool_use")]
    ToolInvocation(ToolInvocationBlock),
    /// 工具结果块：通过 `tool_use_id` 与更早的工具调用块配对
    #[serde(rename = "tool_result")]
    ToolResult(ToolResultBlock),
    /// 图片块
    #[serde(rename = "image")]
    Image(ImageBlock),
    /// 未知块类型：原样保留
    #[serde(untagged)]
    Opaque(Value),
}

/// 文本块载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    /// 文本正文
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 思考块载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThinkingBlock {
    /// 思考正文
    pub thinking: String,
    /// signature 等附加字段原样保留
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 工具调用块载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocationBlock {
    /// 调用标识符：与对应工具结果块的 `tool_use_id` 一致
    pub id: String,
    /// 工具名称，如 "Read"、"Bash"
    pub name: String,
    /// 工具输入参数；压缩操作会将其替换为占位字符串
    #[serde(default)]
    pub input: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 工具结果块载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResultBlock {
    /// 对应工具调用块的标识符，必须指向流中更早出现的调用
    pub tool_use_id: String,
    /// 结果正文：字符串或嵌套内容块数组两种格式都存在
    #[serde(default)]
    pub content: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 图片块载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageBlock {
    /// 图片来源（base64 数据或 URL 引用），不做内部解析
    pub source: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// 返回该记录的结构化内容块切片
    ///
    /// 字符串格式的 content 或无 content 的记录返回空切片。
    pub fn blocks(&self) -> &[ContentBlock] {
        match &self.content {
            Some(RecordContent::Blocks(blocks)) => blocks,
            _ => &[],
        }
    }

    /// 返回内容块的可变切片（仅数组格式有内容）
    pub fn blocks_mut(&mut self) -> &mut [ContentBlock] {
        match &mut self.content {
            Some(RecordContent::Blocks(blocks)) => blocks,
            _ => &mut [],
        }
    }

    /// 该记录是否包含思考块
    ///
    /// 包含思考块的记录整体不可删除。
    pub fn has_thinking(&self) -> bool {
        self.blocks()
            .iter()
            .any(|b| matches!(b, ContentBlock::Thinking(_)))
    }

    /// 该记录是否为压缩边界（summary 记录）
    pub fn is_summary(&self) -> bool {
        self.kind == RecordKind::Summary
    }

    /// 该记录是否包含任何工具调用或工具结果块
    pub fn has_tool_blocks(&self) -> bool {
        self.blocks().iter().any(|b| {
            matches!(
                b,
                ContentBlock::ToolInvocation(_) | ContentBlock::ToolResult(_)
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_round_trip_preserves_unknown_fields() {
        let line = r#"{"id":"a1","parentId":null,"kind":"assistant","content":[{"type":"text","text":"hi"}],"sessionId":"s-9","cwd":"/tmp"}"#;
        let record: Record = serde_json::from_str(line).unwrap();
        assert_eq!(record.id, "a1");
        assert_eq!(record.kind, RecordKind::Assistant);
        // 未建模字段进入 extra
        assert_eq!(record.extra.get("sessionId").unwrap(), "s-9");
        assert_eq!(record.extra.get("cwd").unwrap(), "/tmp");

        let rendered = serde_json::to_string(&record).unwrap();
        let reparsed: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(reparsed.get("sessionId").unwrap(), "s-9");
        assert_eq!(reparsed.get("cwd").unwrap(), "/tmp");
    }

    #[test]
    fn test_unknown_block_type_is_opaque() {
        let line = r#"{"id":"b2","kind":"user","content":[{"type":"server_tool_use","payload":{"x":1}}]}"#;
        let record: Record = serde_json::from_str(line).unwrap();
        let blocks = record.blocks();
        assert_eq!(blocks.len(), 1);
        assert!(matches!(blocks[0], ContentBlock::Opaque(_)));
        assert!(!record.has_tool_blocks());

        // Opaque 块序列化后原样保留
        let rendered = serde_json::to_string(&record).unwrap();
        assert!(rendered.contains(r#""type":"server_tool_use""#));
        assert!(rendered.contains(r#""payload":{"x":1}"#));
    }

    #[test]
    fn test_string_content_format() {
        let line = r#"{"id":"c3","kind":"user","content":"plain prompt"}"#;
        let record: Record = serde_json::from_str(line).unwrap();
        assert!(matches!(record.content, Some(RecordContent::Text(_))));
        // 字符串格式没有结构化块
        assert!(record.blocks().is_empty());
        assert!(!record.has_thinking());
    }

    #[test]
    fn test_has_thinking() {
        let line = r#"{"id":"d4","kind":"assistant","content":[{"type":"thinking","thinking":"...","signature":"sig"},{"type":"text","text":"ok"}]}"#;
        let record: Record = serde_json::from_str(line).unwrap();
        assert!(record.has_thinking());
        // signature 附加字段保留在块的 extra 中
        if let ContentBlock::Thinking(block) = &record.blocks()[0] {
            assert_eq!(block.extra.get("signature").unwrap(), "sig");
        } else {
            panic!("expected thinking block");
        }
    }

    #[test]
    fn test_summary_record_fields() {
        let line = r#"{"id":"e5","kind":"summary","summaryText":"earlier history","leafId":"d4"}"#;
        let record: Record = serde_json::from_str(line).unwrap();
        assert!(record.is_summary());
        assert_eq!(record.summary_text.as_deref(), Some("earlier history"));
        assert_eq!(record.leaf_id.as_deref(), Some("d4"));
    }
}
