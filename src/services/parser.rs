//! # 会话流解析服务
//!
//! 把 JSONL 会话流文本解析为有序的 `StreamEntry` 序列，以及反向的
//! 行文本重建。解析是纯函数；文件读取是薄薄的异步封装。
//!
//! ## 容错策略
//! 解析失败的行**原样保留**：该行的原始文本继续留在流中，经过删除、
//! 压缩、持久化各阶段都不会被改动或丢弃，只是不参与树和配对分析。
//! 这保证了对部分损坏的会话流做编辑时不会把损坏行抹掉。
//!
//! ## 性能策略
//! - 逐行解析使用 rayon `par_lines` 并行执行，`collect` 保持原始行序
//! - 重建时按行数预分配缓冲区容量，减少重新分配

use std::path::Path;

use rayon::prelude::*;

use crate::error::EditError;
use crate::models::record::Record;

/// 会话流中的一行：原始文本 + 解析结果
///
/// `record` 为 `None` 表示该行未通过结构解析，`raw` 中的原始文本
/// 是它唯一的表示。对已解析的行，`raw` 与 `record` 始终保持同步：
/// 变更阶段改写记录后必须调用 [`StreamEntry::sync_raw`]。
#[derive(Debug, Clone)]
pub struct StreamEntry {
    /// 该行的原始文本（不含换行符），持久化时逐行写回
    pub raw: String,
    /// 结构解析结果；解析失败时为 None
    pub record: Option<Record>,
}

impl StreamEntry {
    /// 把 `record` 重新序列化进 `raw`
    ///
    /// 删除规划器改写父引用、压缩引擎替换工具块内容后调用，
    /// 保证持久化阶段写出的行文本反映最新的记录状态。
    ///
    /// # 错误
    /// 序列化失败时返回 IO 级错误（实践中不应发生）
    pub fn sync_raw(&mut self) -> Result<(), EditError> {
        if let Some(record) = &self.record {
            self.raw = serde_json::to_string(record).map_err(|e| EditError::Io {
                context: "序列化记录失败".into(),
                source: std::io::Error::other(e),
            })?;
        }
        Ok(())
    }
}

/// 把会话流文本解析为有序的 StreamEntry 序列
///
/// 空行（含纯空白行）被跳过；其余每行独立解析为一条记录，
/// 解析失败的行以 `record: None` 原样保留。纯函数，无副作用。
///
/// # 参数
/// - `content` - 会话流的完整文本
///
/// # 返回值
/// 按原始行序排列的 StreamEntry 列表
pub fn parse_stream(content: &str) -> Vec<StreamEntry> {
    content
        .par_lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let record = match serde_json::from_str::<Record>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    // 解析失败不致命：该行透传，仅记日志
                    log::warn!("会话流行解析失败，原样保留: {}", e);
                    None
                }
            };
            StreamEntry {
                raw: line.to_string(),
                record,
            }
        })
        .collect()
}

/// 把 StreamEntry 序列重建为会话流文本
///
/// 每行后跟一个换行符；空序列产生空字符串（文件非空时末尾才有换行，
/// 与磁盘上的流格式一致）。
pub fn render_stream(entries: &[StreamEntry]) -> String {
    let mut content = String::with_capacity(entries.len() * 256);
    for entry in entries {
        content.push_str(&entry.raw);
        content.push('\n');
    }
    content
}

/// 读取并解析会话流文件
///
/// # 参数
/// - `path` - 会话流 JSONL 文件的绝对路径
///
/// # 错误
/// 文件不存在时返回 `StreamNotFound`；读取失败时返回 IO 错误
pub async fn read_stream(path: &Path) -> Result<Vec<StreamEntry>, EditError> {
    if !path.exists() {
        return Err(EditError::StreamNotFound {
            path: path.display().to_string(),
        });
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| EditError::Io {
            context: "读取会话流文件失败".into(),
            source: e,
        })?;

    Ok(parse_stream(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_malformed_lines_in_order() {
        let content = concat!(
            r#"{"id":"a1","kind":"user","content":"hello"}"#,
            "\n",
            "{not valid json\n",
            r#"{"id":"a2","parentId":"a1","kind":"assistant","content":[{"type":"text","text":"hi"}]}"#,
            "\n",
        );
        let entries = parse_stream(content);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].record.as_ref().unwrap().id, "a1");
        // 损坏行原样保留且位置不变
        assert!(entries[1].record.is_none());
        assert_eq!(entries[1].raw, "{not valid json");
        assert_eq!(entries[2].record.as_ref().unwrap().id, "a2");
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let content = "\n  \n{\"id\":\"a1\",\"kind\":\"user\",\"content\":\"x\"}\n\n";
        let entries = parse_stream(content);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].record.as_ref().unwrap().id, "a1");
    }

    #[test]
    fn test_render_appends_trailing_newline() {
        let entries = parse_stream("{\"id\":\"a1\",\"kind\":\"user\",\"content\":\"x\"}\n");
        let rendered = render_stream(&entries);
        assert!(rendered.ends_with('\n'));
        assert_eq!(rendered.lines().count(), 1);
    }

    #[test]
    fn test_render_empty_stream_is_empty() {
        assert_eq!(render_stream(&[]), "");
    }

    #[test]
    fn test_parse_render_round_trip_is_identical() {
        let content = concat!(
            r#"{"id":"a1","kind":"user","content":"hello","cwd":"/tmp"}"#,
            "\n",
            "broken line here\n",
            r#"{"id":"a2","kind":"summary","summaryText":"s","leafId":"a1"}"#,
            "\n",
        );
        let entries = parse_stream(content);
        // 未经变更的流重建后逐字节一致
        assert_eq!(render_stream(&entries), content);
    }

    #[test]
    fn test_sync_raw_reflects_record_changes() {
        let mut entries =
            parse_stream("{\"id\":\"a1\",\"parentId\":\"a0\",\"kind\":\"user\",\"content\":\"x\"}\n");
        let entry = &mut entries[0];
        entry.record.as_mut().unwrap().parent_id = None;
        entry.sync_raw().unwrap();
        assert!(!entry.raw.contains("parentId"));
        assert!(entry.raw.contains("\"id\":\"a1\""));
    }
}
