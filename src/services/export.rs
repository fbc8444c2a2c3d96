//! # 会话流导出服务
//!
//! 把一条会话流导出为下载内容：
//! - 默认导出：原始字节原样返回，不做任何解析或重建
//! - 过滤导出：剔除 summary 行后逐行重建，未解析行照常保留，
//!   建议文件名带 `-clean` 后缀

use std::path::Path;

use crate::error::EditError;
use crate::models::outcome::ExportedStream;
use crate::services::parser;

/// 导出一条会话流
///
/// # 参数
/// - `path` - 会话流 JSONL 文件的绝对路径
/// - `stream_id` - 会话流 ID，用于拼建议文件名
/// - `exclude_summaries` - 是否剔除 summary 记录行
///
/// # 返回值
/// 导出内容与建议文件名；未过滤时内容与磁盘文件逐字节一致
///
/// # 错误
/// 文件不存在时返回 `StreamNotFound`；读取失败时返回 IO 错误
pub async fn export(
    path: &Path,
    stream_id: &str,
    exclude_summaries: bool,
) -> Result<ExportedStream, EditError> {
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

    if !exclude_summaries {
        return Ok(ExportedStream {
            content,
            file_name: format!("{stream_id}.jsonl"),
        });
    }

    // 过滤导出：只剔除解析成功且 kind 为 summary 的行
    let entries = parser::parse_stream(&content);
    let kept: Vec<_> = entries
        .into_iter()
        .filter(|e| !e.record.as_ref().is_some_and(|r| r.is_summary()))
        .collect();

    Ok(ExportedStream {
        content: parser::render_stream(&kept),
        file_name: format!("{stream_id}-clean.jsonl"),
    })
}
