//! # 操作结果数据模型
//!
//! 定义删除、压缩、导出三类变更 / 读取操作完成后返回给调用方的结果结构。
//! 所有结构体均派生 `Serialize`（camelCase），方便外层传输层直接序列化返回。

use std::path::PathBuf;

use serde::Serialize;

/// 备份句柄：一次变更操作产生的备份文件
///
/// 备份文件名格式：`<原始路径>.backup.<unix 毫秒时间戳>`，
/// 与原始文件位于同一目录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupHandle {
    /// 备份文件的绝对路径
    pub path: PathBuf,
}

impl BackupHandle {
    /// 备份路径的字符串形式（用于填充操作结果）
    pub fn display(&self) -> String {
        self.path.display().to_string()
    }
}

/// 批量删除操作的结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionOutcome {
    /// 实际从流中移除的记录条数
    pub deleted: usize,
    /// 删除后流中剩余的行数（含未解析行）
    pub remaining: usize,
    /// 父引用被改写（重新挂接）的存活记录条数
    pub reparented: usize,
    /// 本次操作创建的备份文件路径
    pub backup_path: String,
}

/// 压缩操作的结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactionOutcome {
    /// 被替换为占位内容的工具块数量（调用块与结果块分别计数）
    pub compacted_blocks: usize,
    /// 本次操作创建的备份文件路径
    pub backup_path: String,
}

/// 导出操作的结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedStream {
    /// 导出内容：原始字节或过滤掉 summary 行后重建的文本
    pub content: String,
    /// 建议的下载文件名；过滤导出时带 `-clean` 后缀
    pub file_name: String,
}
