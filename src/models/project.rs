//! # 项目与会话流清单数据模型
//!
//! 定义存储根目录扫描结果的结构体：项目（存储根目录下的一个子目录）
//! 和会话流摘要（项目目录下的一个 `.jsonl` 文件）。
//! 仅服务于清单类操作，核心编辑引擎不依赖这些类型。

use serde::Serialize;

/// 一个项目：存储根目录下的一个子目录
///
/// 目录名是编码后的项目路径（路径分隔符被替换为短横线），
/// `name` 字段是解码还原后的可读路径。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// 解码还原后的项目路径（如 `/home/user/work/app`）
    pub name: String,
    /// 存储根目录下的原始子目录名（编码形式），用于后续定位会话流
    pub path: String,
    /// 该项目下的会话流数量
    pub stream_count: usize,
}

/// 一条会话流的摘要信息
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSummary {
    /// 会话流 ID：文件名去掉 `.jsonl` 扩展名
    pub id: String,
    /// 流中的记录行数（非空行计数，含未解析行）
    pub record_count: usize,
    /// 文件最后修改时间（ISO 8601 格式字符串）
    pub last_modified: String,
    /// 文件大小（字节）
    pub size: u64,
}
