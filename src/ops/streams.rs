//! # 会话流读取类操作
//!
//! 不改动磁盘内容的操作入口：
//! - `export_stream` - 导出一条会话流（原样 / 剔除 summary）
//! - `list_projects` - 枚举存储根目录下的全部项目
//! - `list_streams` - 枚举指定项目下的全部会话流

use crate::config::StoreConfig;
use crate::error::EditError;
use crate::models::outcome::ExportedStream;
use crate::models::project::{Project, StreamSummary};
use crate::services::{export, scanner};

/// 导出一条会话流
///
/// # 参数
/// - `config` - 存储配置（根目录）
/// - `project` - 项目目录名（编码形式）
/// - `stream_id` - 会话流 ID
/// - `exclude_summaries` - 是否剔除 summary 记录行
///
/// # 返回值
/// 导出内容与建议文件名；未过滤时内容与磁盘文件逐字节一致
pub async fn export_stream(
    config: &StoreConfig,
    project: &str,
    stream_id: &str,
    exclude_summaries: bool,
) -> Result<ExportedStream, EditError> {
    let path = config.stream_path(project, stream_id);
    export::export(&path, stream_id, exclude_summaries).await
}

/// 枚举存储根目录下的全部项目
pub async fn list_projects(config: &StoreConfig) -> Result<Vec<Project>, EditError> {
    scanner::scan_projects(config).await
}

/// 枚举指定项目下的全部会话流
pub async fn list_streams(
    config: &StoreConfig,
    project: &str,
) -> Result<Vec<StreamSummary>, EditError> {
    scanner::scan_streams(config, project).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_export_stream_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("p1");
        tokio::fs::create_dir_all(&project).await.unwrap();
        let content = concat!(
            r#"{"id":"A","kind":"user","content":"a"}"#,
            "\n",
            r#"{"id":"S","kind":"summary","summaryText":"s"}"#,
            "\n",
        );
        tokio::fs::write(project.join("s1.jsonl"), content).await.unwrap();
        let config = StoreConfig::new(dir.path());

        let plain = export_stream(&config, "p1", "s1", false).await.unwrap();
        assert_eq!(plain.content, content);

        let clean = export_stream(&config, "p1", "s1", true).await.unwrap();
        assert!(!clean.content.contains("\"id\":\"S\""));
        assert_eq!(clean.file_name, "s1-clean.jsonl");
    }

    #[tokio::test]
    async fn test_listing_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("-work-demo");
        tokio::fs::create_dir_all(&project).await.unwrap();
        tokio::fs::write(project.join("s1.jsonl"), "{\"id\":\"a\"}\n")
            .await
            .unwrap();
        let config = StoreConfig::new(dir.path());

        let projects = list_projects(&config).await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].stream_count, 1);

        let streams = list_streams(&config, &projects[0].path).await.unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].id, "s1");
    }
}
