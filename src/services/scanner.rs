//! # 存储目录扫描服务
//!
//! 枚举存储根目录下的项目及其会话流，供外层展示清单。
//! 使用 tokio `JoinSet` 并行扫描所有项目目录，单个目录的失败
//! 不影响其他目录，仅记 warn 日志。
//!
//! 核心编辑引擎不依赖本模块：扫描只是围绕同一存储布局的薄封装。

use std::path::Path;

use tokio::task::JoinSet;

use crate::config::{StoreConfig, is_stream_file};
use crate::error::EditError;
use crate::models::project::{Project, StreamSummary};
use crate::utils::path::decode_project_dir;

/// 并行扫描存储根目录下的全部项目
///
/// 每个子目录视为一个项目，统计其中会话流文件的数量。
/// 结果按解码后的项目路径字典序排列。
///
/// # 参数
/// - `config` - 存储配置（根目录）
///
/// # 返回值
/// 项目列表；根目录不存在时返回空列表
///
/// # 错误
/// 根目录存在但不可读时返回 IO 错误
pub async fn scan_projects(config: &StoreConfig) -> Result<Vec<Project>, EditError> {
    if !config.root.exists() {
        return Ok(vec![]);
    }

    let mut dir = tokio::fs::read_dir(&config.root)
        .await
        .map_err(|e| EditError::Io {
            context: "读取存储根目录失败".into(),
            source: e,
        })?;

    // 收集所有项目子目录
    let mut project_dirs = Vec::new();
    while let Some(entry) = dir.next_entry().await.map_err(|e| EditError::Io {
        context: "遍历存储根目录条目失败".into(),
        source: e,
    })? {
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        if is_dir {
            let dir_name = entry.file_name().to_string_lossy().to_string();
            project_dirs.push((dir_name, entry.path()));
        }
    }

    // 并行统计每个项目的会话流数量
    let mut join_set = JoinSet::new();
    for (dir_name, dir_path) in project_dirs {
        join_set.spawn(async move {
            let stream_count = count_streams(&dir_path).await.unwrap_or(0);
            Project {
                name: decode_project_dir(&dir_name),
                path: dir_name,
                stream_count,
            }
        });
    }

    let mut projects = Vec::new();
    while let Some(result) = join_set.join_next().await {
        match result {
            Ok(project) => projects.push(project),
            Err(e) => {
                // 单个项目扫描失败不影响其他项目
                log::warn!("扫描项目任务失败: {}", e);
            }
        }
    }

    projects.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(projects)
}

/// 扫描指定项目目录下的全部会话流
///
/// 对每个 `.jsonl` 文件并行读取元数据和记录行数；`agent-` 前缀的
/// 子 agent 会话不作为独立会话流列出。结果按最后修改时间降序排列。
///
/// # 参数
/// - `config` - 存储配置（根目录）
/// - `project` - 项目目录名（编码形式）
///
/// # 错误
/// 项目目录不存在时返回 `StreamNotFound`
pub async fn scan_streams(
    config: &StoreConfig,
    project: &str,
) -> Result<Vec<StreamSummary>, EditError> {
    let project_dir = config.project_dir(project);
    if !project_dir.exists() {
        return Err(EditError::StreamNotFound {
            path: project_dir.display().to_string(),
        });
    }

    let mut dir = tokio::fs::read_dir(&project_dir)
        .await
        .map_err(|e| EditError::Io {
            context: "读取项目目录失败".into(),
            source: e,
        })?;

    let mut stream_files = Vec::new();
    while let Some(entry) = dir.next_entry().await.map_err(|e| EditError::Io {
        context: "遍历项目目录条目失败".into(),
        source: e,
    })? {
        let file_name = entry.file_name().to_string_lossy().to_string();
        if is_stream_file(Path::new(&file_name)) && !file_name.starts_with("agent-") {
            stream_files.push((file_name, entry.path()));
        }
    }

    // 并行读取每条流的元数据和行数
    let mut join_set = JoinSet::new();
    for (file_name, file_path) in stream_files {
        join_set.spawn(async move {
            let metadata = tokio::fs::metadata(&file_path).await.ok()?;
            let mtime = metadata.modified().ok()?;
            let record_count = count_records(&file_path).await;

            Some(StreamSummary {
                id: file_name.trim_end_matches(".jsonl").to_string(),
                record_count,
                last_modified: system_time_to_iso8601(mtime),
                size: metadata.len(),
            })
        });
    }

    let mut streams = Vec::new();
    while let Some(result) = join_set.join_next().await {
        if let Ok(Some(summary)) = result {
            streams.push(summary);
        }
    }

    streams.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
    Ok(streams)
}

/// 统计目录下会话流文件的数量
async fn count_streams(project_dir: &Path) -> Result<usize, std::io::Error> {
    let mut dir = tokio::fs::read_dir(project_dir).await?;
    let mut count = 0;
    while let Some(entry) = dir.next_entry().await? {
        let file_name = entry.file_name().to_string_lossy().to_string();
        if is_stream_file(Path::new(&file_name)) && !file_name.starts_with("agent-") {
            count += 1;
        }
    }
    Ok(count)
}

/// 统计一条流的记录行数（非空行计数）
async fn count_records(path: &Path) -> usize {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => content.lines().filter(|l| !l.trim().is_empty()).count(),
        Err(_) => 0,
    }
}

/// 将 `SystemTime` 转换为 ISO 8601 格式字符串
///
/// 不引入时间库，使用标准库手动转换。
/// 格式：`YYYY-MM-DDTHH:MM:SS.sssZ`（UTC 时间）
fn system_time_to_iso8601(time: std::time::SystemTime) -> String {
    match time.duration_since(std::time::UNIX_EPOCH) {
        Ok(duration) => {
            let total_secs = duration.as_secs();
            let millis = duration.subsec_millis();

            let days = total_secs / 86400;
            let time_of_day = total_secs % 86400;
            let hours = time_of_day / 3600;
            let minutes = (time_of_day % 3600) / 60;
            let seconds = time_of_day % 60;

            let (year, month, day) = days_to_date(days);

            format!(
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
                year, month, day, hours, minutes, seconds, millis
            )
        }
        // 系统时间早于 Unix epoch 的极端情况
        Err(_) => "1970-01-01T00:00:00.000Z".to_string(),
    }
}

/// 将自 1970-01-01 以来的天数转换为 (年, 月, 日)
///
/// 公历日期计算，正确处理闰年。
/// 算法来自 Howard Hinnant：http://howardhinnant.github.io/date_algorithms.html
fn days_to_date(days_since_epoch: u64) -> (u64, u64, u64) {
    let z = days_since_epoch + 719468;
    let era = z / 146097;
    let doe = z - era * 146097; // day of era [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // year of era [0, 399]
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // day of year [0, 365]
    let mp = (5 * doy + 2) / 153; // month index [0, 11]
    let d = doy - (153 * mp + 2) / 5 + 1; // day [1, 31]
    let m = if mp < 10 { mp + 3 } else { mp - 9 }; // month [1, 12]
    let y = if m <= 2 { y + 1 } else { y };

    (y, m, d)
}
