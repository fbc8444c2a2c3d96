//! # 原子写入服务
//!
//! 把变更后的会话流安全地写回磁盘，执行顺序保证：
//!
//! 1. **先备份**：把现有主文件完整复制到
//!    `<原始路径>.backup.<unix 毫秒时间戳>`（同目录），复制完全成功
//!    之前主文件绝不被触碰。备份失败则整个操作中止，主文件原样。
//! 2. **写临时文件再改名**：新内容先写入同目录的临时文件，写入完成后
//!    用 rename 原子替换主文件，读取方永远不会看到写了一半的主文件。
//!
//! 备份成功之后的任何失败都以 [`EditError::WriteAfterBackup`] 上报，
//! 与普通 IO 失败区分——此时主文件状态需要操作者对照备份人工核对。
//!
//! 时间戳来自注入的 [`Clock`]，测试用固定时钟可以得到确定性的备份路径。

use std::path::{Path, PathBuf};

use crate::config::Clock;
use crate::error::EditError;
use crate::models::outcome::BackupHandle;
use crate::services::parser::{self, StreamEntry};

/// 备份并持久化一条会话流
///
/// # 参数
/// - `path` - 主文件（会话流 JSONL）的绝对路径
/// - `entries` - 变更后的完整流
/// - `clock` - 备份文件名时间戳的来源
///
/// # 返回值
/// 本次操作创建的备份句柄
///
/// # 错误
/// - 备份阶段失败：`Io`，主文件未被改动
/// - 备份成功后写入 / 改名失败：`WriteAfterBackup`（高危，需人工核对）
pub async fn persist(
    path: &Path,
    entries: &[StreamEntry],
    clock: &dyn Clock,
) -> Result<BackupHandle, EditError> {
    let millis = clock.unix_millis();

    // ---- 阶段 1：备份，必须完全成功 ----
    let backup_path = sibling_path(path, "backup", millis);
    tokio::fs::copy(path, &backup_path)
        .await
        .map_err(|e| EditError::Io {
            context: "创建备份失败".into(),
            source: e,
        })?;

    // ---- 阶段 2：写临时文件，原子改名覆盖主文件 ----
    let content = parser::render_stream(entries);
    let tmp_path = sibling_path(path, "tmp", millis);

    if let Err(e) = write_and_swap(&tmp_path, path, &content).await {
        // 尽力清理残留的临时文件；失败不影响错误上报
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(EditError::WriteAfterBackup {
            backup_path: backup_path.display().to_string(),
            source: e,
        });
    }

    Ok(BackupHandle { path: backup_path })
}

/// 在主文件同目录下派生带时间戳后缀的路径
///
/// 形如 `<原始路径>.<label>.<millis>`。
fn sibling_path(path: &Path, label: &str, millis: u64) -> PathBuf {
    PathBuf::from(format!("{}.{}.{}", path.display(), label, millis))
}

/// 写入临时文件后 rename 覆盖目标文件
async fn write_and_swap(
    tmp_path: &Path,
    path: &Path,
    content: &str,
) -> Result<(), std::io::Error> {
    tokio::fs::write(tmp_path, content).await?;
    tokio::fs::rename(tmp_path, path).await
}
