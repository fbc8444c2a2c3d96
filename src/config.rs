//! # 存储配置与时间源
//!
//! 每次操作都显式接收一个 `StoreConfig`（存储根目录）和一个 `Clock`
//! （时间戳来源），不依赖任何模块级全局常量：
//! - 根目录可指向任意位置，测试中指向临时目录即可完整驱动引擎；
//! - 备份文件名里的时间戳来自注入的 `Clock`，测试用固定时钟可以
//!   得到确定性的备份路径。

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// 存储配置：会话流文件的根目录
///
/// 目录布局与 Claude Code 一致：`<root>/<项目目录>/<会话流 ID>.jsonl`，
/// 项目目录名是编码后的项目路径。
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// 存储根目录（默认安装对应 `~/.claude/projects`）
    pub root: PathBuf,
}

impl StoreConfig {
    /// 以指定根目录创建配置
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 以默认根目录 `~/.claude/projects` 创建配置
    ///
    /// # 返回值
    /// 无法确定用户主目录（极端情况，如无 HOME 环境变量）时返回 None。
    pub fn default_root() -> Option<Self> {
        let home = dirs::home_dir()?;
        Some(Self {
            root: home.join(".claude").join("projects"),
        })
    }

    /// 指定项目的目录路径
    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.root.join(project)
    }

    /// 指定会话流的文件路径：`<root>/<project>/<stream_id>.jsonl`
    pub fn stream_path(&self, project: &str, stream_id: &str) -> PathBuf {
        self.project_dir(project).join(format!("{stream_id}.jsonl"))
    }
}

/// 时间戳来源
///
/// 原子写入器用它生成备份文件名中的毫秒时间戳。
/// 生产代码使用 [`SystemClock`]；测试注入固定时钟以获得确定性路径。
pub trait Clock: Send + Sync {
    /// 当前 Unix 毫秒时间戳
    fn unix_millis(&self) -> u64;
}

/// 系统时钟：读取真实的系统时间
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// 判断路径是否像一条会话流文件（`.jsonl` 扩展名）
///
/// 扫描与导出共用的小谓词。
pub fn is_stream_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "jsonl")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_path_layout() {
        let config = StoreConfig::new("/data/store");
        let path = config.stream_path("-home-user-app", "abc-123");
        assert_eq!(
            path,
            PathBuf::from("/data/store/-home-user-app/abc-123.jsonl")
        );
    }

    #[test]
    fn test_is_stream_file() {
        assert!(is_stream_file(Path::new("/x/a.jsonl")));
        assert!(!is_stream_file(Path::new("/x/a.jsonl.backup.123")));
        assert!(!is_stream_file(Path::new("/x/notes.md")));
    }

    #[test]
    fn test_system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.unix_millis();
        let b = clock.unix_millis();
        assert!(b >= a);
    }
}
