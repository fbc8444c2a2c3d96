//! # 核心服务模块
//!
//! 记录完整性引擎的各个组成部分，按数据流先后排列：
//! - `parser` - 会话流的逐行解析与重建（损坏行原样透传）
//! - `index` - 树与工具配对索引（每次操作重新构建）
//! - `planner` - 批量删除的校验与重新挂接规划
//! - `compactor` - 工具配对内容压缩（成功前置门）
//! - `writer` - 先备份、写临时文件再改名的原子持久化
//! - `export` - 会话流导出（原样 / 剔除 summary）
//! - `scanner` - 存储目录的并行扫描（项目与会话流清单）

pub mod compactor;
pub mod export;
pub mod index;
pub mod parser;
pub mod planner;
pub mod scanner;
pub mod writer;
