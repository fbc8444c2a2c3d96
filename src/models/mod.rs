//! # 数据模型模块
//!
//! 定义引擎各层共享的数据结构：
//! - `record` - 会话流记录与内容块的类型化模型（保留未知字段）
//! - `outcome` - 删除 / 压缩 / 导出操作的结果结构
//! - `project` - 项目与会话流清单的数据结构

pub mod outcome;
pub mod project;
pub mod record;
