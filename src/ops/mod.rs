//! # 操作入口模块
//!
//! 编辑引擎对外的操作面，供外层传输层（HTTP、IPC 等）直接调用。
//! 每个子模块对应一个功能域：
//! - `records` - 记录变更操作（批量删除、工具内容压缩）
//! - `streams` - 会话流读取类操作（导出、项目与会话流清单）

pub mod records;
pub mod streams;
