//! # 通用工具模块
//!
//! - `path` - 项目目录名的编码路径解码

pub mod path;
