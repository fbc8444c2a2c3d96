//! # Transcript Editor - 会话记录流的结构化编辑引擎
//!
//! 对持久化的追加式会话记录流（JSONL，每行一条记录）做选择性编辑，
//! 同时保证流的内部结构不被破坏：
//! - 记录通过 `parentId` 构成森林，删除后孤儿后代自动重新挂接；
//! - 工具调用与工具结果成对出现，删除必须两侧同批；
//! - 思考块记录与压缩边界（summary）记录不可删除；
//! - 压缩边界之前的祖先关系只能经由其 `leafId` 推断；
//! - 每次变更先备份、写临时文件再改名，读取方永远看不到半成品。
//!
//! ## 模块结构
//! - `ops/` - 操作入口（删除、压缩、导出、清单），供外层传输层调用
//! - `services/` - 核心引擎（解析、索引、规划、压缩、持久化、扫描）
//! - `models/` - 数据模型（记录与内容块、操作结果、清单结构）
//! - `config` - 存储配置与注入式时间源
//! - `error` - 统一错误分类（校验 / 未找到 / IO 分级，携带违规明细）
//! - `utils/` - 通用工具函数
//!
//! ## 生命周期
//! 每个操作独立处理：读流 → 建索引 → 校验 → 变更 → 备份 → 覆写，
//! 结束后不保留内存状态。同一会话流上的并发变更不做内部协调，
//! 由调用方保证同一路径同一时刻只有一个写入者。

pub mod config;
pub mod error;
pub mod models;
pub mod ops;
pub mod services;
pub mod utils;

pub use config::{Clock, StoreConfig, SystemClock};
pub use error::{EditError, ResultStatus, ValidationError, Violation};
pub use models::outcome::{BackupHandle, CompactionOutcome, DeletionOutcome, ExportedStream};
pub use models::record::{ContentBlock, Record, RecordContent, RecordKind};
