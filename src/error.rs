//! # 错误分类体系
//!
//! 定义编辑引擎对外的统一错误类型 `EditError` 及其四级分类：
//! 校验失败（携带完整违规明细）、流 / 记录未找到、普通 IO 失败、
//! 以及备份成功后主文件写入失败的高危条件。
//!
//! ## 设计原则
//! - 校验阶段一次性收集**所有**违规项后整体报告，不在第一个违规处提前返回，
//!   调用方一次响应即可拿到完整的问题清单。
//! - 违规明细 `Violation` 派生 `Serialize`，外层传输层可以直接把
//!   结构化载荷（违规类型 + 涉事 ID）返回给操作者。
//! - 逐行解析失败不属于错误：该行原样透传，仅记一条 warn 日志。

use serde::Serialize;
use thiserror::Error;

/// 操作结果标签：供外层传输层映射响应状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultStatus {
    /// 操作成功
    Ok,
    /// 请求未通过结构校验
    ValidationError,
    /// 引用的会话流或记录不存在
    NotFound,
    /// 备份或写入阶段的 IO 失败
    IoError,
}

/// 单项校验违规
///
/// `kind` 标签区分违规类型，载荷给出涉事记录 / 配对的标识符。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Violation {
    /// 请求删除的记录包含思考块
    #[serde(rename_all = "camelCase")]
    ThinkingRecord {
        /// 涉事记录 ID
        id: String,
    },
    /// 请求删除的记录是压缩边界（summary）
    #[serde(rename_all = "camelCase")]
    SummaryRecord {
        /// 涉事记录 ID
        id: String,
    },
    /// 工具调用 / 结果配对只有一侧被请求删除，另一侧存在却未被请求
    #[serde(rename_all = "camelCase")]
    BrokenPair {
        /// 配对的调用标识符
        invocation_id: String,
        /// 被请求删除的一侧记录 ID
        requested_id: String,
        /// 存在但未被请求的另一侧记录 ID
        partner_id: String,
    },
    /// 压缩前置校验在工具结果正文中发现失败指示词
    #[serde(rename_all = "camelCase")]
    FailureIndicator {
        /// 持有该结果块的记录 ID
        record_id: String,
        /// 所属配对的调用标识符
        invocation_id: String,
        /// 命中的指示词
        indicator: String,
    },
}

impl Violation {
    /// 单项违规的人类可读描述
    fn describe(&self) -> String {
        match self {
            Violation::ThinkingRecord { id } => {
                format!("记录 {} 包含思考块，不可删除", id)
            }
            Violation::SummaryRecord { id } => {
                format!("记录 {} 是压缩边界，不可删除", id)
            }
            Violation::BrokenPair {
                invocation_id,
                requested_id,
                partner_id,
            } => format!(
                "工具配对 {} 被拆散：请求删除了 {}，但配对的 {} 未被请求",
                invocation_id, requested_id, partner_id
            ),
            Violation::FailureIndicator {
                record_id,
                invocation_id,
                indicator,
            } => format!(
                "记录 {} 中配对 {} 的工具结果包含失败指示词 \"{}\"，不可压缩",
                record_id, invocation_id, indicator
            ),
        }
    }
}

/// 校验失败：一次变更请求收集到的全部违规项
///
/// 校验运行到底后才构造本错误，保证 `violations` 是完整清单。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// 全部违规项，按发现顺序排列，至少一项
    pub violations: Vec<Violation>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "校验失败（{} 项违规）", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "; {}", violation.describe())?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// 编辑引擎的统一错误类型
#[derive(Debug, Error)]
pub enum EditError {
    /// 会话流文件不存在
    #[error("会话流文件不存在: {path}")]
    StreamNotFound {
        /// 缺失文件的路径
        path: String,
    },

    /// 目标记录不存在，或不包含可操作的工具内容
    #[error("未找到记录或记录不包含工具内容: {id}")]
    RecordNotFound {
        /// 请求的记录 ID
        id: String,
    },

    /// 变更请求未通过结构校验
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// 备份或读取阶段的 IO 失败：主文件未被改动
    #[error("{context}: {source}")]
    Io {
        /// 失败环节的描述
        context: String,
        /// 底层 IO 错误
        #[source]
        source: std::io::Error,
    },

    /// 备份已成功创建，但主文件写入失败
    ///
    /// 主文件相对备份的状态未知，需要操作者人工核对恢复，
    /// 严重级别高于普通 IO 失败。
    #[error("备份已创建于 {backup_path}，但主文件写入失败，需要人工核对恢复: {source}")]
    WriteAfterBackup {
        /// 已创建的备份文件路径
        backup_path: String,
        /// 底层 IO 错误
        #[source]
        source: std::io::Error,
    },
}

impl EditError {
    /// 映射为操作结果标签
    pub fn status(&self) -> ResultStatus {
        match self {
            EditError::StreamNotFound { .. } | EditError::RecordNotFound { .. } => {
                ResultStatus::NotFound
            }
            EditError::Validation(_) => ResultStatus::ValidationError,
            EditError::Io { .. } | EditError::WriteAfterBackup { .. } => ResultStatus::IoError,
        }
    }

    /// 结构化违规明细；非校验错误返回空切片
    pub fn violations(&self) -> &[Violation] {
        match self {
            EditError::Validation(err) => &err.violations,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found = EditError::StreamNotFound {
            path: "/tmp/missing.jsonl".into(),
        };
        assert_eq!(not_found.status(), ResultStatus::NotFound);

        let validation = EditError::Validation(ValidationError {
            violations: vec![Violation::SummaryRecord { id: "s1".into() }],
        });
        assert_eq!(validation.status(), ResultStatus::ValidationError);
        assert_eq!(validation.violations().len(), 1);

        let io = EditError::Io {
            context: "读取会话流文件失败".into(),
            source: std::io::Error::other("boom"),
        };
        assert_eq!(io.status(), ResultStatus::IoError);
        assert!(io.violations().is_empty());
    }

    #[test]
    fn test_validation_display_lists_every_violation() {
        let err = ValidationError {
            violations: vec![
                Violation::ThinkingRecord { id: "a1".into() },
                Violation::BrokenPair {
                    invocation_id: "toolu_1".into(),
                    requested_id: "a2".into(),
                    partner_id: "a3".into(),
                },
            ],
        };
        let text = err.to_string();
        assert!(text.contains("2 项违规"));
        assert!(text.contains("a1"));
        assert!(text.contains("toolu_1"));
    }

    #[test]
    fn test_violation_serializes_with_kind_tag() {
        let violation = Violation::FailureIndicator {
            record_id: "r1".into(),
            invocation_id: "toolu_9".into(),
            indicator: "error".into(),
        };
        let value = serde_json::to_value(&violation).unwrap();
        assert_eq!(value.get("kind").unwrap(), "failureIndicator");
        assert_eq!(value.get("recordId").unwrap(), "r1");
        assert_eq!(value.get("invocationId").unwrap(), "toolu_9");
    }
}
