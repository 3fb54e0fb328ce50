//! 通知分发错误类型
//!
//! 定义参数校验、模板解析、渠道查找和渠道发送等场景的错误分类。
//! 除参数校验外，其余错误都归属到具体渠道，由分发报告逐渠道呈现。

use thiserror::Error;

/// 单个渠道的失败记录
#[derive(Debug)]
pub struct ChannelFailure {
    pub channel: String,
    pub error: NoticeError,
}

#[derive(Debug, Error)]
pub enum NoticeError {
    #[error("无效的参数: {field} - {message}")]
    InvalidArgument { field: String, message: String },

    #[error("模板未找到: 分类={category}, 模板={template_id}")]
    TemplateNotFound {
        category: String,
        template_id: String,
    },

    #[error("模板定义不完整: 模板={template_id}, 缺少字段={field}")]
    IncompleteTemplate { template_id: String, field: String },

    #[error("模板渲染失败: {reason}")]
    TemplateExpansion { reason: String },

    #[error("渠道未注册: {channel}")]
    ChannelNotFound { channel: String },

    #[error("通知发送失败: 渠道={channel}, 原因={reason}")]
    SendFailed { channel: String, reason: String },

    #[error("渠道投递失败: {}", join_channels(.failures))]
    DispatchFailed { failures: Vec<ChannelFailure> },

    #[error(transparent)]
    Shared(#[from] notice_shared::error::SharedError),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, NoticeError>;

fn join_channels(failures: &[ChannelFailure]) -> String {
    failures
        .iter()
        .map(|f| f.channel.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl NoticeError {
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::TemplateNotFound { .. } => "TEMPLATE_NOT_FOUND",
            Self::IncompleteTemplate { .. } => "INCOMPLETE_TEMPLATE",
            Self::TemplateExpansion { .. } => "TEMPLATE_EXPANSION_ERROR",
            Self::ChannelNotFound { .. } => "CHANNEL_NOT_FOUND",
            Self::SendFailed { .. } => "CHANNEL_SEND_ERROR",
            Self::DispatchFailed { .. } => "DISPATCH_FAILED",
            Self::Shared(e) => e.code(),
        }
    }

    /// 错误所归属的渠道
    pub fn channel(&self) -> Option<&str> {
        match self {
            Self::ChannelNotFound { channel } | Self::SendFailed { channel, .. } => Some(channel),
            _ => None,
        }
    }
}
