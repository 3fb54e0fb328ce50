//! 多渠道通知发送器
//!
//! 通过 `NoticeChannel` trait 抽象发送行为，各渠道（邮件、APP 推送、广播）
//! 提供独立实现。内置渠道为模拟发送（渲染模板后仅记录日志），
//! 替换为真实 SDK 调用时只需实现同一 trait 并注册到服务注册表。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::error::{NoticeError, Result};
use crate::registry::Startable;
use crate::template::{ResolvedTemplate, TemplateResolver};
use crate::types::{Params, Recipient, SendReceipt};

/// 通知渠道 trait，各渠道实现具体的投递逻辑
///
/// 重试和超时策略属于渠道自身，分发器只调用一次。
#[async_trait]
pub trait NoticeChannel: Send + Sync {
    /// 渠道名，注册表按小写形式索引
    fn name(&self) -> &str;

    /// 按接收者 ID 投递
    async fn send_to_ids(
        &self,
        template_id: &str,
        params: &Params,
        from: &str,
        to: &[String],
    ) -> Result<SendReceipt>;

    /// 按接收者对象投递，默认转换为 ID 后调用 `send_to_ids`
    async fn send(
        &self,
        template_id: &str,
        params: &Params,
        from: &dyn Recipient,
        to: &[Arc<dyn Recipient>],
    ) -> Result<SendReceipt> {
        let ids: Vec<String> = to.iter().map(|r| r.id().to_string()).collect();
        self.send_to_ids(template_id, params, from.id(), &ids).await
    }
}

fn receipt(channel: &str, delivered: usize) -> SendReceipt {
    SendReceipt {
        channel: channel.to_string(),
        message_id: Some(Uuid::now_v7().to_string()),
        delivered,
    }
}

// ---------------------------------------------------------------------------
// 邮件
// ---------------------------------------------------------------------------

/// 模拟邮件发送器
///
/// 生产环境中替换为 SMTP 或邮件服务商的 API 调用
pub struct EmailChannel {
    resolver: Arc<TemplateResolver>,
}

impl EmailChannel {
    pub const NAME: &'static str = "email";

    pub fn new(resolver: Arc<TemplateResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl NoticeChannel for EmailChannel {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn send_to_ids(
        &self,
        template_id: &str,
        params: &Params,
        from: &str,
        to: &[String],
    ) -> Result<SendReceipt> {
        let ResolvedTemplate { title, content } =
            self.resolver.resolve(Self::NAME, template_id, params)?;
        let receipt = receipt(Self::NAME, to.len());

        info!(
            channel = Self::NAME,
            template_id,
            from,
            to = ?to,
            message_id = ?receipt.message_id,
            subject = %title,
            body = %content,
            "模拟发送邮件通知"
        );

        Ok(receipt)
    }
}

// ---------------------------------------------------------------------------
// APP 推送
// ---------------------------------------------------------------------------

/// 模拟 APP 推送发送器
///
/// 生产环境中替换为 APNs / FCM 等推送服务的 SDK 调用
pub struct PushChannel {
    resolver: Arc<TemplateResolver>,
}

impl PushChannel {
    pub const NAME: &'static str = "push";

    pub fn new(resolver: Arc<TemplateResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl NoticeChannel for PushChannel {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn send_to_ids(
        &self,
        template_id: &str,
        params: &Params,
        from: &str,
        to: &[String],
    ) -> Result<SendReceipt> {
        let resolved = self.resolver.resolve(Self::NAME, template_id, params)?;
        let receipt = receipt(Self::NAME, to.len());

        for user_id in to {
            info!(
                channel = Self::NAME,
                template_id,
                from,
                user_id = %user_id,
                message_id = ?receipt.message_id,
                title = %resolved.title,
                "模拟发送 APP 推送通知"
            );
        }

        Ok(receipt)
    }
}

// ---------------------------------------------------------------------------
// 站内广播
// ---------------------------------------------------------------------------

/// 模拟站内广播发送器
///
/// 需要先启动（建立到广播总线的连接）才能投递，
/// 因此同时注册为 `Startable` 组件。
pub struct BroadcastChannel {
    resolver: Arc<TemplateResolver>,
    started: AtomicBool,
}

impl BroadcastChannel {
    pub const NAME: &'static str = "broadcast";

    pub fn new(resolver: Arc<TemplateResolver>) -> Self {
        Self {
            resolver,
            started: AtomicBool::new(false),
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Startable for BroadcastChannel {
    fn component_name(&self) -> &str {
        Self::NAME
    }

    async fn start(&self) -> Result<()> {
        self.started.store(true, Ordering::Release);
        info!(channel = Self::NAME, "广播渠道已连接");
        Ok(())
    }
}

#[async_trait]
impl NoticeChannel for BroadcastChannel {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn send_to_ids(
        &self,
        template_id: &str,
        params: &Params,
        from: &str,
        to: &[String],
    ) -> Result<SendReceipt> {
        if !self.is_started() {
            return Err(NoticeError::SendFailed {
                channel: Self::NAME.to_string(),
                reason: "渠道未启动".to_string(),
            });
        }

        let resolved = self.resolver.resolve(Self::NAME, template_id, params)?;
        let receipt = receipt(Self::NAME, to.len());

        info!(
            channel = Self::NAME,
            template_id,
            from,
            audience = to.len(),
            message_id = ?receipt.message_id,
            content = %resolved.content,
            "模拟发送站内广播"
        );

        Ok(receipt)
    }
}

// ---------------------------------------------------------------------------
// 测试
// ---------------------------------------------------------------------------
