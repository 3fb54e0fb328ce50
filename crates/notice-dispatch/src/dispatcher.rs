//! 通知分发器
//!
//! 一次分发的流程：
//! 1. 接收者为空时直接返回，不访问配置源和任何渠道
//! 2. 通过配置源计算各渠道的有效接收者
//! 3. 按渠道名从注册表创建渠道，未注册的渠道记为该渠道的失败
//! 4. 每个渠道在独立任务中投递，单个渠道失败或 panic 不影响其他渠道
//! 5. 按配置源给出的渠道顺序汇总为 `DispatchReport`，记录日志与指标

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use notice_shared::observability::metrics;
use tokio::task::JoinError;
use tracing::{Instrument, debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::error::{NoticeError, Result};
use crate::registry::ServiceRegistry;
use crate::router::ChannelRouter;
use crate::sender::NoticeChannel;
use crate::template::ResolvedTemplate;
use crate::types::{ChannelOutcome, DispatchReport, Params, Recipient, SendReceipt};

/// 单个渠道分组的投递内容，随投递任务一起移动
enum Delivery {
    Recipients {
        from: Arc<dyn Recipient>,
        to: Vec<Arc<dyn Recipient>>,
    },
    Ids {
        from: Arc<str>,
        to: Vec<String>,
    },
}

impl Delivery {
    fn recipient_ids(&self) -> Vec<String> {
        match self {
            Self::Recipients { to, .. } => to.iter().map(|r| r.id().to_string()).collect(),
            Self::Ids { to, .. } => to.clone(),
        }
    }
}

/// 耗时毫秒数，超出 u64 时取上限
fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// 通知分发器
pub struct NoticeDispatcher {
    registry: Arc<ServiceRegistry>,
    router: ChannelRouter,
}

impl NoticeDispatcher {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        let router = ChannelRouter::new(registry.notice_config());
        Self { registry, router }
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// 向接收者对象分发通知
    ///
    /// 只有参数错误会返回 `Err`，渠道级失败记录在报告中。
    #[instrument(skip_all, fields(template_id = %template_id, recipients = to.len()))]
    pub async fn send(
        &self,
        template_id: &str,
        params: &Params,
        from: Arc<dyn Recipient>,
        to: &[Arc<dyn Recipient>],
    ) -> Result<DispatchReport> {
        let dispatch_id = Uuid::now_v7().to_string();
        if to.is_empty() {
            debug!(dispatch_id = %dispatch_id, "接收者为空，跳过分发");
            return Ok(DispatchReport::empty(dispatch_id, template_id));
        }

        let started = Instant::now();
        let groups = self
            .router
            .route_recipients(template_id, to)?
            .into_iter()
            .map(|(channel, to)| {
                let from = from.clone();
                (channel, Delivery::Recipients { from, to })
            })
            .collect();

        Ok(self
            .dispatch(dispatch_id, template_id, params, groups, started)
            .await)
    }

    /// 向接收者 ID 分发通知，ID 原样转交给渠道
    #[instrument(skip_all, fields(template_id = %template_id, recipients = to.len()))]
    pub async fn send_to_ids(
        &self,
        template_id: &str,
        params: &Params,
        from: &str,
        to: &[String],
    ) -> Result<DispatchReport> {
        let dispatch_id = Uuid::now_v7().to_string();
        if to.is_empty() {
            debug!(dispatch_id = %dispatch_id, "接收者为空，跳过分发");
            return Ok(DispatchReport::empty(dispatch_id, template_id));
        }

        let started = Instant::now();
        let from: Arc<str> = Arc::from(from);
        let groups = self
            .router
            .route(template_id, to)?
            .into_iter()
            .map(|(channel, to)| {
                let from = from.clone();
                (channel, Delivery::Ids { from, to })
            })
            .collect();

        Ok(self
            .dispatch(dispatch_id, template_id, params, groups, started)
            .await)
    }

    /// 按渠道解析模板，供渠道实现之外的调用方预览渲染结果
    pub fn resolve_template(
        &self,
        channel: &str,
        template_id: &str,
        params: &Params,
    ) -> Result<ResolvedTemplate> {
        self.registry
            .template_resolver()
            .resolve(channel, template_id, params)
    }

    async fn dispatch(
        &self,
        dispatch_id: String,
        template_id: &str,
        params: &Params,
        groups: Vec<(String, Delivery)>,
        started: Instant,
    ) -> DispatchReport {
        let shared_template: Arc<str> = Arc::from(template_id);
        let shared_params = Arc::new(params.clone());

        let futures: Vec<_> = groups
            .into_iter()
            .map(|(channel, delivery)| {
                self.deliver(
                    shared_template.clone(),
                    shared_params.clone(),
                    channel,
                    delivery,
                )
            })
            .collect();

        // 结果顺序与配置源给出的渠道顺序一致
        let outcomes = futures::future::join_all(futures).await;

        let report = DispatchReport {
            dispatch_id,
            template_id: template_id.to_string(),
            outcomes,
            duration_ms: elapsed_ms(started),
            dispatched_at: Utc::now(),
        };

        let status = if report.is_success() {
            "success"
        } else if report.is_partial_success() {
            "partial"
        } else {
            "failed"
        };
        metrics::record_dispatch(template_id, status, started.elapsed().as_secs_f64());

        if report.is_success() {
            info!(
                dispatch_id = %report.dispatch_id,
                channels = report.outcomes.len(),
                duration_ms = report.duration_ms,
                "通知分发完成"
            );
        } else if report.is_partial_success() {
            warn!(
                dispatch_id = %report.dispatch_id,
                success_count = report.success_count(),
                failed_channels = ?report.failed_channels(),
                "通知分发部分失败"
            );
        } else {
            error!(
                dispatch_id = %report.dispatch_id,
                failed_channels = ?report.failed_channels(),
                "通知分发全部失败"
            );
        }

        report
    }

    /// 投递单个渠道分组
    ///
    /// 渠道发送在独立的 tokio 任务中执行，任务 panic 或被取消
    /// 只会记为该渠道的 `SendFailed`。
    async fn deliver(
        &self,
        template_id: Arc<str>,
        params: Arc<Params>,
        channel: String,
        delivery: Delivery,
    ) -> ChannelOutcome {
        let started = Instant::now();
        let recipient_ids = delivery.recipient_ids();

        let result = match self.registry.create_channel(&channel) {
            Ok(sender) => {
                let task = tokio::spawn(
                    send_group(sender, template_id, params, delivery).in_current_span(),
                );
                match task.await {
                    Ok(result) => result,
                    Err(e) => Err(task_failure(&channel, &e)),
                }
            }
            Err(e) => Err(e),
        };

        match &result {
            Ok(receipt) => {
                metrics::record_channel_send(&channel, "success");
                debug!(
                    channel = %channel,
                    delivered = receipt.delivered,
                    message_id = ?receipt.message_id,
                    "渠道投递成功"
                );
            }
            Err(e) => {
                metrics::record_channel_send(&channel, "failed");
                error!(
                    channel = %channel,
                    code = e.code(),
                    error = %e,
                    "渠道投递失败"
                );
            }
        }

        ChannelOutcome {
            channel,
            recipient_ids,
            result,
            duration_ms: elapsed_ms(started),
        }
    }
}

async fn send_group(
    sender: Arc<dyn NoticeChannel>,
    template_id: Arc<str>,
    params: Arc<Params>,
    delivery: Delivery,
) -> Result<SendReceipt> {
    match delivery {
        Delivery::Recipients { from, to } => {
            sender
                .send(&template_id, &params, from.as_ref(), &to)
                .await
        }
        Delivery::Ids { from, to } => sender.send_to_ids(&template_id, &params, &from, &to).await,
    }
}

fn task_failure(channel: &str, e: &JoinError) -> NoticeError {
    let reason = if e.is_panic() {
        "发送任务异常终止 (panic)"
    } else {
        "发送任务被取消"
    };
    NoticeError::SendFailed {
        channel: channel.to_string(),
        reason: reason.to_string(),
    }
}
