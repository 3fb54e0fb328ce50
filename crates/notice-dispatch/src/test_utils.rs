//! 测试工具模块
//!
//! 提供单元测试、集成测试和基准测试共用的渠道替身、
//! 固定路由配置源以及数据构造函数。

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::config_source::NoticeConfig;
use crate::error::{NoticeError, Result};
use crate::registry::ServiceRegistry;
use crate::sender::NoticeChannel;
use crate::template::{
    InMemoryTemplateStore, PlaceholderEngine, ResolvedTemplate, TemplateDefinition,
    TemplateResolver,
};
use crate::types::{ChannelRecipients, Params, Recipient, SendReceipt, User};

// ==================== 数据构造 ====================

/// 构造共享的接收者列表
pub fn users(ids: &[&str]) -> Vec<Arc<dyn Recipient>> {
    ids.iter().map(|id| User::shared(*id)).collect()
}

/// 构造 ID 列表
pub fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

/// 构造参数集
pub fn params(pairs: &[(&str, Value)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// 构造渠道路由结果
pub fn routes(pairs: &[(&str, &[&str])]) -> ChannelRecipients {
    pairs
        .iter()
        .map(|(channel, members)| (channel.to_string(), ids(members)))
        .collect()
}

/// 基于内存模板存储的解析器
pub fn resolver_with(templates: &[(&str, TemplateDefinition)]) -> Result<Arc<TemplateResolver>> {
    let store = InMemoryTemplateStore::new();
    for (template_id, definition) in templates {
        store.insert(*template_id, definition.clone())?;
    }
    Ok(Arc::new(TemplateResolver::new(
        Arc::new(store),
        Arc::new(PlaceholderEngine::new()),
    )))
}

/// 用固定路由和给定渠道构建注册表
pub fn registry_with(
    resolver: Arc<TemplateResolver>,
    config: Arc<dyn NoticeConfig>,
    channels: &[Arc<RecordingChannel>],
) -> Result<ServiceRegistry> {
    channels
        .iter()
        .fold(ServiceRegistry::builder(resolver, config), |builder, channel| {
            builder.channel(channel.clone())
        })
        .build()
}

// ==================== 固定路由配置源 ====================

/// 固定返回同一份路由结果的配置源
pub struct FixedNoticeConfig {
    routes: ChannelRecipients,
    calls: AtomicUsize,
}

impl FixedNoticeConfig {
    pub fn new(routes: ChannelRecipients) -> Self {
        Self {
            routes,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl NoticeConfig for FixedNoticeConfig {
    fn valid_channels(&self, _template_id: &str, _recipient_ids: &[String]) -> ChannelRecipients {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.routes.clone()
    }
}

// ==================== 记录型渠道 ====================

/// 一次渠道调用的记录
#[derive(Debug, Clone)]
pub struct RecordedSend {
    pub template_id: String,
    pub params: Params,
    pub from: String,
    pub to: Vec<String>,
    /// 配置了解析器时记录渲染结果
    pub rendered: Option<ResolvedTemplate>,
}

/// 记录每次调用的渠道替身，可配置为失败
pub struct RecordingChannel {
    name: String,
    failure: Option<String>,
    resolver: Option<Arc<TemplateResolver>>,
    calls: Mutex<Vec<RecordedSend>>,
}

impl RecordingChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failure: None,
            resolver: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 每次发送都返回 SendFailed
    pub fn failing(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::new(name)
        }
    }

    /// 发送前按本渠道名解析模板，解析失败即发送失败
    pub fn rendering(mut self, resolver: Arc<TemplateResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn calls(&self) -> Vec<RecordedSend> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl NoticeChannel for RecordingChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_to_ids(
        &self,
        template_id: &str,
        params: &Params,
        from: &str,
        to: &[String],
    ) -> Result<SendReceipt> {
        let rendered = match &self.resolver {
            Some(resolver) => Some(resolver.resolve(&self.name, template_id, params)?),
            None => None,
        };

        self.calls.lock().push(RecordedSend {
            template_id: template_id.to_string(),
            params: params.clone(),
            from: from.to_string(),
            to: to.to_vec(),
            rendered,
        });

        if let Some(reason) = &self.failure {
            return Err(NoticeError::SendFailed {
                channel: self.name.clone(),
                reason: reason.clone(),
            });
        }

        Ok(SendReceipt {
            channel: self.name.clone(),
            message_id: Some(format!("{}-{}", self.name, self.call_count())),
            delivered: to.len(),
        })
    }
}
