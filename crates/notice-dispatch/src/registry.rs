//! 服务注册表
//!
//! 进程启动时构建一次，显式传入分发器，不使用全局状态：
//! - 按字符串键（区分大小写）解析渠道组件，渠道键为 `{prefix}{小写渠道名}`
//! - 按能力解析单例：模板引擎、模板存储、模板解析器、渠道配置源
//! - 需要启动工作的组件注册为 `Startable`，由 `start()` 统一启动且只启动一次

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::{error, info};

use crate::config_source::NoticeConfig;
use crate::error::{NoticeError, Result};
use crate::sender::NoticeChannel;
use crate::template::{TemplateEngine, TemplateResolver, TemplateStore};

/// 默认的渠道键前缀
pub const DEFAULT_KEY_PREFIX: &str = "notice.";

/// 需要显式启动的组件
#[async_trait]
pub trait Startable: Send + Sync {
    fn component_name(&self) -> &str;

    async fn start(&self) -> Result<()>;
}

/// 服务注册表
pub struct ServiceRegistry {
    key_prefix: String,
    channels: HashMap<String, Arc<dyn NoticeChannel>>,
    resolver: Arc<TemplateResolver>,
    notice_config: Arc<dyn NoticeConfig>,
    startables: Vec<Arc<dyn Startable>>,
    started: AtomicBool,
}

impl ServiceRegistry {
    pub fn builder(
        resolver: Arc<TemplateResolver>,
        notice_config: Arc<dyn NoticeConfig>,
    ) -> ServiceRegistryBuilder {
        ServiceRegistryBuilder::new(resolver, notice_config)
    }

    /// 渠道名对应的注册键
    pub fn channel_key(&self, channel: &str) -> String {
        format!("{}{}", self.key_prefix, channel.to_ascii_lowercase())
    }

    /// 按原始键解析组件，键区分大小写
    pub fn resolve(&self, key: &str) -> Option<Arc<dyn NoticeChannel>> {
        self.channels.get(key).cloned()
    }

    /// 按渠道名查找（不区分大小写），未注册时返回 None
    pub fn lookup_channel(&self, channel: &str) -> Option<Arc<dyn NoticeChannel>> {
        self.resolve(&self.channel_key(channel))
    }

    /// 按渠道名创建渠道，空名称或未注册都视为错误
    pub fn create_channel(&self, channel: &str) -> Result<Arc<dyn NoticeChannel>> {
        if channel.trim().is_empty() {
            return Err(NoticeError::invalid_argument("channel", "渠道名不能为空"));
        }

        self.lookup_channel(channel)
            .ok_or_else(|| NoticeError::ChannelNotFound {
                channel: channel.to_string(),
            })
    }

    /// 已注册的渠道名（排序后）
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .channels
            .keys()
            .map(|key| {
                key.strip_prefix(self.key_prefix.as_str())
                    .unwrap_or(key)
                    .to_string()
            })
            .collect();
        names.sort();
        names
    }

    pub fn template_resolver(&self) -> Arc<TemplateResolver> {
        self.resolver.clone()
    }

    pub fn template_engine(&self) -> Arc<dyn TemplateEngine> {
        self.resolver.engine()
    }

    pub fn template_store(&self) -> Arc<dyn TemplateStore> {
        self.resolver.store()
    }

    pub fn notice_config(&self) -> Arc<dyn NoticeConfig> {
        self.notice_config.clone()
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// 启动所有 `Startable` 组件，返回本次启动的组件数
    ///
    /// 只有第一次调用会执行启动，之后的调用直接返回 0。
    /// 任一组件启动失败即中止并返回该错误。
    pub async fn start(&self) -> Result<usize> {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(0);
        }

        for component in &self.startables {
            if let Err(e) = component.start().await {
                error!(
                    component = component.component_name(),
                    error = %e,
                    "组件启动失败"
                );
                return Err(e);
            }
            info!(component = component.component_name(), "组件已启动");
        }

        Ok(self.startables.len())
    }
}

/// 服务注册表构建器
pub struct ServiceRegistryBuilder {
    key_prefix: String,
    channels: Vec<Arc<dyn NoticeChannel>>,
    resolver: Arc<TemplateResolver>,
    notice_config: Arc<dyn NoticeConfig>,
    startables: Vec<Arc<dyn Startable>>,
}

impl ServiceRegistryBuilder {
    pub fn new(resolver: Arc<TemplateResolver>, notice_config: Arc<dyn NoticeConfig>) -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            channels: Vec::new(),
            resolver,
            notice_config,
            startables: Vec::new(),
        }
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// 注册通知渠道，同名渠道后注册的覆盖先注册的
    pub fn channel(mut self, channel: Arc<dyn NoticeChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    /// 注册需要启动的组件
    pub fn startable(mut self, component: Arc<dyn Startable>) -> Self {
        self.startables.push(component);
        self
    }

    pub fn build(self) -> Result<ServiceRegistry> {
        if self.key_prefix.is_empty() {
            return Err(NoticeError::invalid_argument("key_prefix", "不能为空"));
        }

        let mut channels = HashMap::with_capacity(self.channels.len());
        for channel in self.channels {
            let name = channel.name().to_ascii_lowercase();
            if name.is_empty() {
                return Err(NoticeError::invalid_argument("channel", "渠道名不能为空"));
            }
            info!(channel = %name, "注册通知渠道");
            channels.insert(format!("{}{}", self.key_prefix, name), channel);
        }

        Ok(ServiceRegistry {
            key_prefix: self.key_prefix,
            channels,
            resolver: self.resolver,
            notice_config: self.notice_config,
            startables: self.startables,
            started: AtomicBool::new(false),
        })
    }
}
