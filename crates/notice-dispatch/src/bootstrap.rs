//! 根据配置装配服务注册表
//!
//! 模板和路由都从动态配置读取，重载配置后无需重建注册表。

use std::sync::Arc;

use notice_shared::dynamic_config::DynamicConfig;
use tracing::{info, warn};

use crate::config_source::SettingsNoticeConfig;
use crate::error::Result;
use crate::registry::ServiceRegistry;
use crate::sender::{BroadcastChannel, EmailChannel, PushChannel};
use crate::template::{PlaceholderEngine, SettingsTemplateStore, TemplateResolver};

/// 构建注册表并注册配置中启用的内置渠道
///
/// 未知的渠道名只记录警告，不阻止启动。
pub fn build_registry(config: &DynamicConfig) -> Result<ServiceRegistry> {
    let snapshot = config.load();
    let settings = &snapshot.notice;

    let resolver = Arc::new(TemplateResolver::new(
        Arc::new(SettingsTemplateStore::new(config.clone())),
        Arc::new(PlaceholderEngine::new()),
    ));
    let notice_config = Arc::new(SettingsNoticeConfig::new(config.clone()));

    let mut builder =
        ServiceRegistry::builder(resolver.clone(), notice_config).key_prefix(&settings.key_prefix);

    for name in &settings.channels {
        match name.to_ascii_lowercase().as_str() {
            EmailChannel::NAME => {
                builder = builder.channel(Arc::new(EmailChannel::new(resolver.clone())));
            }
            PushChannel::NAME => {
                builder = builder.channel(Arc::new(PushChannel::new(resolver.clone())));
            }
            BroadcastChannel::NAME => {
                let broadcast = Arc::new(BroadcastChannel::new(resolver.clone()));
                builder = builder.channel(broadcast.clone()).startable(broadcast);
            }
            _ => warn!(channel = %name, "未知的内置渠道，已跳过"),
        }
    }

    let registry = builder.build()?;
    info!(
        key_prefix = %settings.key_prefix,
        channels = ?registry.channel_names(),
        templates = settings.templates.len(),
        routes = settings.routes.len(),
        "服务注册表已构建"
    );
    Ok(registry)
}
