//! 通知渠道配置源
//!
//! 给定模板 ID 和候选接收者 ID，返回每个渠道上有效的接收者子集。
//! 渠道是否可用完全由配置源决定，路由器不做任何判断。

use std::collections::HashSet;

use notice_shared::dynamic_config::DynamicConfig;

use crate::types::ChannelRecipients;

/// 渠道配置源
///
/// 对任意模板都要给出结果（未知模板返回空映射），
/// 且结果中不得出现输入集合之外的接收者。
#[cfg_attr(test, mockall::automock)]
pub trait NoticeConfig: Send + Sync {
    fn valid_channels(&self, template_id: &str, recipient_ids: &[String]) -> ChannelRecipients;
}

/// 基于动态配置的渠道配置源
///
/// 读取 `notice.routes.<template_id>`：渠道列表决定投递范围，
/// `excluded` 表示接收者对某个渠道的退订。
#[derive(Clone)]
pub struct SettingsNoticeConfig {
    config: DynamicConfig,
}

impl SettingsNoticeConfig {
    pub fn new(config: DynamicConfig) -> Self {
        Self { config }
    }
}

impl NoticeConfig for SettingsNoticeConfig {
    fn valid_channels(&self, template_id: &str, recipient_ids: &[String]) -> ChannelRecipients {
        let snapshot = self.config.load();
        let Some(rule) = snapshot.notice.routes.get(template_id) else {
            return ChannelRecipients::new();
        };

        let mut result = ChannelRecipients::new();
        for channel in &rule.channels {
            let channel = channel.to_ascii_lowercase();
            if result.contains(&channel) {
                continue;
            }
            let excluded: HashSet<&str> = rule
                .excluded
                .get(&channel)
                .map(|ids| ids.iter().map(String::as_str).collect())
                .unwrap_or_default();

            let ids: Vec<String> = recipient_ids
                .iter()
                .filter(|id| !excluded.contains(id.as_str()))
                .cloned()
                .collect();

            if !ids.is_empty() {
                result.insert(channel, ids);
            }
        }

        result
    }
}
