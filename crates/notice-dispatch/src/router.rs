//! 渠道路由
//!
//! 把接收者对象转换为 ID 列表交给配置源判断，
//! 再把返回的 ID 分组还原为接收者对象分组。
//! 同一接收者可以同时出现在多个渠道，路由器不做去重。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config_source::NoticeConfig;
use crate::error::{NoticeError, Result};
use crate::types::{ChannelRecipients, Recipient};

/// 渠道路由器
#[derive(Clone)]
pub struct ChannelRouter {
    config: Arc<dyn NoticeConfig>,
}

impl ChannelRouter {
    pub fn new(config: Arc<dyn NoticeConfig>) -> Self {
        Self { config }
    }

    /// 计算模板在各渠道上的有效接收者
    ///
    /// 候选列表为空时直接返回空映射，不访问配置源。
    /// 配置源返回的候选集合之外的 ID 会被丢弃。
    pub fn route(&self, template_id: &str, candidate_ids: &[String]) -> Result<ChannelRecipients> {
        if template_id.is_empty() {
            return Err(NoticeError::invalid_argument("template_id", "不能为空"));
        }
        if candidate_ids.is_empty() {
            return Ok(ChannelRecipients::new());
        }

        let candidates: HashSet<&str> = candidate_ids.iter().map(String::as_str).collect();
        let mut routes = self.config.valid_channels(template_id, candidate_ids);

        routes.retain(|channel, ids| {
            let before = ids.len();
            ids.retain(|id| candidates.contains(id.as_str()));
            if ids.len() != before {
                warn!(
                    template_id,
                    channel = %channel,
                    dropped = before - ids.len(),
                    "配置源返回了候选列表之外的接收者，已忽略"
                );
            }
            !ids.is_empty()
        });

        debug!(
            template_id,
            candidates = candidate_ids.len(),
            channels = ?routes.channels().collect::<Vec<_>>(),
            "渠道路由完成"
        );

        Ok(routes)
    }

    /// 对象类型的路由：返回每个渠道对应的接收者对象子集
    ///
    /// 接收者对象在各渠道分组间按引用共享。
    pub fn route_recipients(
        &self,
        template_id: &str,
        recipients: &[Arc<dyn Recipient>],
    ) -> Result<Vec<(String, Vec<Arc<dyn Recipient>>)>> {
        let candidate_ids: Vec<String> = recipients.iter().map(|r| r.id().to_string()).collect();
        let routes = self.route(template_id, &candidate_ids)?;
        Ok(group_recipients(routes, recipients))
    }
}

/// 按 ID 分组还原接收者对象
///
/// 重复 ID 取首次出现的对象；找不到的 ID 跳过。
pub fn group_recipients(
    routes: ChannelRecipients,
    recipients: &[Arc<dyn Recipient>],
) -> Vec<(String, Vec<Arc<dyn Recipient>>)> {
    let mut by_id: HashMap<&str, &Arc<dyn Recipient>> = HashMap::with_capacity(recipients.len());
    for recipient in recipients {
        by_id.entry(recipient.id()).or_insert(recipient);
    }

    routes
        .into_iter()
        .map(|(channel, ids)| {
            let subset: Vec<Arc<dyn Recipient>> = ids
                .iter()
                .filter_map(|id| match by_id.get(id.as_str()) {
                    Some(recipient) => Some(Arc::clone(recipient)),
                    None => {
                        debug!(channel = %channel, recipient_id = %id, "接收者不在原始列表中，跳过");
                        None
                    }
                })
                .collect();
            (channel, subset)
        })
        .filter(|(_, subset)| !subset.is_empty())
        .collect()
}
