//! 通知分发类型定义
//!
//! 定义接收者、参数集、渠道分组以及分发报告等数据结构。

use std::collections::HashMap;
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ChannelFailure, NoticeError, Result};

/// 模板参数集，原样转交给模板引擎
pub type Params = HashMap<String, serde_json::Value>;

/// 渠道 -> 该渠道有效的接收者 ID
///
/// 渠道按插入顺序排列，即配置源给出的顺序；每个渠道内的 ID 保持输入顺序。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelRecipients {
    entries: Vec<(String, Vec<String>)>,
}

impl ChannelRecipients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, channel: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == channel)
            .map(|(_, ids)| ids.as_slice())
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == channel)
    }

    /// 插入渠道分组，已存在的渠道原位替换，不改变其顺序
    pub fn insert(&mut self, channel: impl Into<String>, ids: Vec<String>) {
        let channel = channel.into();
        match self.entries.iter_mut().find(|(name, _)| *name == channel) {
            Some((_, existing)) => *existing = ids,
            None => self.entries.push((channel, ids)),
        }
    }

    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, ids)| (name.as_str(), ids.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &mut Vec<String>) -> bool) {
        self.entries.retain_mut(|(name, ids)| keep(name.as_str(), ids));
    }
}

impl IntoIterator for ChannelRecipients {
    type Item = (String, Vec<String>);
    type IntoIter = std::vec::IntoIter<(String, Vec<String>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, Vec<String>)> for ChannelRecipients {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        let mut result = Self::new();
        for (channel, ids) in iter {
            result.insert(channel, ids);
        }
        result
    }
}

impl Index<&str> for ChannelRecipients {
    type Output = [String];

    fn index(&self, channel: &str) -> &[String] {
        match self.get(channel) {
            Some(ids) => ids,
            None => panic!("渠道 {channel} 不在分组中"),
        }
    }
}

/// 通知接收者
///
/// 分发引擎只关心稳定的 ID，其余信息原样透传给渠道。
pub trait Recipient: Send + Sync + fmt::Debug {
    fn id(&self) -> &str;
}

/// 默认的用户实现
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// 包装为可在多个渠道分组间共享的接收者
    pub fn shared(id: impl Into<String>) -> Arc<dyn Recipient> {
        Arc::new(Self::new(id))
    }
}

impl Recipient for User {
    fn id(&self) -> &str {
        &self.id
    }
}

/// 渠道发送回执
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    pub channel: String,
    /// 外部渠道返回的消息标识，用于追踪投递状态
    pub message_id: Option<String>,
    /// 本次投递的接收者数量
    pub delivered: usize,
}

/// 单个渠道的投递结果
#[derive(Debug)]
pub struct ChannelOutcome {
    pub channel: String,
    pub recipient_ids: Vec<String>,
    pub result: Result<SendReceipt>,
    pub duration_ms: u64,
}

impl ChannelOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&NoticeError> {
        self.result.as_ref().err()
    }
}

/// 一次分发调用的完整报告
#[derive(Debug)]
pub struct DispatchReport {
    pub dispatch_id: String,
    pub template_id: String,
    pub outcomes: Vec<ChannelOutcome>,
    pub duration_ms: u64,
    pub dispatched_at: DateTime<Utc>,
}

impl DispatchReport {
    /// 没有任何渠道被调用的报告
    pub fn empty(dispatch_id: impl Into<String>, template_id: impl Into<String>) -> Self {
        Self {
            dispatch_id: dispatch_id.into(),
            template_id: template_id.into(),
            outcomes: Vec::new(),
            duration_ms: 0,
            dispatched_at: Utc::now(),
        }
    }

    /// 所有被调用的渠道均成功（没有渠道被调用也算成功）
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(ChannelOutcome::is_success)
    }

    pub fn is_partial_success(&self) -> bool {
        self.success_count() > 0 && self.failure_count() > 0
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    pub fn failed_channels(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.channel.as_str())
            .collect()
    }

    pub fn outcome(&self, channel: &str) -> Option<&ChannelOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.channel.eq_ignore_ascii_case(channel))
    }

    /// 将渠道级失败汇总为一个错误
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        let failures = self
            .outcomes
            .into_iter()
            .filter_map(|o| match o.result {
                Ok(_) => None,
                Err(error) => Some(ChannelFailure {
                    channel: o.channel,
                    error,
                }),
            })
            .collect();

        Err(NoticeError::DispatchFailed { failures })
    }
}
