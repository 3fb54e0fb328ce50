//! 模板存储
//!
//! 模板定义是一张字段表，按约定使用 `{channel}_title`、`{channel}_content`、
//! `default_title`、`default_content` 作为键。渠道字段可选，默认字段必填。

use std::collections::HashMap;

use notice_shared::config::REQUIRED_TEMPLATE_FIELDS;
use notice_shared::dynamic_config::DynamicConfig;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{NoticeError, Result};

/// 消息模板所在的分类
pub const TEMPLATE_CATEGORY: &str = "msg.template";

/// 模板定义
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateDefinition {
    fields: HashMap<String, String>,
}

impl TemplateDefinition {
    pub fn new(default_title: impl Into<String>, default_content: impl Into<String>) -> Self {
        Self::default()
            .with_field("default_title", default_title)
            .with_field("default_content", default_content)
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// 非空字段值
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// 渠道标题模板，渠道字段缺失或为空时回退到 default_title
    pub fn channel_title(&self, channel: &str) -> Option<&str> {
        self.channel_field(channel, "title")
    }

    /// 渠道正文模板，渠道字段缺失或为空时回退到 default_content
    pub fn channel_content(&self, channel: &str) -> Option<&str> {
        self.channel_field(channel, "content")
    }

    fn channel_field(&self, channel: &str, kind: &str) -> Option<&str> {
        self.get(&format!("{channel}_{kind}"))
            .or_else(|| self.get(&format!("default_{kind}")))
    }

    /// 校验默认字段是否齐全
    pub fn validate(&self, template_id: &str) -> Result<()> {
        for field in REQUIRED_TEMPLATE_FIELDS {
            if self.get(field).is_none() {
                return Err(NoticeError::IncompleteTemplate {
                    template_id: template_id.to_string(),
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl From<HashMap<String, String>> for TemplateDefinition {
    fn from(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }
}

/// 模板存储接口
#[cfg_attr(test, mockall::automock)]
pub trait TemplateStore: Send + Sync {
    fn find(&self, category: &str, template_id: &str) -> Option<TemplateDefinition>;
}

/// 内存模板存储
///
/// 写入时校验默认字段，保证解析阶段不会遇到不完整的定义。
#[derive(Default)]
pub struct InMemoryTemplateStore {
    entries: RwLock<HashMap<(String, String), TemplateDefinition>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册消息模板
    pub fn insert(
        &self,
        template_id: impl Into<String>,
        definition: TemplateDefinition,
    ) -> Result<()> {
        self.insert_in(TEMPLATE_CATEGORY, template_id, definition)
    }

    pub fn insert_in(
        &self,
        category: impl Into<String>,
        template_id: impl Into<String>,
        definition: TemplateDefinition,
    ) -> Result<()> {
        let template_id = template_id.into();
        if template_id.is_empty() {
            return Err(NoticeError::invalid_argument("template_id", "不能为空"));
        }
        definition.validate(&template_id)?;

        self.entries
            .write()
            .insert((category.into(), template_id), definition);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl TemplateStore for InMemoryTemplateStore {
    fn find(&self, category: &str, template_id: &str) -> Option<TemplateDefinition> {
        self.entries
            .read()
            .get(&(category.to_string(), template_id.to_string()))
            .cloned()
    }
}

/// 基于动态配置的模板存储
///
/// 每次查找读取最新的配置快照，配置重载后立即生效。
#[derive(Clone)]
pub struct SettingsTemplateStore {
    config: DynamicConfig,
}

impl SettingsTemplateStore {
    pub fn new(config: DynamicConfig) -> Self {
        Self { config }
    }
}

impl TemplateStore for SettingsTemplateStore {
    fn find(&self, category: &str, template_id: &str) -> Option<TemplateDefinition> {
        if category != TEMPLATE_CATEGORY {
            return None;
        }

        self.config
            .load()
            .notice
            .templates
            .get(template_id)
            .cloned()
            .map(TemplateDefinition::from)
    }
}
