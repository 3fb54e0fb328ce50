//! 模板解析器
//!
//! 根据渠道名和模板 ID 查找模板定义，按 `{channel}_title` -> `default_title`
//! （正文同理）的顺序选择模板文本，再交给模板引擎展开。
//! 标题和正文各自独立回退、独立展开。

use std::sync::Arc;

use tracing::{debug, error};

use super::engine::TemplateEngine;
use super::store::{TEMPLATE_CATEGORY, TemplateStore};
use crate::error::{NoticeError, Result};
use crate::types::Params;

/// 渲染完成的标题和正文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    pub title: String,
    pub content: String,
}

/// 模板解析器
#[derive(Clone)]
pub struct TemplateResolver {
    store: Arc<dyn TemplateStore>,
    engine: Arc<dyn TemplateEngine>,
}

impl TemplateResolver {
    pub fn new(store: Arc<dyn TemplateStore>, engine: Arc<dyn TemplateEngine>) -> Self {
        Self { store, engine }
    }

    pub fn store(&self) -> Arc<dyn TemplateStore> {
        self.store.clone()
    }

    pub fn engine(&self) -> Arc<dyn TemplateEngine> {
        self.engine.clone()
    }

    /// 解析指定渠道的标题和正文
    pub fn resolve(
        &self,
        channel: &str,
        template_id: &str,
        params: &Params,
    ) -> Result<ResolvedTemplate> {
        if template_id.is_empty() {
            return Err(NoticeError::invalid_argument("template_id", "不能为空"));
        }

        let Some(definition) = self.store.find(TEMPLATE_CATEGORY, template_id) else {
            error!(
                template_id,
                category = TEMPLATE_CATEGORY,
                "指定的模板不存在"
            );
            return Err(NoticeError::TemplateNotFound {
                category: TEMPLATE_CATEGORY.to_string(),
                template_id: template_id.to_string(),
            });
        };

        let channel = channel.to_ascii_lowercase();
        let title = self.expand_field(
            definition.channel_title(&channel),
            template_id,
            "default_title",
            params,
        )?;
        let content = self.expand_field(
            definition.channel_content(&channel),
            template_id,
            "default_content",
            params,
        )?;

        debug!(template_id, channel = %channel, "模板解析完成");
        Ok(ResolvedTemplate { title, content })
    }

    fn expand_field(
        &self,
        text: Option<&str>,
        template_id: &str,
        default_field: &str,
        params: &Params,
    ) -> Result<String> {
        let text = text.ok_or_else(|| NoticeError::IncompleteTemplate {
            template_id: template_id.to_string(),
            field: default_field.to_string(),
        })?;

        self.engine.expand(params, text)
    }
}
