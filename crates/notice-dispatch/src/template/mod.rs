//! 通知模板
//!
//! 模板存储、模板引擎以及按渠道回退的标题/正文解析。

pub mod engine;
pub mod resolver;
pub mod store;

pub use engine::{PlaceholderEngine, TemplateEngine};
pub use resolver::{ResolvedTemplate, TemplateResolver};
pub use store::{
    InMemoryTemplateStore, SettingsTemplateStore, TEMPLATE_CATEGORY, TemplateDefinition,
    TemplateStore,
};
