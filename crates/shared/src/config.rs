//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, SharedError};
use crate::observability::ObservabilityConfig;

/// 模板定义中必须存在的兜底字段
pub const REQUIRED_TEMPLATE_FIELDS: [&str; 2] = ["default_title", "default_content"];

/// 单个模板的渠道路由规则
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct RouteRule {
    /// 该模板允许投递的渠道
    pub channels: Vec<String>,
    /// 按渠道退订的接收者 ID
    #[serde(default)]
    pub excluded: HashMap<String, Vec<String>>,
}

/// 通知分发配置
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoticeSettings {
    /// 渠道在服务注册表中的键前缀，如 notice.email
    pub key_prefix: String,
    /// 启动时注册的内置渠道
    pub channels: Vec<String>,
    /// 模板 ID -> 字段表（default_title、email_content 等）
    pub templates: HashMap<String, HashMap<String, String>>,
    /// 模板 ID -> 路由规则
    pub routes: HashMap<String, RouteRule>,
}

impl Default for NoticeSettings {
    fn default() -> Self {
        Self {
            key_prefix: "notice.".to_string(),
            channels: vec![
                "email".to_string(),
                "push".to_string(),
                "broadcast".to_string(),
            ],
            templates: HashMap::new(),
            routes: HashMap::new(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub observability: ObservabilityConfig,
    pub notice: NoticeSettings,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（NOTICE_ 前缀，`__` 分隔层级，如 NOTICE_NOTICE__KEY_PREFIX -> notice.key_prefix）
    pub fn load(service_name: &str) -> std::result::Result<Self, ConfigError> {
        let env = std::env::var("NOTICE_ENV").unwrap_or_else(|_| "development".to_string());

        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env.clone())?
            .add_source(File::from(Path::new(&config_dir).join("default.toml")).required(false))
            .add_source(
                File::from(Path::new(&config_dir).join(format!("{}.toml", env))).required(false),
            )
            .add_source(
                File::from(Path::new(&config_dir).join(format!("{}.toml", service_name)))
                    .required(false),
            )
            // 字段名本身含下划线（default_title），层级分隔符使用双下划线
            .add_source(
                Environment::with_prefix("NOTICE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// 加载并校验配置
    pub fn load_validated(service_name: &str) -> Result<Self> {
        let config = Self::load(service_name)?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置的完整性
    ///
    /// 模板必须带有 default_title 和 default_content，否则渠道兜底解析无从进行。
    pub fn validate(&self) -> Result<()> {
        if self.notice.key_prefix.trim().is_empty() {
            return Err(SharedError::Validation(
                "notice.key_prefix 不能为空".to_string(),
            ));
        }

        for (template_id, fields) in &self.notice.templates {
            for required in REQUIRED_TEMPLATE_FIELDS {
                let present = fields.get(required).is_some_and(|v| !v.is_empty());
                if !present {
                    return Err(SharedError::Validation(format!(
                        "模板 {template_id} 缺少字段 {required}"
                    )));
                }
            }
        }

        for (template_id, rule) in &self.notice.routes {
            if rule.channels.iter().any(|c| c.trim().is_empty()) {
                return Err(SharedError::Validation(format!(
                    "模板 {template_id} 的路由包含空渠道名"
                )));
            }
        }

        Ok(())
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
