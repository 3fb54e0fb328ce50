//! 测试环境管理
//!
//! 以配置为唯一输入构建注册表和分发器，与服务二进制的装配路径一致。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use config::{Config, File, FileFormat};
use notice_dispatch::{NoticeDispatcher, ServiceRegistry, bootstrap};
use notice_shared::config::AppConfig;
use notice_shared::dynamic_config::DynamicConfig;

/// 端到端测试环境
pub struct TestEnvironment {
    pub config: DynamicConfig,
    pub registry: Arc<ServiceRegistry>,
    pub dispatcher: NoticeDispatcher,
}

impl TestEnvironment {
    /// 使用仓库自带的 config/default.toml
    pub async fn from_default_config() -> Result<Self> {
        let path = default_config_path();
        let config: AppConfig = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;
        Self::from_app_config(config).await
    }

    /// 使用内联 TOML 配置
    pub async fn from_toml(toml: &str) -> Result<Self> {
        let config = parse_toml(toml)?;
        Self::from_app_config(config).await
    }

    pub async fn from_app_config(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let config = DynamicConfig::new(config);
        let registry = Arc::new(bootstrap::build_registry(&config)?);
        registry.start().await?;
        let dispatcher = NoticeDispatcher::new(registry.clone());

        Ok(Self {
            config,
            registry,
            dispatcher,
        })
    }

    /// 用新的 TOML 配置替换当前配置
    pub fn apply_toml(&self, toml: &str) -> Result<()> {
        let config = parse_toml(toml)?;
        config.validate()?;
        self.config.update(config);
        Ok(())
    }
}

pub fn parse_toml(toml: &str) -> Result<AppConfig> {
    Ok(Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?
        .try_deserialize()?)
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("config")
        .join("default.toml")
}
