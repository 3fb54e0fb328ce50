//! 通知分发服务
//!
//! 装配服务注册表并启动渠道组件，SIGHUP 时重新加载模板和路由配置。

use std::sync::Arc;

use anyhow::Result;
use notice_dispatch::{NoticeDispatcher, bootstrap};
use notice_shared::{config::AppConfig, dynamic_config::DynamicConfig, observability};
use tokio::signal;
use tracing::{error, info, warn};

const SERVICE_NAME: &str = "notice-dispatch";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载配置，失败时使用默认配置
    let config = AppConfig::load_validated(SERVICE_NAME).unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {e}");
        AppConfig::default()
    });

    // 2. 初始化可观测性
    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config)?;

    info!("Starting {}...", SERVICE_NAME);
    info!(
        environment = %config.environment,
        templates = config.notice.templates.len(),
        routes = config.notice.routes.len(),
        "Configuration loaded"
    );

    // 3. 装配注册表并启动组件
    let dynamic_config = DynamicConfig::new(config);
    let registry = Arc::new(bootstrap::build_registry(&dynamic_config)?);
    let started = registry.start().await?;
    info!(components = started, "Startable components started");

    let dispatcher = NoticeDispatcher::new(registry);
    info!(
        channels = ?dispatcher.registry().channel_names(),
        "Notice dispatcher ready"
    );

    run_until_shutdown(&dynamic_config).await;

    info!("Service shutdown complete");
    Ok(())
}

/// 等待退出信号，期间处理配置重载
async fn run_until_shutdown(dynamic_config: &DynamicConfig) {
    #[cfg(unix)]
    let mut hangup = match signal::unix::signal(signal::unix::SignalKind::hangup()) {
        Ok(stream) => Some(stream),
        Err(e) => {
            warn!(error = %e, "Failed to install SIGHUP handler, reload disabled");
            None
        }
    };

    loop {
        #[cfg(unix)]
        let reload = async {
            match hangup.as_mut() {
                Some(stream) => {
                    stream.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        };

        #[cfg(not(unix))]
        let reload = std::future::pending::<()>();

        tokio::select! {
            result = signal::ctrl_c() => {
                if let Err(e) = result {
                    error!(error = %e, "Failed to listen for Ctrl+C");
                }
                info!("Received Ctrl+C, starting graceful shutdown...");
                return;
            }
            _ = reload => {
                info!("Received SIGHUP, reloading configuration...");
                if let Err(e) = dynamic_config.reload(SERVICE_NAME) {
                    error!(code = e.code(), error = %e, "Configuration reload failed, keeping current config");
                }
            }
        }
    }
}
