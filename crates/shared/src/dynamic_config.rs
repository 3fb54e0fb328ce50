//! 配置热更新模块
//!
//! 各组件通过 `DynamicConfig` 持有 `Arc<ArcSwap<AppConfig>>`，
//! 读取几乎无开销（一次原子 load），写入通过 `update`/`reload` 触发。
//! 模板和路由规则都从这里读取，重载后下一次分发即可生效。

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::watch;
use tracing::info;

use crate::config::AppConfig;
use crate::error::Result;

/// 动态配置容器
///
/// 使用 `ArcSwap` 实现近零开销的读取，
/// 配合 `watch` channel 让消费方异步等待配置变更通知。
#[derive(Clone)]
pub struct DynamicConfig {
    /// 当前配置快照，读取端通过 ArcSwap::load 获取（无锁）
    current: Arc<ArcSwap<AppConfig>>,
    tx: watch::Sender<Arc<AppConfig>>,
    rx: watch::Receiver<Arc<AppConfig>>,
}

impl DynamicConfig {
    /// 用初始配置创建 DynamicConfig
    pub fn new(config: AppConfig) -> Self {
        let config = Arc::new(config);
        let (tx, rx) = watch::channel(config.clone());
        Self {
            current: Arc::new(ArcSwap::from(config)),
            tx,
            rx,
        }
    }

    /// 获取当前配置快照
    pub fn load(&self) -> Arc<AppConfig> {
        self.current.load_full()
    }

    /// 获取 watch receiver，用于异步等待配置变更
    pub fn subscribe(&self) -> watch::Receiver<Arc<AppConfig>> {
        self.rx.clone()
    }

    /// 更新配置
    ///
    /// 同时更新 ArcSwap 快照和 watch channel，
    /// 保证 load() 读取和 subscribe() 通知的一致性。
    pub fn update(&self, new_config: AppConfig) {
        let new_config = Arc::new(new_config);
        self.current.store(new_config.clone());
        // send 失败说明没有 receiver，属于正常情况（服务关闭阶段）
        let _ = self.tx.send(new_config);
    }

    /// 从配置源重新加载并校验，校验失败时保留旧配置
    pub fn reload(&self, service_name: &str) -> Result<()> {
        let config = AppConfig::load_validated(service_name)?;
        info!(
            templates = config.notice.templates.len(),
            routes = config.notice.routes.len(),
            "配置已重新加载"
        );
        self.update(config);
        Ok(())
    }
}
