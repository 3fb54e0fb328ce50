//! 共享库
//!
//! 包含通知分发服务共用的配置、错误处理、动态配置和可观测性等基础设施代码。

pub mod config;
pub mod dynamic_config;
pub mod error;
pub mod observability;
