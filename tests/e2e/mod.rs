//! 通知分发端到端测试
//!
//! 从 TOML 配置装配完整的分发服务，覆盖：
//! - 默认配置文件的加载与校验
//! - 按模板路由、渠道退订、渠道专属模板
//! - 未注册渠道和缺失模板的逐渠道隔离
//! - 配置热更新

pub mod helpers;
pub mod setup;
pub mod suites;

pub use setup::TestEnvironment;
