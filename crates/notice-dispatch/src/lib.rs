//! 多渠道通知分发引擎
//!
//! 调用方给出模板 ID、参数、发送者和接收者，引擎通过配置源决定每个
//! 接收者可用的渠道，再从服务注册表取出渠道组件并行投递。
//! 各渠道独立投递，单个渠道失败不影响其他渠道，结果汇总为分发报告。

pub mod bootstrap;
pub mod config_source;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod router;
pub mod sender;
pub mod template;
pub mod test_utils;
pub mod types;

pub use dispatcher::NoticeDispatcher;
pub use error::{NoticeError, Result};
pub use registry::{ServiceRegistry, Startable};
pub use types::{DispatchReport, Params, Recipient, User};
