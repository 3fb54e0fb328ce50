//! 测试套件模块

pub mod config_reload;
pub mod notification;
