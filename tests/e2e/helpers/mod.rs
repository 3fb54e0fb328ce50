//! 测试辅助工具模块

mod assertions;
mod fixtures;

pub use fixtures::*;
