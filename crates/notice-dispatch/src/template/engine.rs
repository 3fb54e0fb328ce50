//! 通知模板引擎
//!
//! 提供模板变量替换功能，支持 `{{variable}}` 语法以及
//! `{{user.name}}` 形式的嵌套取值。
//!
//! ## 使用示例
//!
//! ```ignore
//! let engine = PlaceholderEngine::new();
//!
//! let mut params = Params::new();
//! params.insert("name".into(), json!("Ada"));
//!
//! let rendered = engine.expand(&params, "Welcome {{name}}!")?;
//! // 输出: "Welcome Ada!"
//! ```

use std::fmt::Write;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;
use tracing::warn;

use crate::error::{NoticeError, Result};
use crate::types::Params;

/// 匹配 {{name}} / {{ user.name }}，路径段为除花括号、空白和点之外的任意字符
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([^{}\s.]+(?:\.[^{}\s.]+)*)\s*\}\}")
        .expect("placeholder pattern is valid")
});

/// 模板引擎
///
/// 将参数集展开到模板文本中，结果写入调用方提供的 sink。
pub trait TemplateEngine: Send + Sync {
    fn process(&self, params: &Params, out: &mut dyn Write, template: &str) -> Result<()>;

    /// 展开模板并返回完整文本
    fn expand(&self, params: &Params, template: &str) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        self.process(params, &mut out, template)?;
        Ok(out)
    }
}

/// 基于 `{{...}}` 占位符的默认模板引擎
///
/// 未找到的变量会保留原样并记录警告日志；
/// 不成对的 `{{` / `}}` 视为模板语法错误。
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderEngine;

impl PlaceholderEngine {
    pub fn new() -> Self {
        Self
    }

    /// 提取模板中的所有变量名
    pub fn extract_variables(&self, template: &str) -> Vec<String> {
        PLACEHOLDER
            .captures_iter(template)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    /// 返回模板中在参数集里找不到的变量
    pub fn missing_variables(&self, template: &str, params: &Params) -> Vec<String> {
        self.extract_variables(template)
            .into_iter()
            .filter(|name| lookup(params, name).is_none())
            .collect()
    }
}

impl TemplateEngine for PlaceholderEngine {
    fn process(&self, params: &Params, out: &mut dyn Write, template: &str) -> Result<()> {
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            write_literal(out, template, last, whole.start())?;
            write_placeholder(out, params, &caps)?;
            last = whole.end();
        }

        write_literal(out, template, last, template.len())
    }
}

/// 写出占位符之间的字面文本，其中残留的花括号对说明模板不合法
fn write_literal(out: &mut dyn Write, template: &str, start: usize, end: usize) -> Result<()> {
    let literal = &template[start..end];

    if let Some(offset) = literal.find("{{").or_else(|| literal.find("}}")) {
        return Err(NoticeError::TemplateExpansion {
            reason: format!("位置 {} 处存在不成对的占位符", start + offset),
        });
    }

    out.write_str(literal).map_err(sink_error)
}

fn write_placeholder(out: &mut dyn Write, params: &Params, caps: &Captures<'_>) -> Result<()> {
    let name = &caps[1];
    let written = match lookup(params, name) {
        Some(value) => out.write_str(&render_value(value)),
        None => {
            warn!(variable = name, "模板变量未找到，保留原样");
            out.write_str(&caps[0])
        }
    };
    written.map_err(sink_error)
}

/// 按点分路径在参数集中取值
fn lookup<'a>(params: &'a Params, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = params.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// 字符串原样输出，null 输出为空，其余类型输出 JSON 文本
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn sink_error(e: std::fmt::Error) -> NoticeError {
    NoticeError::TemplateExpansion {
        reason: format!("写入输出失败: {e}"),
    }
}
