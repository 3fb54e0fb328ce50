//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过导出器自带的 HTTP 监听端口暴露，供 Prometheus 抓取。

use std::net::SocketAddr;

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

use super::ObservabilityConfig;

/// 初始化 Prometheus 指标导出
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    info!("Metrics exporter listening on {}", addr);

    register_common_metrics(&config.service_name);
    Ok(())
}

/// 注册指标描述，出现在 /metrics 端点的 HELP 注释中
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("notice_dispatch_total", "Total number of notice dispatches");
    metrics::describe_histogram!(
        "notice_dispatch_duration_seconds",
        "Notice dispatch duration in seconds"
    );
    metrics::describe_counter!(
        "notice_channel_sends_total",
        "Total number of per-channel notice sends"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 记录一次分发
#[inline]
pub fn record_dispatch(template_id: &str, status: &str, duration_secs: f64) {
    metrics::counter!(
        "notice_dispatch_total",
        "template" => template_id.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "notice_dispatch_duration_seconds",
        "template" => template_id.to_string()
    )
    .record(duration_secs);
}

/// 记录单个渠道的发送
#[inline]
pub fn record_channel_send(channel: &str, status: &str) {
    metrics::counter!(
        "notice_channel_sends_total",
        "channel" => channel.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
