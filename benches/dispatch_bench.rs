//! 通知分发性能基准测试
//!
//! 测试覆盖：
//! - 占位符模板展开性能
//! - 按渠道解析模板（含兜底字段）性能
//! - 不同接收者规模下的完整分发性能

use std::collections::HashMap;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use notice_dispatch::bootstrap::build_registry;
use notice_dispatch::template::{PlaceholderEngine, TemplateEngine};
use notice_dispatch::test_utils::{params, users};
use notice_dispatch::{NoticeDispatcher, User};
use notice_shared::config::{AppConfig, RouteRule};
use notice_shared::dynamic_config::DynamicConfig;
use serde_json::json;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// 创建带模板和路由的配置
fn create_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.notice.templates.insert(
        "order_shipped".to_string(),
        HashMap::from([
            ("default_title".to_string(), "订单 {{order.id}} 已发货".to_string()),
            (
                "default_content".to_string(),
                "{{name}}，您的订单 {{order.id}} 已由 {{order.carrier}} 发出".to_string(),
            ),
            ("email_title".to_string(), "[发货通知] {{order.id}}".to_string()),
        ]),
    );
    config.notice.routes.insert(
        "order_shipped".to_string(),
        RouteRule {
            channels: vec!["email".to_string(), "push".to_string()],
            excluded: HashMap::from([("push".to_string(), vec!["u0".to_string()])]),
        },
    );
    config
}

fn create_params() -> notice_dispatch::Params {
    params(&[
        ("name", json!("Ada")),
        ("order", json!({"id": "SO-1001", "carrier": "顺丰"})),
    ])
}

/// 模板展开基准
fn bench_template_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("template_expansion");
    let engine = PlaceholderEngine::new();
    let values = create_params();

    group.bench_function("single_placeholder", |b| {
        b.iter(|| engine.expand(black_box(&values), black_box("Hello {{name}}")))
    });

    for placeholders in [1usize, 5, 20].iter() {
        let template: String = (0..*placeholders)
            .map(|i| format!("第 {} 段: {{{{order.id}}}} / {{{{name}}}} ", i))
            .collect();

        group.throughput(Throughput::Elements(*placeholders as u64 * 2));
        group.bench_with_input(
            BenchmarkId::new("segments", placeholders),
            &template,
            |b, template| b.iter(|| engine.expand(black_box(&values), black_box(template))),
        );
    }

    group.finish();
}

/// 渠道模板解析基准
fn bench_template_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("template_resolution");
    let config = DynamicConfig::new(create_config());
    let registry = build_registry(&config).expect("registry");
    let resolver = registry.template_resolver();
    let values = create_params();

    group.bench_function("channel_override", |b| {
        b.iter(|| resolver.resolve(black_box("email"), "order_shipped", &values))
    });

    group.bench_function("default_fallback", |b| {
        b.iter(|| resolver.resolve(black_box("push"), "order_shipped", &values))
    });

    group.finish();
}

/// 完整分发基准
fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    let rt = Runtime::new().expect("tokio runtime");

    let config = DynamicConfig::new(create_config());
    let registry = Arc::new(build_registry(&config).expect("registry"));
    rt.block_on(registry.start()).expect("start");
    let dispatcher = NoticeDispatcher::new(registry);
    let values = create_params();
    let from = User::shared("order-service");

    for recipients in [1usize, 10, 100, 1000].iter() {
        let ids: Vec<String> = (0..*recipients).map(|i| format!("u{}", i)).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let to = users(&id_refs);

        group.throughput(Throughput::Elements(*recipients as u64));
        group.bench_with_input(BenchmarkId::new("recipients", recipients), &to, |b, to| {
            b.iter(|| {
                rt.block_on(dispatcher.send(
                    "order_shipped",
                    &values,
                    from.clone(),
                    black_box(to),
                ))
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_template_expansion,
    bench_template_resolution,
    bench_dispatch
);
criterion_main!(benches);
