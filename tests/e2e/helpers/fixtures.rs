//! 测试配置与数据

/// 覆盖主要路由场景的配置
pub const SCENARIO_TOML: &str = r#"
[notice]
channels = ["email", "push", "broadcast"]

[notice.templates.order_shipped]
default_title = "订单已发货"
default_content = "订单 {{order.id}} 已由 {{order.carrier}} 发出"
push_title = "📦 {{order.id}} 已发货"

[notice.templates.flash_sale]
default_title = "限时特卖"
default_content = "{{item}} 仅剩 {{hours}} 小时"

[notice.routes.order_shipped]
channels = ["email", "push"]

[notice.routes.order_shipped.excluded]
email = ["u2"]

[notice.routes.flash_sale]
channels = ["broadcast", "sms", "wechat"]
"#;

/// 只保留邮件渠道的配置，用于热更新场景
pub const EMAIL_ONLY_TOML: &str = r#"
[notice]
channels = ["email", "push", "broadcast"]

[notice.templates.order_shipped]
default_title = "订单已发货"
default_content = "订单 {{order.id}} 已发出"

[notice.routes.order_shipped]
channels = ["email"]
"#;
