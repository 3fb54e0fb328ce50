//! 通知分发测试套件
//!
//! 测试路由、渠道模板和失败隔离的完整链路。

use crate::helpers::*;
use crate::setup::TestEnvironment;
use crate::{assert_channel_delivered, assert_channel_failed};
use notice_dispatch::test_utils::{ids, params, users};
use notice_dispatch::{DispatchReport, User};
use serde_json::json;

async fn ship_order(env: &TestEnvironment, recipients: &[&str]) -> DispatchReport {
    env.dispatcher
        .send(
            "order_shipped",
            &params(&[("order", json!({"id": "SO-1001", "carrier": "顺丰"}))]),
            User::shared("order-service"),
            &users(recipients),
        )
        .await
        .unwrap()
}

#[cfg(test)]
mod default_config_tests {
    use super::*;

    /// 仓库自带的默认配置可以直接装配
    #[tokio::test]
    async fn test_default_config_bootstraps() {
        let env = TestEnvironment::from_default_config().await.unwrap();

        assert_eq!(
            env.registry.channel_names(),
            vec!["broadcast", "email", "push"]
        );
        assert!(env.registry.is_started());

        let report = env
            .dispatcher
            .send_to_ids(
                "welcome",
                &params(&[("name", json!("Ada")), ("account", json!({"id": 42}))]),
                "system",
                &ids(&["u1"]),
            )
            .await
            .unwrap();
        assert!(report.is_success());
        assert_channel_delivered!(report, "email", ["u1"]);
        assert_channel_delivered!(report, "push", ["u1"]);

        let email = env
            .dispatcher
            .resolve_template("email", "welcome", &params(&[("name", json!("Ada")), ("account", json!({"id": 42}))]))
            .unwrap();
        assert_eq!(email.title, "Welcome Ada!");
        assert!(email.content.contains("42"));
    }

    /// 默认配置中的退订规则生效
    #[tokio::test]
    async fn test_default_config_opt_out() {
        let env = TestEnvironment::from_default_config().await.unwrap();

        let report = env
            .dispatcher
            .send_to_ids(
                "password_reset",
                &params(&[("code", json!("839201")), ("ttl", json!(5))]),
                "auth",
                &ids(&["guest", "u7"]),
            )
            .await
            .unwrap();

        assert_channel_delivered!(report, "email", ["guest", "u7"]);
        assert_channel_delivered!(report, "push", ["u7"]);
    }
}

#[cfg(test)]
mod routing_tests {
    use super::*;

    /// 按模板路由并应用退订
    #[tokio::test]
    async fn test_routes_follow_template_rules() {
        let env = TestEnvironment::from_toml(SCENARIO_TOML).await.unwrap();

        let report = ship_order(&env, &["u1", "u2", "u3"]).await;

        assert!(report.is_success());
        assert_channel_delivered!(report, "email", ["u1", "u3"]);
        assert_channel_delivered!(report, "push", ["u1", "u2", "u3"]);
        assert!(report.outcome("broadcast").is_none());
    }

    /// 空接收者列表不产生任何渠道调用
    #[tokio::test]
    async fn test_empty_recipients_is_noop() {
        let env = TestEnvironment::from_toml(SCENARIO_TOML).await.unwrap();

        let report = ship_order(&env, &[]).await;

        assert!(report.outcomes.is_empty());
        assert!(report.is_success());
    }

    /// 同一接收者出现在多个渠道时各渠道各投递一次
    #[tokio::test]
    async fn test_recipient_in_multiple_channels() {
        let env = TestEnvironment::from_toml(SCENARIO_TOML).await.unwrap();

        let report = ship_order(&env, &["u9"]).await;

        assert_eq!(report.outcomes.len(), 2);
        for outcome in &report.outcomes {
            assert_eq!(outcome.recipient_ids, ids(&["u9"]));
            assert_eq!(outcome.result.as_ref().unwrap().delivered, 1);
        }
    }
}

#[cfg(test)]
mod failure_isolation_tests {
    use super::*;

    /// 未注册的渠道逐个报告，已注册渠道正常投递
    #[tokio::test]
    async fn test_unregistered_channels_isolated() {
        let env = TestEnvironment::from_toml(SCENARIO_TOML).await.unwrap();

        let report = env
            .dispatcher
            .send_to_ids(
                "flash_sale",
                &params(&[("item", json!("耳机")), ("hours", json!(3))]),
                "marketing",
                &ids(&["u1", "u2"]),
            )
            .await
            .unwrap();

        assert!(report.is_partial_success());
        assert_channel_delivered!(report, "broadcast", ["u1", "u2"]);
        assert_channel_failed!(report, "sms", "CHANNEL_NOT_FOUND");
        assert_channel_failed!(report, "wechat", "CHANNEL_NOT_FOUND");

        let err = report.into_result().unwrap_err();
        assert_eq!(err.code(), "DISPATCH_FAILED");
        let message = err.to_string();
        assert!(message.contains("sms") && message.contains("wechat"));
    }

    /// 非法参数直接返回错误
    #[tokio::test]
    async fn test_empty_template_id_rejected() {
        let env = TestEnvironment::from_toml(SCENARIO_TOML).await.unwrap();

        let err = env
            .dispatcher
            .send_to_ids("", &params(&[]), "system", &ids(&["u1"]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }

    /// 缺少 default_content 的配置无法通过校验
    #[tokio::test]
    async fn test_incomplete_template_rejected_at_startup() {
        let result = TestEnvironment::from_toml(
            r#"
[notice.templates.broken]
default_title = "只有标题"
"#,
        )
        .await;

        assert!(result.is_err());
    }
}
