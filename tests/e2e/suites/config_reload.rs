//! 配置热更新测试套件

use crate::helpers::*;
use crate::setup::TestEnvironment;
use crate::{assert_channel_delivered, assert_channel_failed};
use notice_dispatch::test_utils::{ids, params};
use serde_json::json;

#[cfg(test)]
mod reload_tests {
    use super::*;

    /// 路由和模板的更新对下一次分发立即可见
    #[tokio::test]
    async fn test_update_applies_to_next_dispatch() {
        let env = TestEnvironment::from_toml(SCENARIO_TOML).await.unwrap();
        let values = params(&[("order", json!({"id": "SO-7", "carrier": "EMS"}))]);

        let before = env
            .dispatcher
            .send_to_ids("order_shipped", &values, "system", &ids(&["u1"]))
            .await
            .unwrap();
        assert_eq!(before.outcomes.len(), 2);

        env.apply_toml(EMAIL_ONLY_TOML).unwrap();

        let after = env
            .dispatcher
            .send_to_ids("order_shipped", &values, "system", &ids(&["u1"]))
            .await
            .unwrap();
        assert_eq!(after.outcomes.len(), 1);
        assert_channel_delivered!(after, "email", ["u1"]);

        let resolved = env
            .dispatcher
            .resolve_template("email", "order_shipped", &values)
            .unwrap();
        assert_eq!(resolved.content, "订单 SO-7 已发出");
    }

    /// 订阅者收到更新通知
    #[tokio::test]
    async fn test_subscribers_notified() {
        let env = TestEnvironment::from_toml(SCENARIO_TOML).await.unwrap();
        let mut rx = env.config.subscribe();

        env.apply_toml(EMAIL_ONLY_TOML).unwrap();

        rx.changed().await.unwrap();
        assert!(!rx.borrow().notice.routes.contains_key("flash_sale"));
    }

    /// 删除模板后已路由的渠道报告模板缺失
    #[tokio::test]
    async fn test_removed_template_reported_per_channel() {
        let env = TestEnvironment::from_toml(SCENARIO_TOML).await.unwrap();

        env.apply_toml(
            r#"
[notice.routes.order_shipped]
channels = ["email"]
"#,
        )
        .unwrap();

        let report = env
            .dispatcher
            .send_to_ids("order_shipped", &params(&[]), "system", &ids(&["u1"]))
            .await
            .unwrap();
        assert_channel_failed!(report, "email", "TEMPLATE_NOT_FOUND");
    }
}
