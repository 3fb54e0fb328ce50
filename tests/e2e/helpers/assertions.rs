//! 自定义断言宏
//!
//! 针对分发报告的专用断言。

/// 断言渠道投递成功且接收者与预期一致
#[macro_export]
macro_rules! assert_channel_delivered {
    ($report:expr, $channel:expr, $ids:expr) => {
        let outcome = $report
            .outcome($channel)
            .unwrap_or_else(|| panic!("渠道 {} 应该被调用", $channel));
        assert!(
            outcome.is_success(),
            "渠道 {} 应该投递成功，实际错误: {:?}",
            $channel,
            outcome.error()
        );
        let expected: Vec<String> = $ids.iter().map(|s| s.to_string()).collect();
        assert_eq!(outcome.recipient_ids, expected, "渠道 {} 的接收者不符", $channel);
    };
}

/// 断言渠道失败且错误码一致
#[macro_export]
macro_rules! assert_channel_failed {
    ($report:expr, $channel:expr, $code:expr) => {
        let outcome = $report
            .outcome($channel)
            .unwrap_or_else(|| panic!("渠道 {} 应该出现在报告中", $channel));
        assert_eq!(
            outcome.error().map(|e| e.code()),
            Some($code),
            "渠道 {} 的错误码不符",
            $channel
        );
    };
}
