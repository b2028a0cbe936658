use std::time::Duration;

/// `max_retries` に 0 を指定した場合のリトライ回数。
pub const DEFAULT_MAX_RETRIES: u32 = 4;

/// `retry_interval` に 0 を指定した場合のリトライ間隔。
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// クライアント単位のリトライ設定。
///
/// トランスポートエラーと `retryable_statuses` に含まれるステータスのみを
/// 再試行する。4xx はデフォルトでは含まれない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_interval: Duration,
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            retryable_statuses: default_retryable_statuses(),
        }
    }
}

fn default_retryable_statuses() -> Vec<u16> {
    vec![500, 502, 503, 504]
}

impl RetryPolicy {
    /// リトライ回数と間隔を指定して生成する。0 はそれぞれデフォルト値を意味する。
    pub fn new(max_retries: u32, retry_interval: Duration) -> Self {
        Self {
            max_retries: if max_retries == 0 {
                DEFAULT_MAX_RETRIES
            } else {
                max_retries
            },
            retry_interval: if retry_interval.is_zero() {
                DEFAULT_RETRY_INTERVAL
            } else {
                retry_interval
            },
            retryable_statuses: default_retryable_statuses(),
        }
    }

    /// 再試行対象のステータスコードを置き換える。
    ///
    /// 429 などの 4xx を再試行させたい場合はここで明示的に指定する。
    pub fn with_retryable_statuses(mut self, statuses: impl Into<Vec<u16>>) -> Self {
        self.retryable_statuses = statuses.into();
        self
    }

    /// 初回を含めた最大試行回数を返す。
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// 再試行対象のステータスコードかどうかを返す。
    pub fn is_retryable_status(&self, status_code: u16) -> bool {
        self.retryable_statuses.contains(&status_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_means_defaults() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(policy.retry_interval, DEFAULT_RETRY_INTERVAL);
        assert_eq!(policy, RetryPolicy::default());
    }

    #[test]
    fn test_explicit_values_kept() {
        let policy = RetryPolicy::new(2, Duration::from_millis(50));
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.retry_interval, Duration::from_millis(50));
    }

    #[test]
    fn test_default_retryable_statuses() {
        let policy = RetryPolicy::default();
        assert!(policy.is_retryable_status(500));
        assert!(policy.is_retryable_status(502));
        assert!(policy.is_retryable_status(503));
        assert!(policy.is_retryable_status(504));
        assert!(!policy.is_retryable_status(501));
        assert!(!policy.is_retryable_status(400));
        assert!(!policy.is_retryable_status(404));
        assert!(!policy.is_retryable_status(429));
    }

    #[test]
    fn test_custom_retryable_statuses() {
        let policy = RetryPolicy::default().with_retryable_statuses(vec![429, 503]);
        assert!(policy.is_retryable_status(429));
        assert!(!policy.is_retryable_status(500));
    }

    #[test]
    fn test_max_attempts_saturates() {
        let policy = RetryPolicy::new(u32::MAX, Duration::from_millis(1));
        assert_eq!(policy.max_attempts(), u32::MAX);
    }
}
