use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::SchemaRegistryError;

/// 1 回の呼び出しに対するキャンセルと期限。
///
/// キャンセルまたは期限切れになると、送信中のリクエストとリトライ待機を中断して
/// 直ちに戻る。
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel_token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// 期限なしのコンテキストを生成する。
    pub fn new() -> Self {
        Self::default()
    }

    /// 現在時刻から `timeout` 後を期限とする。
    ///
    /// 表現できないほど遠い期限は「期限なし」として扱う。
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    /// 期限を設定する。
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// 外部のキャンセルトークンを使う。
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// キャンセルトークンを返す。別タスクからのキャンセルに使う。
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    /// 設定された期限を返す。
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// このコンテキストを使用中の呼び出しをキャンセルする。
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// キャンセル済みまたは期限切れなら対応するエラーを返す。
    pub fn check(&self) -> Result<(), SchemaRegistryError> {
        if self.cancel_token.is_cancelled() {
            return Err(SchemaRegistryError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(SchemaRegistryError::DeadlineExceeded);
        }
        Ok(())
    }

    /// `future` をキャンセル・期限と競合させて実行する。
    pub async fn run<F>(&self, future: F) -> Result<F::Output, SchemaRegistryError>
    where
        F: Future,
    {
        self.check()?;
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            biased;
            () = self.cancel_token.cancelled() => Err(SchemaRegistryError::Cancelled),
            () = deadline => Err(SchemaRegistryError::DeadlineExceeded),
            output = future => Ok(output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_run_completes_without_deadline() {
        let ctx = RequestContext::new();
        let value = ctx.run(async { 7 }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_run_deadline_exceeded() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(20));
        let err = ctx
            .run(tokio::time::sleep(Duration::from_millis(200)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
    }

    #[tokio::test]
    async fn test_run_cancelled_while_pending() {
        let ctx = RequestContext::new();
        let token = ctx.cancellation_token().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });
        let err = ctx
            .run(tokio::time::sleep(Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_already_cancelled_does_not_poll_future() {
        let ctx = RequestContext::new();
        ctx.cancel();
        let mut polled = false;
        let err = ctx.run(async { polled = true }).await.unwrap_err();
        assert!(matches!(err, SchemaRegistryError::Cancelled));
        assert!(!polled);
    }

    #[tokio::test]
    async fn test_huge_timeout_means_no_deadline() {
        let ctx = RequestContext::new().with_timeout(Duration::MAX);
        assert!(ctx.deadline().is_none());
        assert!(ctx.check().is_ok());
        let value = ctx.run(async { 1 }).await.unwrap();
        assert_eq!(value, 1);
    }

    #[test]
    fn test_check_past_deadline() {
        let ctx = RequestContext::new().with_deadline(Instant::now());
        assert!(matches!(
            ctx.check(),
            Err(SchemaRegistryError::DeadlineExceeded)
        ));
    }

    #[test]
    fn test_shared_token() {
        let token = CancellationToken::new();
        let ctx = RequestContext::new().with_cancellation_token(token.clone());
        token.cancel();
        assert!(ctx.check().is_err());
    }
}
