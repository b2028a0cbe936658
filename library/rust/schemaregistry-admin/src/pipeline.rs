//! すべての操作が共有するリクエスト/レスポンス処理。
//!
//! 検証済みの [`RequestBuilder`] を受け取り、URL 解決・ヘッダー合成・認証・送信・
//! リトライ・レスポンスの分類までを行う。

use std::sync::Arc;

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::auth::{Authenticator, NoAuthAuthenticator};
use crate::context::RequestContext;
use crate::error::SchemaRegistryError;
use crate::request::RequestBuilder;
use crate::response::{error_message, ApiResponse, DetailedResponse};
use crate::retry::RetryPolicy;
use crate::transport::{HttpTransport, PreparedRequest, RawResponse};

/// リクエストパイプライン。
///
/// 設定はクライアントインスタンスが所有し、呼び出し中は読み取り専用で使われる。
/// 呼び出し間で共有する可変状態を持たないため、同一インスタンスから並行に呼び出せる。
pub struct RequestPipeline {
    service_url: String,
    default_headers: HeaderMap,
    authenticator: Arc<dyn Authenticator>,
    transport: Arc<dyn HttpTransport>,
    retry_policy: Option<RetryPolicy>,
}

impl std::fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("service_url", &self.service_url)
            .field("default_headers", &self.default_headers)
            .field("authenticator", &self.authenticator)
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}

impl RequestPipeline {
    /// 認証なし・リトライなしのパイプラインを生成する。
    pub fn new(service_url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            service_url: service_url.into(),
            default_headers: HeaderMap::new(),
            authenticator: Arc::new(NoAuthAuthenticator),
            transport,
            retry_policy: None,
        }
    }

    /// 認証方式を設定する。
    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// すべてのリクエストに付与するヘッダーを設定する。
    pub fn with_default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    /// リトライポリシーを設定する。`None` はリトライなし。
    pub fn with_retry_policy(mut self, policy: Option<RetryPolicy>) -> Self {
        self.retry_policy = policy;
        self
    }

    /// サービスのベース URL を返す。
    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    /// サービスのベース URL を変更する。
    pub fn set_service_url(&mut self, url: impl Into<String>) {
        self.service_url = url.into();
    }

    /// デフォルトヘッダーを返す。
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// デフォルトヘッダーを置き換える。
    pub fn set_default_headers(&mut self, headers: HeaderMap) {
        self.default_headers = headers;
    }

    /// トランスポートを差し替える。
    pub fn set_transport(&mut self, transport: Arc<dyn HttpTransport>) {
        self.transport = transport;
    }

    /// 認証方式を返す。
    pub fn authenticator(&self) -> &Arc<dyn Authenticator> {
        &self.authenticator
    }

    /// リトライポリシーを返す。
    pub fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }

    /// リトライポリシーを変更する。
    pub fn set_retry_policy(&mut self, policy: Option<RetryPolicy>) {
        self.retry_policy = policy;
    }

    /// サービス URL・デフォルトヘッダー・認証ヘッダーを合成してリクエストを組み立てる。
    pub fn build_request(
        &self,
        builder: RequestBuilder,
    ) -> Result<PreparedRequest, SchemaRegistryError> {
        let mut request = builder.build(&self.service_url, &self.default_headers)?;
        self.authenticator.authenticate(&mut request.headers);
        Ok(request)
    }

    /// リクエストを組み立てて送信し、成功ボディを `T` にデコードする。
    pub async fn send<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        builder: RequestBuilder,
    ) -> Result<ApiResponse<T>, SchemaRegistryError> {
        let request = self.build_request(builder)?;
        self.execute(ctx, &request).await
    }

    /// リクエストを組み立てて送信し、ボディを解釈せずにレスポンスを返す。
    pub async fn send_without_result(
        &self,
        ctx: &RequestContext,
        builder: RequestBuilder,
    ) -> Result<DetailedResponse, SchemaRegistryError> {
        let request = self.build_request(builder)?;
        self.execute_without_result(ctx, &request).await
    }

    /// 組み立て済みのリクエストを送信し、成功ボディを `T` にデコードする。
    ///
    /// - 2xx かつボディが空 → `result` は `None`
    /// - 2xx かつボディあり → 受信したバイト列からデコード。UTF-8 でない場合も含め、失敗時は `Unmarshal`
    /// - 2xx 以外 → `HttpStatus`（ボディは成功型としてデコードしない）
    pub async fn execute<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        request: &PreparedRequest,
    ) -> Result<ApiResponse<T>, SchemaRegistryError> {
        let (response, body) = self.exchange(ctx, request).await?;
        if response.is_empty_body() {
            return Ok(ApiResponse {
                result: None,
                response,
            });
        }
        match serde_json::from_slice::<T>(&body) {
            Ok(result) => Ok(ApiResponse {
                result: Some(result),
                response,
            }),
            Err(source) => {
                error!(
                    method = %request.method,
                    url = %request.url,
                    status = response.status_code,
                    error = %source,
                    "Failed to decode Schema Registry response"
                );
                Err(SchemaRegistryError::Unmarshal {
                    source,
                    response: Box::new(response),
                })
            }
        }
    }

    /// 組み立て済みのリクエストを送信し、2xx であればレスポンスを返す。
    pub async fn execute_without_result(
        &self,
        ctx: &RequestContext,
        request: &PreparedRequest,
    ) -> Result<DetailedResponse, SchemaRegistryError> {
        let (response, _) = self.exchange(ctx, request).await?;
        Ok(response)
    }

    /// 送信して 2xx 以外を `HttpStatus` に分類する。
    ///
    /// 成功時は表示用のレスポンスと受信したままのボディを返す。
    async fn exchange(
        &self,
        ctx: &RequestContext,
        request: &PreparedRequest,
    ) -> Result<(DetailedResponse, Vec<u8>), SchemaRegistryError> {
        let raw = ctx.run(self.send_with_retry(ctx, request)).await??;
        let response = DetailedResponse {
            status_code: raw.status,
            headers: raw.headers,
            body: String::from_utf8_lossy(&raw.body).into_owned(),
        };

        if response.is_success() {
            debug!(
                method = %request.method,
                url = %request.url,
                status = response.status_code,
                "Schema Registry request succeeded"
            );
            return Ok((response, raw.body));
        }

        let message = error_message(&response);
        error!(
            method = %request.method,
            url = %request.url,
            status = response.status_code,
            "Schema Registry returned error: {}",
            message
        );
        Err(SchemaRegistryError::HttpStatus {
            status: response.status_code,
            message,
            response: Box::new(response),
        })
    }

    /// リトライ設定に従って送信を繰り返す。
    ///
    /// トランスポートエラーと再試行対象ステータスのみを再試行する。再試行回数を
    /// 使い切った場合は最後の結果（エラーまたはレスポンス）をそのまま返す。
    async fn send_with_retry(
        &self,
        ctx: &RequestContext,
        request: &PreparedRequest,
    ) -> Result<RawResponse, SchemaRegistryError> {
        let max_attempts = self.retry_policy.as_ref().map_or(1, RetryPolicy::max_attempts);

        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(
                method = %request.method,
                url = %request.url,
                attempt,
                max_attempts,
                "Sending Schema Registry request"
            );

            let outcome = self.transport.send(request).await;
            let retry_reason = match &outcome {
                Ok(raw) => match &self.retry_policy {
                    Some(policy) if policy.is_retryable_status(raw.status) => {
                        format!("status {}", raw.status)
                    }
                    _ => return outcome.map_err(SchemaRegistryError::Transport),
                },
                Err(e) => e.to_string(),
            };

            let Some(policy) = self.retry_policy.as_ref().filter(|_| attempt < max_attempts)
            else {
                if let Err(e) = &outcome {
                    error!(
                        method = %request.method,
                        url = %request.url,
                        attempts = attempt,
                        "Schema Registry request failed: {}",
                        e
                    );
                }
                return outcome.map_err(SchemaRegistryError::Transport);
            };

            warn!(
                attempt,
                max_attempts,
                delay_ms = u64::try_from(policy.retry_interval.as_millis()).unwrap_or(u64::MAX),
                url = %request.url,
                reason = %retry_reason,
                "Retrying Schema Registry request"
            );
            ctx.check()?;
            tokio::time::sleep(policy.retry_interval).await;
        }
    }
}
