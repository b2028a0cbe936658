use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, Url};

use crate::error::{BoxError, SchemaRegistryError};

/// 送信可能な状態まで組み立てたリクエスト。
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// HTTP メソッド。
    pub method: Method,
    /// パスとクエリを解決済みの URL。
    pub url: Url,
    /// 認証ヘッダーを含む送信ヘッダー。
    pub headers: HeaderMap,
    /// JSON ボディ。
    pub body: Option<Vec<u8>>,
}

/// トランスポートが返す生のレスポンス。
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP ステータスコード。
    pub status: u16,
    /// レスポンスヘッダー。
    pub headers: HeaderMap,
    /// 受信したままのボディ。
    pub body: Vec<u8>,
}

/// HTTP リクエストを送信する。
///
/// 接続プール・タイムアウト・転送圧縮は実装側が持つ。
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// 1 回だけ送信する。リトライはパイプライン側で行う。
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, BoxError>;
}

/// reqwest を使用するトランスポート。
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
    gzip: bool,
}

impl ReqwestTransport {
    /// タイムアウトと gzip 設定を指定して reqwest クライアントを構築する。
    pub fn new(timeout: Duration, gzip: bool) -> Result<Self, SchemaRegistryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(gzip)
            .build()
            .map_err(|e| SchemaRegistryError::Config(e.to_string()))?;
        Ok(Self {
            client,
            timeout,
            gzip,
        })
    }

    /// HTTP タイムアウトを返す。
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// gzip 転送圧縮が有効かどうかを返す。
    pub fn gzip_enabled(&self) -> bool {
        self.gzip
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, BoxError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
