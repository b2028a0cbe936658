use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(feature = "mock")]
use mockall::automock;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::auth::Authenticator;
use crate::config::{SchemaRegistryAdminConfig, DEFAULT_ENV_PREFIX};
use crate::context::RequestContext;
use crate::error::SchemaRegistryError;
use crate::model::{Rule, SchemaMetadata, StateModification};
use crate::options::{
    CreateSchemaOptions, CreateSchemaRuleOptions, CreateVersionOptions, DeleteSchemaOptions,
    DeleteSchemaRuleOptions, DeleteVersionOptions, GetGlobalRuleOptions, GetLatestSchemaOptions,
    GetSchemaRuleOptions, GetVersionOptions, ListSchemasOptions, ListVersionsOptions,
    SetSchemaStateOptions, SetSchemaVersionStateOptions, UpdateGlobalRuleOptions,
    UpdateSchemaOptions, UpdateSchemaRuleOptions, Validate, ARTIFACT_ID_HEADER,
};
use crate::pipeline::RequestPipeline;
use crate::request::{to_header_map, RequestBuilder};
use crate::response::{ApiResponse, DetailedResponse};
use crate::retry::RetryPolicy;
use crate::transport::{HttpTransport, ReqwestTransport};

/// Schema Registry 管理 API のインターフェース。
///
/// スキーマ・バージョン・状態・互換性ルールの作成/取得/更新/削除を提供する。
/// どの操作も入力を検証してから送信し、検証エラー時は通信しない。
/// `mock` feature を有効にすると `MockSchemaRegistryAdmin` が生成される。
#[async_trait]
#[cfg_attr(feature = "mock", automock)]
pub trait SchemaRegistryAdmin: Send + Sync {
    /// スキーマを新規作成する。
    async fn create_schema(
        &self,
        ctx: &RequestContext,
        options: &CreateSchemaOptions,
    ) -> Result<ApiResponse<SchemaMetadata>, SchemaRegistryError>;

    /// スキーマの最新バージョンの文書を取得する。
    async fn get_latest_schema(
        &self,
        ctx: &RequestContext,
        options: &GetLatestSchemaOptions,
    ) -> Result<ApiResponse<Value>, SchemaRegistryError>;

    /// スキーマを更新する。
    async fn update_schema(
        &self,
        ctx: &RequestContext,
        options: &UpdateSchemaOptions,
    ) -> Result<ApiResponse<SchemaMetadata>, SchemaRegistryError>;

    /// スキーマとそのすべてのバージョンを削除する。
    async fn delete_schema(
        &self,
        ctx: &RequestContext,
        options: &DeleteSchemaOptions,
    ) -> Result<DetailedResponse, SchemaRegistryError>;

    /// スキーマ ID の一覧を取得する。
    async fn list_schemas(
        &self,
        ctx: &RequestContext,
        options: &ListSchemasOptions,
    ) -> Result<ApiResponse<Vec<String>>, SchemaRegistryError>;

    /// スキーマに新しいバージョンを追加する。
    async fn create_version(
        &self,
        ctx: &RequestContext,
        options: &CreateVersionOptions,
    ) -> Result<ApiResponse<SchemaMetadata>, SchemaRegistryError>;

    /// 指定バージョンの文書を取得する。
    async fn get_version(
        &self,
        ctx: &RequestContext,
        options: &GetVersionOptions,
    ) -> Result<ApiResponse<Value>, SchemaRegistryError>;

    /// 指定バージョンを削除する。
    async fn delete_version(
        &self,
        ctx: &RequestContext,
        options: &DeleteVersionOptions,
    ) -> Result<DetailedResponse, SchemaRegistryError>;

    /// バージョン番号の一覧を取得する。
    async fn list_versions(
        &self,
        ctx: &RequestContext,
        options: &ListVersionsOptions,
    ) -> Result<ApiResponse<Vec<i64>>, SchemaRegistryError>;

    /// スキーマの状態を変更する。
    async fn set_schema_state(
        &self,
        ctx: &RequestContext,
        options: &SetSchemaStateOptions,
    ) -> Result<DetailedResponse, SchemaRegistryError>;

    /// スキーマバージョンの状態を変更する。
    async fn set_schema_version_state(
        &self,
        ctx: &RequestContext,
        options: &SetSchemaVersionStateOptions,
    ) -> Result<DetailedResponse, SchemaRegistryError>;

    /// グローバルルールを取得する。
    async fn get_global_rule(
        &self,
        ctx: &RequestContext,
        options: &GetGlobalRuleOptions,
    ) -> Result<ApiResponse<Rule>, SchemaRegistryError>;

    /// グローバルルールを更新する。
    async fn update_global_rule(
        &self,
        ctx: &RequestContext,
        options: &UpdateGlobalRuleOptions,
    ) -> Result<ApiResponse<Rule>, SchemaRegistryError>;

    /// スキーマ単位のルールを作成する。
    async fn create_schema_rule(
        &self,
        ctx: &RequestContext,
        options: &CreateSchemaRuleOptions,
    ) -> Result<ApiResponse<Rule>, SchemaRegistryError>;

    /// スキーマ単位のルールを取得する。
    async fn get_schema_rule(
        &self,
        ctx: &RequestContext,
        options: &GetSchemaRuleOptions,
    ) -> Result<ApiResponse<Rule>, SchemaRegistryError>;

    /// スキーマ単位のルールを更新する。
    async fn update_schema_rule(
        &self,
        ctx: &RequestContext,
        options: &UpdateSchemaRuleOptions,
    ) -> Result<ApiResponse<Rule>, SchemaRegistryError>;

    /// スキーマ単位のルールを削除する。以降はグローバルルールが適用される。
    async fn delete_schema_rule(
        &self,
        ctx: &RequestContext,
        options: &DeleteSchemaRuleOptions,
    ) -> Result<DetailedResponse, SchemaRegistryError>;
}

/// HTTP 経由で Schema Registry 管理 API を呼び出す実装。
///
/// 設定の変更は `&mut self` を要求するため、呼び出し中に変わることはない。
#[derive(Debug)]
pub struct HttpSchemaRegistryAdminClient {
    pipeline: RequestPipeline,
    timeout: Duration,
    gzip: bool,
    /// 組み込みの reqwest トランスポートを使っているか。
    builtin_transport: bool,
}

impl HttpSchemaRegistryAdminClient {
    /// 設定から reqwest トランスポートを使うクライアントを構築する。
    pub fn new(config: SchemaRegistryAdminConfig) -> Result<Self, SchemaRegistryError> {
        let transport = Arc::new(ReqwestTransport::new(config.timeout(), config.enable_gzip)?);
        let authenticator = config.auth.build()?;
        let mut client = Self::with_transport(config, transport, authenticator)?;
        client.builtin_transport = true;
        Ok(client)
    }

    /// 環境変数（プレフィックス `SCHEMA_REGISTRY`）から構築する。
    pub fn from_env() -> Result<Self, SchemaRegistryError> {
        Self::new(SchemaRegistryAdminConfig::from_env(DEFAULT_ENV_PREFIX)?)
    }

    /// 任意のトランスポートと認証でクライアントを構築する。
    ///
    /// `config.auth` は使わず、`authenticator` を優先する。
    /// 転送圧縮はトランスポート側の設定に従い、`config.enable_gzip` は記録のみ。
    pub fn with_transport(
        config: SchemaRegistryAdminConfig,
        transport: Arc<dyn HttpTransport>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self, SchemaRegistryError> {
        let default_headers = to_header_map(&config.default_headers)?;
        let pipeline = RequestPipeline::new(config.url.clone(), transport)
            .with_authenticator(authenticator)
            .with_default_headers(default_headers)
            .with_retry_policy(config.retry_policy());
        Ok(Self {
            pipeline,
            timeout: config.timeout(),
            gzip: config.enable_gzip,
            builtin_transport: false,
        })
    }

    /// サービスのベース URL を返す。
    pub fn service_url(&self) -> &str {
        self.pipeline.service_url()
    }

    /// サービスのベース URL を変更する。以降の呼び出しから反映される。
    pub fn set_service_url(&mut self, url: impl Into<String>) {
        self.pipeline.set_service_url(url);
    }

    /// すべてのリクエストに付与するヘッダーを置き換える。
    pub fn set_default_headers(
        &mut self,
        headers: &HashMap<String, String>,
    ) -> Result<(), SchemaRegistryError> {
        self.pipeline.set_default_headers(to_header_map(headers)?);
        Ok(())
    }

    /// gzip 転送圧縮の設定を返す。
    pub fn gzip_enabled(&self) -> bool {
        self.gzip
    }

    /// gzip 転送圧縮を切り替える。reqwest トランスポートを再構築する。
    ///
    /// [`with_transport`](Self::with_transport) で渡したトランスポートは置き換えず、
    /// `Config` エラーを返す。
    pub fn set_enable_gzip(&mut self, enable: bool) -> Result<(), SchemaRegistryError> {
        if !self.builtin_transport {
            return Err(SchemaRegistryError::Config(
                "gzip can only be toggled on the built-in reqwest transport".to_string(),
            ));
        }
        let transport = ReqwestTransport::new(self.timeout, enable)?;
        self.pipeline.set_transport(Arc::new(transport));
        self.gzip = enable;
        Ok(())
    }

    /// リトライを有効にする。0 はそれぞれデフォルト値を意味する。
    pub fn enable_retries(&mut self, max_retries: u32, retry_interval: Duration) {
        self.pipeline
            .set_retry_policy(Some(RetryPolicy::new(max_retries, retry_interval)));
    }

    /// 再試行対象ステータスなどを含めてリトライポリシーを設定する。
    pub fn set_retry_policy(&mut self, policy: RetryPolicy) {
        self.pipeline.set_retry_policy(Some(policy));
    }

    /// リトライを無効にする。
    pub fn disable_retries(&mut self) {
        self.pipeline.set_retry_policy(None);
    }

    /// 現在のリトライポリシーを返す。
    pub fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.pipeline.retry_policy()
    }

    /// 共有パイプラインへの参照を返す。
    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }
}

#[async_trait]
impl SchemaRegistryAdmin for HttpSchemaRegistryAdminClient {
    async fn create_schema(
        &self,
        ctx: &RequestContext,
        options: &CreateSchemaOptions,
    ) -> Result<ApiResponse<SchemaMetadata>, SchemaRegistryError> {
        options.validate()?;
        debug!(id = ?options.id, "Creating schema");

        let mut builder = RequestBuilder::new(Method::POST, "/artifacts")
            .accept_json()
            .json_body(&options.schema)?;
        if let Some(id) = &options.id {
            builder = builder.header(ARTIFACT_ID_HEADER, id.as_str());
        }
        self.pipeline
            .send(ctx, builder.headers(&options.headers))
            .await
    }

    async fn get_latest_schema(
        &self,
        ctx: &RequestContext,
        options: &GetLatestSchemaOptions,
    ) -> Result<ApiResponse<Value>, SchemaRegistryError> {
        options.validate()?;
        debug!(id = %options.id, "Fetching latest schema");

        let builder = RequestBuilder::new(Method::GET, "/artifacts/{id}")
            .path_param("id", options.id.as_str())
            .accept_json()
            .headers(&options.headers);
        self.pipeline.send(ctx, builder).await
    }

    async fn update_schema(
        &self,
        ctx: &RequestContext,
        options: &UpdateSchemaOptions,
    ) -> Result<ApiResponse<SchemaMetadata>, SchemaRegistryError> {
        options.validate()?;
        debug!(id = %options.id, "Updating schema");

        let builder = RequestBuilder::new(Method::PUT, "/artifacts/{id}")
            .path_param("id", options.id.as_str())
            .accept_json()
            .json_body(&options.schema)?
            .headers(&options.headers);
        self.pipeline.send(ctx, builder).await
    }

    async fn delete_schema(
        &self,
        ctx: &RequestContext,
        options: &DeleteSchemaOptions,
    ) -> Result<DetailedResponse, SchemaRegistryError> {
        options.validate()?;
        debug!(id = %options.id, "Deleting schema");

        let builder = RequestBuilder::new(Method::DELETE, "/artifacts/{id}")
            .path_param("id", options.id.as_str())
            .headers(&options.headers);
        self.pipeline.send_without_result(ctx, builder).await
    }

    async fn list_schemas(
        &self,
        ctx: &RequestContext,
        options: &ListSchemasOptions,
    ) -> Result<ApiResponse<Vec<String>>, SchemaRegistryError> {
        options.validate()?;
        debug!("Listing schemas");

        let builder = RequestBuilder::new(Method::GET, "/artifacts")
            .query_param("jsonformat", options.jsonformat.as_deref())
            .accept_json()
            .headers(&options.headers);
        let response = self.pipeline.send::<Vec<String>>(ctx, builder).await?;
        debug!(
            count = response.result.as_ref().map_or(0, Vec::len),
            "Listed schemas"
        );
        Ok(response)
    }

    async fn create_version(
        &self,
        ctx: &RequestContext,
        options: &CreateVersionOptions,
    ) -> Result<ApiResponse<SchemaMetadata>, SchemaRegistryError> {
        options.validate()?;
        debug!(id = %options.id, "Creating schema version");

        let builder = RequestBuilder::new(Method::POST, "/artifacts/{id}/versions")
            .path_param("id", options.id.as_str())
            .accept_json()
            .json_body(&options.schema)?
            .headers(&options.headers);
        self.pipeline.send(ctx, builder).await
    }

    async fn get_version(
        &self,
        ctx: &RequestContext,
        options: &GetVersionOptions,
    ) -> Result<ApiResponse<Value>, SchemaRegistryError> {
        options.validate()?;
        debug!(id = %options.id, version = options.version, "Fetching schema version");

        let builder = RequestBuilder::new(Method::GET, "/artifacts/{id}/versions/{version}")
            .path_param("id", options.id.as_str())
            .path_param("version", options.version.to_string())
            .accept_json()
            .headers(&options.headers);
        self.pipeline.send(ctx, builder).await
    }

    async fn delete_version(
        &self,
        ctx: &RequestContext,
        options: &DeleteVersionOptions,
    ) -> Result<DetailedResponse, SchemaRegistryError> {
        options.validate()?;
        debug!(id = %options.id, version = options.version, "Deleting schema version");

        let builder = RequestBuilder::new(Method::DELETE, "/artifacts/{id}/versions/{version}")
            .path_param("id", options.id.as_str())
            .path_param("version", options.version.to_string())
            .headers(&options.headers);
        self.pipeline.send_without_result(ctx, builder).await
    }

    async fn list_versions(
        &self,
        ctx: &RequestContext,
        options: &ListVersionsOptions,
    ) -> Result<ApiResponse<Vec<i64>>, SchemaRegistryError> {
        options.validate()?;
        debug!(id = %options.id, "Listing schema versions");

        let builder = RequestBuilder::new(Method::GET, "/artifacts/{id}/versions")
            .path_param("id", options.id.as_str())
            .query_param("jsonformat", options.jsonformat.as_deref())
            .accept_json()
            .headers(&options.headers);
        self.pipeline.send(ctx, builder).await
    }

    async fn set_schema_state(
        &self,
        ctx: &RequestContext,
        options: &SetSchemaStateOptions,
    ) -> Result<DetailedResponse, SchemaRegistryError> {
        options.validate()?;
        debug!(id = %options.id, state = ?options.state, "Setting schema state");

        let builder = RequestBuilder::new(Method::PUT, "/artifacts/{id}/state")
            .path_param("id", options.id.as_str())
            .json_body(&StateModification {
                state: options.state,
            })?
            .headers(&options.headers);
        self.pipeline.send_without_result(ctx, builder).await
    }

    async fn set_schema_version_state(
        &self,
        ctx: &RequestContext,
        options: &SetSchemaVersionStateOptions,
    ) -> Result<DetailedResponse, SchemaRegistryError> {
        options.validate()?;
        debug!(
            id = %options.id,
            version = options.version,
            state = ?options.state,
            "Setting schema version state"
        );

        let builder =
            RequestBuilder::new(Method::PUT, "/artifacts/{id}/versions/{version}/state")
                .path_param("id", options.id.as_str())
                .path_param("version", options.version.to_string())
                .json_body(&StateModification {
                    state: options.state,
                })?
                .headers(&options.headers);
        self.pipeline.send_without_result(ctx, builder).await
    }

    async fn get_global_rule(
        &self,
        ctx: &RequestContext,
        options: &GetGlobalRuleOptions,
    ) -> Result<ApiResponse<Rule>, SchemaRegistryError> {
        options.validate()?;
        debug!(rule = %options.rule, "Fetching global rule");

        let builder = RequestBuilder::new(Method::GET, "/rules/{rule}")
            .path_param("rule", options.rule.as_str())
            .accept_json()
            .headers(&options.headers);
        self.pipeline.send(ctx, builder).await
    }

    async fn update_global_rule(
        &self,
        ctx: &RequestContext,
        options: &UpdateGlobalRuleOptions,
    ) -> Result<ApiResponse<Rule>, SchemaRegistryError> {
        options.validate()?;
        debug!(rule = %options.rule, config = %options.body.config, "Updating global rule");

        let builder = RequestBuilder::new(Method::PUT, "/rules/{rule}")
            .path_param("rule", options.rule.as_str())
            .accept_json()
            .json_body(&options.body)?
            .headers(&options.headers);
        self.pipeline.send(ctx, builder).await
    }

    async fn create_schema_rule(
        &self,
        ctx: &RequestContext,
        options: &CreateSchemaRuleOptions,
    ) -> Result<ApiResponse<Rule>, SchemaRegistryError> {
        options.validate()?;
        debug!(id = %options.id, config = %options.body.config, "Creating schema rule");

        let builder = RequestBuilder::new(Method::POST, "/artifacts/{id}/rules")
            .path_param("id", options.id.as_str())
            .accept_json()
            .json_body(&options.body)?
            .headers(&options.headers);
        self.pipeline.send(ctx, builder).await
    }

    async fn get_schema_rule(
        &self,
        ctx: &RequestContext,
        options: &GetSchemaRuleOptions,
    ) -> Result<ApiResponse<Rule>, SchemaRegistryError> {
        options.validate()?;
        debug!(id = %options.id, rule = %options.rule, "Fetching schema rule");

        let builder = RequestBuilder::new(Method::GET, "/artifacts/{id}/rules/{rule}")
            .path_param("id", options.id.as_str())
            .path_param("rule", options.rule.as_str())
            .accept_json()
            .headers(&options.headers);
        self.pipeline.send(ctx, builder).await
    }

    async fn update_schema_rule(
        &self,
        ctx: &RequestContext,
        options: &UpdateSchemaRuleOptions,
    ) -> Result<ApiResponse<Rule>, SchemaRegistryError> {
        options.validate()?;
        debug!(
            id = %options.id,
            rule = %options.rule,
            config = %options.body.config,
            "Updating schema rule"
        );

        let builder = RequestBuilder::new(Method::PUT, "/artifacts/{id}/rules/{rule}")
            .path_param("id", options.id.as_str())
            .path_param("rule", options.rule.as_str())
            .accept_json()
            .json_body(&options.body)?
            .headers(&options.headers);
        self.pipeline.send(ctx, builder).await
    }

    async fn delete_schema_rule(
        &self,
        ctx: &RequestContext,
        options: &DeleteSchemaRuleOptions,
    ) -> Result<DetailedResponse, SchemaRegistryError> {
        options.validate()?;
        debug!(id = %options.id, rule = %options.rule, "Deleting schema rule");

        let builder = RequestBuilder::new(Method::DELETE, "/artifacts/{id}/rules/{rule}")
            .path_param("id", options.id.as_str())
            .path_param("rule", options.rule.as_str())
            .headers(&options.headers);
        self.pipeline.send_without_result(ctx, builder).await
    }
}
