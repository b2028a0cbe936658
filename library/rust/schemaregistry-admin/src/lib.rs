//! k1s0-schemaregistry-admin: Schema Registry 管理 API クライアントライブラリ。
//!
//! Avro スキーマとそのバージョン・状態・互換性ルールを HTTP 経由で管理する。
//! すべての操作は共通の [`RequestPipeline`] を通り、URL 解決・認証・リトライ・
//! レスポンスの分類を共有する。
//!
//! # 使用例
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use k1s0_schemaregistry_admin::{
//!     AuthConfig, CreateSchemaOptions, HttpSchemaRegistryAdminClient, RequestContext,
//!     RuleConfig, SchemaRegistryAdmin, SchemaRegistryAdminConfig, UpdateSchemaRuleOptions,
//!     Rule,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SchemaRegistryAdminConfig::new("https://schema-registry.example.com/v1")
//!         .with_auth(AuthConfig::Apikey {
//!             apikey: "my-api-key".to_string(),
//!         })
//!         .with_retries(3, Duration::from_millis(500));
//!     let client = HttpSchemaRegistryAdminClient::new(config)?;
//!
//!     let ctx = RequestContext::new().with_timeout(Duration::from_secs(10));
//!     let schema = serde_json::json!({
//!         "type": "record",
//!         "name": "UserCreated",
//!         "fields": [{"name": "id", "type": "string"}]
//!     });
//!     let created = client
//!         .create_schema(&ctx, &CreateSchemaOptions::new(schema).with_id("user-created"))
//!         .await?;
//!     println!("created: {:?}", created.result);
//!
//!     client
//!         .update_schema_rule(
//!             &ctx,
//!             &UpdateSchemaRuleOptions::new(
//!                 "user-created",
//!                 "COMPATIBILITY",
//!                 Rule::compatibility(RuleConfig::Backward),
//!             ),
//!         )
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod model;
pub mod options;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod retry;
pub mod transport;

pub use auth::{
    Authenticator, BasicAuthenticator, BearerTokenAuthenticator, NoAuthAuthenticator,
};
pub use client::{HttpSchemaRegistryAdminClient, SchemaRegistryAdmin};
pub use config::{AuthConfig, SchemaRegistryAdminConfig};
pub use context::RequestContext;
pub use error::{ErrorKind, SchemaRegistryError};
pub use model::{Rule, RuleConfig, RuleType, SchemaMetadata, SchemaState, StateModification};
pub use options::{
    CreateSchemaOptions, CreateSchemaRuleOptions, CreateVersionOptions, DeleteSchemaOptions,
    DeleteSchemaRuleOptions, DeleteVersionOptions, GetGlobalRuleOptions, GetLatestSchemaOptions,
    GetSchemaRuleOptions, GetVersionOptions, ListSchemasOptions, ListVersionsOptions,
    SetSchemaStateOptions, SetSchemaVersionStateOptions, UpdateGlobalRuleOptions,
    UpdateSchemaOptions, UpdateSchemaRuleOptions, Validate,
};
pub use pipeline::RequestPipeline;
pub use request::RequestBuilder;
pub use response::{ApiResponse, DetailedResponse};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, PreparedRequest, RawResponse, ReqwestTransport};

#[cfg(feature = "mock")]
pub use client::MockSchemaRegistryAdmin;
