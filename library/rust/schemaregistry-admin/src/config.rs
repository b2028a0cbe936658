use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::{Authenticator, BasicAuthenticator, BearerTokenAuthenticator, NoAuthAuthenticator};
use crate::error::SchemaRegistryError;
use crate::retry::RetryPolicy;

/// 環境変数のデフォルトプレフィックス。
pub const DEFAULT_ENV_PREFIX: &str = "SCHEMA_REGISTRY";

/// Schema Registry 管理クライアントの設定。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaRegistryAdminConfig {
    /// サービスのベース URL。
    /// 例: "https://schema-registry.example.com/v1"
    pub url: String,

    /// HTTP タイムアウト（秒）。
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// gzip 転送圧縮を有効にするか。
    #[serde(default)]
    pub enable_gzip: bool,

    /// リトライを有効にするか。
    #[serde(default)]
    pub enable_retries: bool,

    /// 最大リトライ回数。0 はデフォルト値。
    #[serde(default)]
    pub max_retries: u32,

    /// リトライ間隔（ミリ秒）。0 はデフォルト値。
    #[serde(default)]
    pub retry_interval_ms: u64,

    /// すべてのリクエストに付与するヘッダー。
    #[serde(default)]
    pub default_headers: HashMap<String, String>,

    /// 認証設定。
    #[serde(default)]
    pub auth: AuthConfig,
}

/// 認証方式の設定。
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    #[default]
    NoAuth,
    Basic { username: String, password: String },
    Bearer { token: String },
    Apikey { apikey: String },
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthConfig::NoAuth => f.write_str("NoAuth"),
            AuthConfig::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            AuthConfig::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"[REDACTED]")
                .finish(),
            AuthConfig::Apikey { .. } => f
                .debug_struct("Apikey")
                .field("apikey", &"[REDACTED]")
                .finish(),
        }
    }
}

impl AuthConfig {
    /// 設定から Authenticator を生成する。
    pub fn build(&self) -> Result<Arc<dyn Authenticator>, SchemaRegistryError> {
        Ok(match self {
            AuthConfig::NoAuth => Arc::new(NoAuthAuthenticator),
            AuthConfig::Basic { username, password } => {
                Arc::new(BasicAuthenticator::new(username, password)?)
            }
            AuthConfig::Bearer { token } => Arc::new(BearerTokenAuthenticator::new(token)?),
            AuthConfig::Apikey { apikey } => Arc::new(BasicAuthenticator::from_apikey(apikey)?),
        })
    }
}

fn default_timeout_secs() -> u64 {
    30
}

impl SchemaRegistryAdminConfig {
    /// 指定した URL で設定を作成する。
    ///
    /// タイムアウト 30 秒、gzip 無効、リトライ無効、認証なしがデフォルト値として設定される。
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_timeout_secs(),
            enable_gzip: false,
            enable_retries: false,
            max_retries: 0,
            retry_interval_ms: 0,
            default_headers: HashMap::new(),
            auth: AuthConfig::NoAuth,
        }
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_gzip(mut self, enable: bool) -> Self {
        self.enable_gzip = enable;
        self
    }

    /// リトライを有効にする。0 はそれぞれデフォルト値を意味する。
    pub fn with_retries(mut self, max_retries: u32, retry_interval: Duration) -> Self {
        self.enable_retries = true;
        self.max_retries = max_retries;
        self.retry_interval_ms = u64::try_from(retry_interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// リトライが有効な場合のみポリシーを返す。
    pub fn retry_policy(&self) -> Option<RetryPolicy> {
        self.enable_retries.then(|| {
            RetryPolicy::new(
                self.max_retries,
                Duration::from_millis(self.retry_interval_ms),
            )
        })
    }

    /// 環境変数から設定を読み込む。
    ///
    /// `{prefix}_URL` は必須。その他の変数は省略時にデフォルト値を使う。
    pub fn from_env(prefix: &str) -> Result<Self, SchemaRegistryError> {
        Self::from_env_with(prefix, |key| std::env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む。
    ///
    /// | 変数 | 内容 |
    /// |---|---|
    /// | `{prefix}_URL` | サービス URL |
    /// | `{prefix}_AUTH_TYPE` | `noauth` / `basic` / `bearer` / `apikey` |
    /// | `{prefix}_USERNAME`, `{prefix}_PASSWORD` | Basic 認証 |
    /// | `{prefix}_BEARER_TOKEN` | Bearer 認証 |
    /// | `{prefix}_APIKEY` | API キー認証 |
    /// | `{prefix}_TIMEOUT_SECS` | タイムアウト秒数 |
    /// | `{prefix}_ENABLE_GZIP` | gzip 有効化 |
    /// | `{prefix}_ENABLE_RETRIES` | リトライ有効化 |
    /// | `{prefix}_MAX_RETRIES`, `{prefix}_RETRY_INTERVAL_MS` | リトライ設定 |
    pub fn from_env_with<F>(prefix: &str, lookup: F) -> Result<Self, SchemaRegistryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}_{}", prefix, name)).filter(|v| !v.is_empty());
        let required = |name: &str| {
            var(name).ok_or_else(|| {
                SchemaRegistryError::Config(format!("{}_{} is not set", prefix, name))
            })
        };

        let url = required("URL")?;
        let mut config = Self::new(url);

        if let Some(v) = var("TIMEOUT_SECS") {
            config.timeout_secs = parse_value(prefix, "TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = var("ENABLE_GZIP") {
            config.enable_gzip = parse_value(prefix, "ENABLE_GZIP", &v)?;
        }
        if let Some(v) = var("ENABLE_RETRIES") {
            config.enable_retries = parse_value(prefix, "ENABLE_RETRIES", &v)?;
        }
        if let Some(v) = var("MAX_RETRIES") {
            config.max_retries = parse_value(prefix, "MAX_RETRIES", &v)?;
        }
        if let Some(v) = var("RETRY_INTERVAL_MS") {
            config.retry_interval_ms = parse_value(prefix, "RETRY_INTERVAL_MS", &v)?;
        }

        let auth_type = var("AUTH_TYPE").map(|v| v.to_lowercase());
        config.auth = match auth_type.as_deref() {
            None | Some("noauth") => AuthConfig::NoAuth,
            Some("basic") => AuthConfig::Basic {
                username: required("USERNAME")?,
                password: required("PASSWORD")?,
            },
            Some("bearer" | "bearertoken") => AuthConfig::Bearer {
                token: required("BEARER_TOKEN")?,
            },
            Some("apikey") => AuthConfig::Apikey {
                apikey: required("APIKEY")?,
            },
            Some(other) => {
                return Err(SchemaRegistryError::Config(format!(
                    "unsupported {}_AUTH_TYPE: {}",
                    prefix, other
                )))
            }
        };

        Ok(config)
    }
}

fn parse_value<T: FromStr>(prefix: &str, name: &str, raw: &str) -> Result<T, SchemaRegistryError> {
    raw.trim().parse().map_err(|_| {
        SchemaRegistryError::Config(format!("invalid value for {}_{}: {}", prefix, name, raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_new_defaults() {
        let cfg = SchemaRegistryAdminConfig::new("https://registry.example.com/v1");
        assert_eq!(cfg.url, "https://registry.example.com/v1");
        assert_eq!(cfg.timeout_secs, 30);
        assert!(!cfg.enable_gzip);
        assert!(cfg.retry_policy().is_none());
        assert_eq!(cfg.auth, AuthConfig::NoAuth);
    }

    #[test]
    fn test_with_retries_builds_policy() {
        let cfg = SchemaRegistryAdminConfig::new("http://localhost:8080")
            .with_retries(2, Duration::from_millis(250));
        let policy = cfg.retry_policy().unwrap();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.retry_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_with_retries_zero_uses_defaults() {
        let cfg = SchemaRegistryAdminConfig::new("http://localhost:8080")
            .with_retries(0, Duration::ZERO);
        assert_eq!(cfg.retry_policy().unwrap(), RetryPolicy::default());
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{"url": "http://localhost:8080"}"#;
        let cfg: SchemaRegistryAdminConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.timeout_secs, 30);
        assert!(cfg.default_headers.is_empty());
        assert_eq!(cfg.auth, AuthConfig::NoAuth);
    }

    #[test]
    fn test_deserialize_auth_variants() {
        let json = r#"{
            "url": "http://localhost:8080",
            "enable_gzip": true,
            "auth": {"type": "basic", "username": "admin", "password": "secret"}
        }"#;
        let cfg: SchemaRegistryAdminConfig = serde_json::from_str(json).unwrap();
        assert!(cfg.enable_gzip);
        assert!(matches!(cfg.auth, AuthConfig::Basic { ref username, .. } if username == "admin"));

        let json = r#"{"url": "http://x", "auth": {"type": "apikey", "apikey": "k"}}"#;
        let cfg: SchemaRegistryAdminConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.auth.build().unwrap().authentication_type(), "basic");
    }

    #[test]
    fn test_auth_debug_redacts() {
        let auth = AuthConfig::Basic {
            username: "admin".to_string(),
            password: "hunter2".to_string(),
        };
        let out = format!("{:?}", auth);
        assert!(out.contains("admin"));
        assert!(!out.contains("hunter2"));
    }

    #[test]
    fn test_from_env_minimal() {
        let cfg = SchemaRegistryAdminConfig::from_env_with(
            "SCHEMA_REGISTRY",
            env(&[("SCHEMA_REGISTRY_URL", "http://registry:8080")]),
        )
        .unwrap();
        assert_eq!(cfg.url, "http://registry:8080");
        assert_eq!(cfg.auth, AuthConfig::NoAuth);
    }

    #[test]
    fn test_from_env_full() {
        let cfg = SchemaRegistryAdminConfig::from_env_with(
            "SR",
            env(&[
                ("SR_URL", "https://registry"),
                ("SR_AUTH_TYPE", "APIKEY"),
                ("SR_APIKEY", "my-key"),
                ("SR_ENABLE_GZIP", "true"),
                ("SR_ENABLE_RETRIES", "true"),
                ("SR_MAX_RETRIES", "3"),
                ("SR_RETRY_INTERVAL_MS", "500"),
                ("SR_TIMEOUT_SECS", "10"),
            ]),
        )
        .unwrap();
        assert!(cfg.enable_gzip);
        assert_eq!(cfg.timeout_secs, 10);
        assert_eq!(
            cfg.auth,
            AuthConfig::Apikey {
                apikey: "my-key".to_string()
            }
        );
        let policy = cfg.retry_policy().unwrap();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.retry_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_from_env_missing_url() {
        let err = SchemaRegistryAdminConfig::from_env_with("SR", env(&[])).unwrap_err();
        assert!(err.to_string().contains("SR_URL"));
    }

    #[test]
    fn test_from_env_invalid_number() {
        let err = SchemaRegistryAdminConfig::from_env_with(
            "SR",
            env(&[("SR_URL", "http://x"), ("SR_MAX_RETRIES", "many")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("SR_MAX_RETRIES"));
    }

    #[test]
    fn test_from_env_basic_requires_password() {
        let err = SchemaRegistryAdminConfig::from_env_with(
            "SR",
            env(&[
                ("SR_URL", "http://x"),
                ("SR_AUTH_TYPE", "basic"),
                ("SR_USERNAME", "admin"),
            ]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("SR_PASSWORD"));
    }

    #[test]
    fn test_from_env_unknown_auth_type() {
        let err = SchemaRegistryAdminConfig::from_env_with(
            "SR",
            env(&[("SR_URL", "http://x"), ("SR_AUTH_TYPE", "kerberos")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("kerberos"));
    }
}
