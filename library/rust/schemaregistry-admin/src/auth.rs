//! リクエストへの認証ヘッダー付与。
//!
//! トークンの取得・更新は扱わない。呼び出し元が用意した資格情報をそのまま使う。

use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::error::SchemaRegistryError;

/// API キー認証で使用する Basic 認証のユーザー名。
pub const APIKEY_USERNAME: &str = "token";

/// リクエストヘッダーに認証情報を付与する。
pub trait Authenticator: Send + Sync + std::fmt::Debug {
    /// `headers` に認証ヘッダーを設定する。既存の値は上書きする。
    fn authenticate(&self, headers: &mut HeaderMap);

    /// 認証方式の名前を返す。
    fn authentication_type(&self) -> &'static str;
}

/// 認証ヘッダーを付与しない。
#[derive(Debug, Clone, Default)]
pub struct NoAuthAuthenticator;

impl Authenticator for NoAuthAuthenticator {
    fn authenticate(&self, _headers: &mut HeaderMap) {}

    fn authentication_type(&self) -> &'static str {
        "noauth"
    }
}

/// Basic 認証。
#[derive(Clone)]
pub struct BasicAuthenticator {
    username: String,
    header: HeaderValue,
}

impl BasicAuthenticator {
    /// ユーザー名とパスワードから生成する。どちらかが空の場合はエラー。
    pub fn new(username: &str, password: &str) -> Result<Self, SchemaRegistryError> {
        if username.is_empty() || password.is_empty() {
            return Err(SchemaRegistryError::Config(
                "basic authentication requires a non-empty username and password".to_string(),
            ));
        }
        if username.contains(':') {
            return Err(SchemaRegistryError::Config(
                "basic authentication username must not contain ':'".to_string(),
            ));
        }
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", username, password));
        let mut header = HeaderValue::from_str(&format!("Basic {}", encoded))
            .map_err(|e| SchemaRegistryError::Config(e.to_string()))?;
        header.set_sensitive(true);
        Ok(Self {
            username: username.to_string(),
            header,
        })
    }

    /// API キーから生成する。ユーザー名は [`APIKEY_USERNAME`] になる。
    pub fn from_apikey(apikey: &str) -> Result<Self, SchemaRegistryError> {
        Self::new(APIKEY_USERNAME, apikey)
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl std::fmt::Debug for BasicAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthenticator")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Authenticator for BasicAuthenticator {
    fn authenticate(&self, headers: &mut HeaderMap) {
        headers.insert(AUTHORIZATION, self.header.clone());
    }

    fn authentication_type(&self) -> &'static str {
        "basic"
    }
}

/// Bearer トークン認証。
#[derive(Clone)]
pub struct BearerTokenAuthenticator {
    header: HeaderValue,
}

impl BearerTokenAuthenticator {
    pub fn new(token: &str) -> Result<Self, SchemaRegistryError> {
        if token.is_empty() {
            return Err(SchemaRegistryError::Config(
                "bearer token must not be empty".to_string(),
            ));
        }
        let mut header = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| SchemaRegistryError::Config(e.to_string()))?;
        header.set_sensitive(true);
        Ok(Self { header })
    }
}

impl std::fmt::Debug for BearerTokenAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerTokenAuthenticator")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Authenticator for BearerTokenAuthenticator {
    fn authenticate(&self, headers: &mut HeaderMap) {
        headers.insert(AUTHORIZATION, self.header.clone());
    }

    fn authentication_type(&self) -> &'static str {
        "bearer"
    }
}
