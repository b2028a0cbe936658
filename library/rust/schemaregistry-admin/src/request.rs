use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::Serialize;

use crate::error::SchemaRegistryError;
use crate::transport::PreparedRequest;

const APPLICATION_JSON: &str = "application/json";

/// 1 回の操作に対するリクエストの記述。
///
/// パステンプレートは `{name}` 形式のプレースホルダーを含む。
/// [`RequestBuilder::build`] でサービス URL とデフォルトヘッダーを合成して
/// [`PreparedRequest`] にする。
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    path_template: &'static str,
    path_params: Vec<(&'static str, String)>,
    query_params: Vec<(&'static str, String)>,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    accept_json: bool,
}

impl RequestBuilder {
    /// HTTP メソッドとパステンプレートから生成する。
    pub fn new(method: Method, path_template: &'static str) -> Self {
        Self {
            method,
            path_template,
            path_params: Vec::new(),
            query_params: Vec::new(),
            headers: Vec::new(),
            body: None,
            accept_json: false,
        }
    }

    /// パスパラメータを設定する。値はパーセントエンコードされる。
    pub fn path_param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.path_params.push((name, value.into()));
        self
    }

    /// クエリパラメータを設定する。`None` の場合は URL に含めない。
    pub fn query_param(mut self, name: &'static str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.query_params.push((name, value.to_string()));
        }
        self
    }

    /// 呼び出し単位のヘッダーを 1 つ追加する。
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// 呼び出し単位のカスタムヘッダーをまとめて設定する。
    pub fn headers(mut self, headers: &HashMap<String, String>) -> Self {
        self.headers
            .extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// レスポンスボディを JSON で受け取る操作であることを示す。
    pub fn accept_json(mut self) -> Self {
        self.accept_json = true;
        self
    }

    /// JSON ボディを設定する。
    pub fn json_body<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, SchemaRegistryError> {
        let bytes = serde_json::to_vec(body).map_err(|e| {
            SchemaRegistryError::Validation(format!("failed to serialize request body: {}", e))
        })?;
        self.body = Some(bytes);
        Ok(self)
    }

    /// HTTP メソッドを返す。
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// パステンプレートのプレースホルダーを解決したパスを返す。
    ///
    /// 値が空のパラメータは `Validation`、値のないプレースホルダーは
    /// `UrlResolution` になる。
    pub fn resolve_path(&self) -> Result<String, SchemaRegistryError> {
        if let Some((name, _)) = self.path_params.iter().find(|(_, v)| v.is_empty()) {
            return Err(SchemaRegistryError::Validation(format!(
                "path parameter '{}' must not be empty",
                name
            )));
        }

        let mut resolved = String::with_capacity(self.path_template.len());
        let mut rest = self.path_template;
        while let Some(start) = rest.find('{') {
            resolved.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let end = after.find('}').ok_or_else(|| {
                SchemaRegistryError::UrlResolution(format!(
                    "unterminated placeholder in path template: {}",
                    self.path_template
                ))
            })?;
            let name = &after[..end];
            let value = self
                .path_params
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v)
                .ok_or_else(|| {
                    SchemaRegistryError::UrlResolution(format!(
                        "unresolved path placeholder '{{{}}}' in {}",
                        name, self.path_template
                    ))
                })?;
            resolved.push_str(&urlencoding::encode(value));
            rest = &after[end + 1..];
        }
        resolved.push_str(rest);
        Ok(resolved)
    }

    /// サービス URL・デフォルトヘッダーと合成して送信可能なリクエストにする。
    ///
    /// ヘッダーはデフォルトヘッダー、`Accept`/`Content-Type`、呼び出し単位の
    /// カスタムヘッダーの順に上書きされる。
    pub fn build(
        self,
        service_url: &str,
        default_headers: &HeaderMap,
    ) -> Result<PreparedRequest, SchemaRegistryError> {
        let base = service_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(SchemaRegistryError::UrlResolution(
                "service URL is missing".to_string(),
            ));
        }

        let path = self.resolve_path()?;
        let mut url = Url::parse(&format!("{}{}", base, path)).map_err(|e| {
            SchemaRegistryError::UrlResolution(format!("invalid service URL '{}': {}", base, e))
        })?;
        if !self.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &self.query_params {
                pairs.append_pair(name, value);
            }
        }

        let mut headers = default_headers.clone();
        if self.accept_json {
            headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        }
        if self.body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        }
        for (name, value) in &self.headers {
            let (name, value) = parse_header(name, value)?;
            headers.insert(name, value);
        }

        Ok(PreparedRequest {
            method: self.method,
            url,
            headers,
            body: self.body,
        })
    }
}

/// ヘッダー名と値を検証して変換する。
pub(crate) fn parse_header(
    name: &str,
    value: &str,
) -> Result<(HeaderName, HeaderValue), SchemaRegistryError> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| SchemaRegistryError::Validation(format!("invalid header name: {}", name)))?;
    let header_value = HeaderValue::from_str(value).map_err(|_| {
        SchemaRegistryError::Validation(format!("invalid value for header {}", name))
    })?;
    Ok((header_name, header_value))
}

/// 文字列マップを HeaderMap に変換する。
pub(crate) fn to_header_map(
    headers: &HashMap<String, String>,
) -> Result<HeaderMap, SchemaRegistryError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let (name, value) = parse_header(name, value)?;
        map.insert(name, value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const BASE: &str = "https://registry.example.com/v1";

    #[test]
    fn test_list_versions_path_and_query() {
        let request = RequestBuilder::new(Method::GET, "/artifacts/{id}/versions")
            .path_param("id", "testString")
            .query_param("jsonformat", Some("testString"))
            .accept_json()
            .build(BASE, &HeaderMap::new())
            .unwrap();
        assert_eq!(request.url.path(), "/v1/artifacts/testString/versions");
        assert!(request.url.query().unwrap().contains("jsonformat=testString"));
        assert_eq!(request.headers.get(ACCEPT).unwrap(), APPLICATION_JSON);
        assert!(request.headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_unset_query_param_omitted() {
        let request = RequestBuilder::new(Method::GET, "/artifacts")
            .query_param("jsonformat", None)
            .build(BASE, &HeaderMap::new())
            .unwrap();
        assert!(request.url.query().is_none());
    }

    #[test]
    fn test_multiple_path_params() {
        let path = RequestBuilder::new(Method::DELETE, "/artifacts/{id}/versions/{version}")
            .path_param("id", "orders")
            .path_param("version", "3")
            .resolve_path()
            .unwrap();
        assert_eq!(path, "/artifacts/orders/versions/3");
    }

    #[test]
    fn test_path_param_is_percent_encoded() {
        let path = RequestBuilder::new(Method::GET, "/artifacts/{id}")
            .path_param("id", "a b/c")
            .resolve_path()
            .unwrap();
        assert_eq!(path, "/artifacts/a%20b%2Fc");
    }

    #[test]
    fn test_empty_path_param_is_validation_error() {
        let err = RequestBuilder::new(Method::GET, "/artifacts/{id}")
            .path_param("id", "")
            .build(BASE, &HeaderMap::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("'id'"));
    }

    #[test]
    fn test_unresolved_placeholder() {
        let err = RequestBuilder::new(Method::GET, "/artifacts/{id}/rules/{rule}")
            .path_param("id", "orders")
            .build(BASE, &HeaderMap::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UrlResolution);
        assert!(err.to_string().contains("{rule}"));
    }

    #[test]
    fn test_empty_service_url() {
        let err = RequestBuilder::new(Method::GET, "/artifacts")
            .build("", &HeaderMap::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UrlResolution);
        assert!(err.to_string().contains("service URL is missing"));
    }

    #[test]
    fn test_invalid_service_url() {
        let err = RequestBuilder::new(Method::GET, "/artifacts")
            .build("not a url", &HeaderMap::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UrlResolution);
    }

    #[test]
    fn test_trailing_slash_in_service_url() {
        let request = RequestBuilder::new(Method::GET, "/rules/{rule}")
            .path_param("rule", "COMPATIBILITY")
            .build("http://localhost:8080/", &HeaderMap::new())
            .unwrap();
        assert_eq!(request.url.as_str(), "http://localhost:8080/rules/COMPATIBILITY");
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let request = RequestBuilder::new(Method::PUT, "/rules/{rule}")
            .path_param("rule", "COMPATIBILITY")
            .json_body(&serde_json::json!({"type": "COMPATIBILITY", "config": "FULL"}))
            .unwrap()
            .build(BASE, &HeaderMap::new())
            .unwrap();
        assert_eq!(request.headers.get(CONTENT_TYPE).unwrap(), APPLICATION_JSON);
        let body: serde_json::Value = serde_json::from_slice(&request.body.unwrap()).unwrap();
        assert_eq!(body["config"], "FULL");
    }

    #[test]
    fn test_custom_headers_override_defaults() {
        let mut defaults = HeaderMap::new();
        defaults.insert("x-team", HeaderValue::from_static("platform"));
        defaults.insert("x-trace", HeaderValue::from_static("default"));
        let mut custom = HashMap::new();
        custom.insert("X-Trace".to_string(), "per-call".to_string());

        let request = RequestBuilder::new(Method::GET, "/artifacts")
            .headers(&custom)
            .build(BASE, &defaults)
            .unwrap();
        assert_eq!(request.headers.get("x-team").unwrap(), "platform");
        assert_eq!(request.headers.get("x-trace").unwrap(), "per-call");
    }

    #[test]
    fn test_invalid_custom_header() {
        let err = RequestBuilder::new(Method::GET, "/artifacts")
            .header("bad header", "v")
            .build(BASE, &HeaderMap::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_to_header_map() {
        let mut headers = HashMap::new();
        headers.insert("X-Request-Source".to_string(), "batch".to_string());
        let map = to_header_map(&headers).unwrap();
        assert_eq!(map.get("x-request-source").unwrap(), "batch");
    }
}
