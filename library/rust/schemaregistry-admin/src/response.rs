use reqwest::header::HeaderMap;
use serde::Deserialize;

/// 1 回の呼び出しで受信した HTTP レスポンス。
#[derive(Debug, Clone)]
pub struct DetailedResponse {
    /// HTTP ステータスコード。
    pub status_code: u16,
    /// レスポンスヘッダー。
    pub headers: HeaderMap,
    /// レスポンスボディ（UTF-8 として解釈できない部分は置換済み）。
    pub body: String,
}

impl DetailedResponse {
    /// ボディが空（空白のみを含む）かどうかを返す。
    pub fn is_empty_body(&self) -> bool {
        self.body.trim().is_empty()
    }

    /// 2xx かどうかを返す。
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// 指定したヘッダーの値を文字列で返す。
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// 型付き結果とレスポンスの組。
///
/// 成功レスポンスでもボディが空の場合 `result` は `None` になる。
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub result: Option<T>,
    pub response: DetailedResponse,
}

impl<T> ApiResponse<T> {
    /// HTTP ステータスコードを返す。
    pub fn status_code(&self) -> u16 {
        self.response.status_code
    }

    /// 結果を取り出す。
    pub fn into_result(self) -> Option<T> {
        self.result
    }
}

/// Schema Registry のエラーレスポンスボディ。
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// エラーレスポンスから表示用メッセージを取り出す。
///
/// `message` → `error` → ステータスの理由句の順に採用する。
pub(crate) fn error_message(response: &DetailedResponse) -> String {
    if let Ok(body) = serde_json::from_str::<ErrorBody>(&response.body) {
        if let Some(message) = body.message.or(body.error).filter(|m| !m.is_empty()) {
            return message;
        }
    }
    reqwest::StatusCode::from_u16(response.status_code)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("unknown status")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status_code: u16, body: &str) -> DetailedResponse {
        DetailedResponse {
            status_code,
            headers: HeaderMap::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_empty_body_detection() {
        assert!(response(204, "").is_empty_body());
        assert!(response(200, "  \n").is_empty_body());
        assert!(!response(200, "[]").is_empty_body());
    }

    #[test]
    fn test_is_success() {
        assert!(response(200, "").is_success());
        assert!(response(204, "").is_success());
        assert!(!response(404, "").is_success());
        assert!(!response(500, "").is_success());
    }

    #[test]
    fn test_error_message_from_message_field() {
        let r = response(404, r#"{"error_code":404,"message":"artifact not found"}"#);
        assert_eq!(error_message(&r), "artifact not found");
    }

    #[test]
    fn test_error_message_from_error_field() {
        let r = response(409, r#"{"error":"artifact already exists"}"#);
        assert_eq!(error_message(&r), "artifact already exists");
    }

    #[test]
    fn test_error_message_falls_back_to_reason() {
        assert_eq!(error_message(&response(503, "upstream down")), "Service Unavailable");
        assert_eq!(error_message(&response(400, "")), "Bad Request");
    }

    #[test]
    fn test_api_response_accessors() {
        let api = ApiResponse {
            result: Some(vec![1_i64, 2]),
            response: response(200, "[1,2]"),
        };
        assert_eq!(api.status_code(), 200);
        assert_eq!(api.into_result(), Some(vec![1, 2]));
    }
}
