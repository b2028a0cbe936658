use crate::response::DetailedResponse;

/// トランスポート層から返される任意のエラー。
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// SchemaRegistryError は Schema Registry 管理 API 呼び出しのエラーを表す。
///
/// どの段階で失敗したかを [`ErrorKind`] で判別できる。
#[derive(Debug, thiserror::Error)]
pub enum SchemaRegistryError {
    /// 必須フィールドの欠落など、入力が不正。ネットワーク I/O は発生していない。
    #[error("Validation error: {0}")]
    Validation(String),

    /// サービス URL が未設定、またはパステンプレートを解決できない。
    #[error("URL resolution error: {0}")]
    UrlResolution(String),

    /// ネットワークエラーやタイムアウトなど、トランスポート層の失敗。
    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),

    /// 呼び出し元がキャンセルした。
    #[error("Request cancelled")]
    Cancelled,

    /// 呼び出し元が指定した期限を過ぎた。
    #[error("Request deadline exceeded")]
    DeadlineExceeded,

    /// 成功レスポンスのボディを期待する型にデコードできなかった。
    #[error("Failed to unmarshal response body (status={}): {source}", .response.status_code)]
    Unmarshal {
        /// デコードエラー。
        #[source]
        source: serde_json::Error,
        /// 受信したレスポンス。
        response: Box<DetailedResponse>,
    },

    /// サーバーが 2xx 以外のステータスを返した。
    #[error("HTTP status {status}: {message}")]
    HttpStatus {
        /// HTTP ステータスコード。
        status: u16,
        /// エラーボディの `message`、なければステータスの理由句。
        message: String,
        /// 受信したレスポンス。
        response: Box<DetailedResponse>,
    },

    /// クライアント設定が不正。
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// エラーが発生した段階の分類。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    UrlResolution,
    Transport,
    Cancelled,
    DeadlineExceeded,
    Unmarshal,
    HttpStatus,
    Config,
}

impl SchemaRegistryError {
    /// エラーの分類を返す。
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchemaRegistryError::Validation(_) => ErrorKind::Validation,
            SchemaRegistryError::UrlResolution(_) => ErrorKind::UrlResolution,
            SchemaRegistryError::Transport(_) => ErrorKind::Transport,
            SchemaRegistryError::Cancelled => ErrorKind::Cancelled,
            SchemaRegistryError::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            SchemaRegistryError::Unmarshal { .. } => ErrorKind::Unmarshal,
            SchemaRegistryError::HttpStatus { .. } => ErrorKind::HttpStatus,
            SchemaRegistryError::Config(_) => ErrorKind::Config,
        }
    }

    /// レスポンスを受信済みの場合、その HTTP ステータスコードを返す。
    pub fn status_code(&self) -> Option<u16> {
        self.response().map(|r| r.status_code)
    }

    /// レスポンスを受信済みの場合、そのレスポンスを返す。
    pub fn response(&self) -> Option<&DetailedResponse> {
        match self {
            SchemaRegistryError::Unmarshal { response, .. }
            | SchemaRegistryError::HttpStatus { response, .. } => Some(&**response),
            _ => None,
        }
    }

    /// リクエスト送信前に検出されたエラーかどうかを返す。
    pub fn is_client_side(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Validation | ErrorKind::UrlResolution | ErrorKind::Config
        )
    }

    /// キャンセルまたは期限切れによるエラーかどうかを返す。
    pub fn is_cancellation(&self) -> bool {
        matches!(self.kind(), ErrorKind::Cancelled | ErrorKind::DeadlineExceeded)
    }
}
