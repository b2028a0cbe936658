use serde::{Deserialize, Serialize};

/// ルール種別。現在サーバーが定義しているのは互換性ルールのみ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    /// スキーマ互換性ルール。
    Compatibility,
}

impl RuleType {
    /// API のパス・ボディで使用する文字列表現を返す。
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Compatibility => "COMPATIBILITY",
        }
    }
}

impl std::fmt::Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 互換性ルールの設定値。
///
/// 新しいスキーマバージョンとしてサーバーが受け付ける変更の範囲を決める。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleConfig {
    /// 互換性チェックなし。
    None,
    /// 後方互換性: 新しいスキーマで直前のバージョンのデータを読める。
    Backward,
    /// 推移的後方互換性: すべての過去バージョンと後方互換。
    BackwardTransitive,
    /// 前方互換性: 直前のバージョンのスキーマで新しいデータを読める。
    Forward,
    /// 推移的前方互換性: すべての過去バージョンと前方互換。
    ForwardTransitive,
    /// 完全互換性: 後方互換かつ前方互換。
    Full,
    /// 推移的完全互換性: すべての過去バージョンと完全互換。
    FullTransitive,
}

impl RuleConfig {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleConfig::None => "NONE",
            RuleConfig::Backward => "BACKWARD",
            RuleConfig::BackwardTransitive => "BACKWARD_TRANSITIVE",
            RuleConfig::Forward => "FORWARD",
            RuleConfig::ForwardTransitive => "FORWARD_TRANSITIVE",
            RuleConfig::Full => "FULL",
            RuleConfig::FullTransitive => "FULL_TRANSITIVE",
        }
    }
}

impl std::fmt::Display for RuleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 互換性ポリシー。グローバルルールとスキーマ単位のルールの両方で使われる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    pub config: RuleConfig,
}

impl Rule {
    /// 互換性ルールを生成する。
    pub fn compatibility(config: RuleConfig) -> Self {
        Self {
            rule_type: RuleType::Compatibility,
            config,
        }
    }
}

/// サーバーが作成・更新時に返すスキーマのメタデータ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaMetadata {
    /// 作成日時（エポックミリ秒）。
    #[serde(default)]
    pub created_on: i64,
    /// レジストリ全体で一意な ID。
    #[serde(default)]
    pub global_id: i64,
    /// スキーマ ID。
    pub id: String,
    /// 更新日時（エポックミリ秒）。
    #[serde(default)]
    pub modified_on: i64,
    /// スキーマ種別（常に "AVRO"）。
    #[serde(rename = "type", default = "default_schema_type")]
    pub schema_type: String,
    /// バージョン番号。
    #[serde(default)]
    pub version: i64,
}

fn default_schema_type() -> String {
    "AVRO".to_string()
}

/// スキーマまたはスキーマバージョンの状態。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaState {
    Enabled,
    Disabled,
}

/// 状態変更リクエストのボディ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateModification {
    pub state: SchemaState,
}
