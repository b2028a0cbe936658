//! 操作ごとの入力。
//!
//! すべてのオプションは呼び出し単位のカスタムヘッダーを持ち、送信前に
//! [`Validate::validate`] で必須フィールドを検査される。

use std::collections::HashMap;

use serde_json::Value;

use crate::error::SchemaRegistryError;
use crate::model::{Rule, RuleConfig, RuleType, SchemaState};

/// スキーマ ID を指定して作成する場合のヘッダー名。
pub const ARTIFACT_ID_HEADER: &str = "X-Registry-ArtifactId";

/// 送信前の入力検査。
pub trait Validate {
    /// 必須フィールドが欠けている場合、そのフィールド名を含む `Validation` を返す。
    fn validate(&self) -> Result<(), SchemaRegistryError>;
}

/// `(フィールド名, 値が有効か)` の一覧から欠落フィールドを集める。
fn require(fields: &[(&str, bool)]) -> Result<(), SchemaRegistryError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaRegistryError::Validation(format!(
            "required field(s) missing or empty: {}",
            missing.join(", ")
        )))
    }
}

fn present(value: &str) -> bool {
    !value.trim().is_empty()
}

fn valid_version(version: i64) -> bool {
    version > 0
}

/// スキーマ文書は空でない JSON オブジェクトでなければならない。
fn valid_schema(schema: &Value) -> bool {
    schema.as_object().is_some_and(|o| !o.is_empty())
}

macro_rules! custom_headers {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $ty {
                /// 呼び出し単位のヘッダーを追加する。
                pub fn with_header(
                    mut self,
                    name: impl Into<String>,
                    value: impl Into<String>,
                ) -> Self {
                    self.headers.insert(name.into(), value.into());
                    self
                }

                /// 呼び出し単位のヘッダーをまとめて追加する。
                pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
                    self.headers.extend(headers);
                    self
                }
            }
        )+
    };
}

// ---- スキーマ ----

/// `POST /artifacts`
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSchemaOptions {
    /// Avro スキーマ文書。
    pub schema: Value,
    /// 指定した場合 `X-Registry-ArtifactId` ヘッダーで送る。省略時はサーバーが採番する。
    pub id: Option<String>,
    pub headers: HashMap<String, String>,
}

impl CreateSchemaOptions {
    pub fn new(schema: Value) -> Self {
        Self {
            schema,
            id: None,
            headers: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl Validate for CreateSchemaOptions {
    fn validate(&self) -> Result<(), SchemaRegistryError> {
        require(&[
            ("schema", valid_schema(&self.schema)),
            ("id", self.id.as_deref().is_none_or(present)),
        ])
    }
}

/// `GET /artifacts/{id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetLatestSchemaOptions {
    pub id: String,
    pub headers: HashMap<String, String>,
}

impl GetLatestSchemaOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            headers: HashMap::new(),
        }
    }
}

impl Validate for GetLatestSchemaOptions {
    fn validate(&self) -> Result<(), SchemaRegistryError> {
        require(&[("id", present(&self.id))])
    }
}

/// `PUT /artifacts/{id}`
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSchemaOptions {
    pub id: String,
    pub schema: Value,
    pub headers: HashMap<String, String>,
}

impl UpdateSchemaOptions {
    pub fn new(id: impl Into<String>, schema: Value) -> Self {
        Self {
            id: id.into(),
            schema,
            headers: HashMap::new(),
        }
    }
}

impl Validate for UpdateSchemaOptions {
    fn validate(&self) -> Result<(), SchemaRegistryError> {
        require(&[
            ("id", present(&self.id)),
            ("schema", valid_schema(&self.schema)),
        ])
    }
}

/// `DELETE /artifacts/{id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteSchemaOptions {
    pub id: String,
    pub headers: HashMap<String, String>,
}

impl DeleteSchemaOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            headers: HashMap::new(),
        }
    }
}

impl Validate for DeleteSchemaOptions {
    fn validate(&self) -> Result<(), SchemaRegistryError> {
        require(&[("id", present(&self.id))])
    }
}

/// `GET /artifacts`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSchemasOptions {
    /// レスポンス形式。省略時はクエリに含めない。
    pub jsonformat: Option<String>,
    pub headers: HashMap<String, String>,
}

impl ListSchemasOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jsonformat(mut self, jsonformat: impl Into<String>) -> Self {
        self.jsonformat = Some(jsonformat.into());
        self
    }
}

impl Validate for ListSchemasOptions {
    fn validate(&self) -> Result<(), SchemaRegistryError> {
        Ok(())
    }
}

// ---- バージョン ----

/// `POST /artifacts/{id}/versions`
#[derive(Debug, Clone, PartialEq)]
pub struct CreateVersionOptions {
    pub id: String,
    pub schema: Value,
    pub headers: HashMap<String, String>,
}

impl CreateVersionOptions {
    pub fn new(id: impl Into<String>, schema: Value) -> Self {
        Self {
            id: id.into(),
            schema,
            headers: HashMap::new(),
        }
    }
}

impl Validate for CreateVersionOptions {
    fn validate(&self) -> Result<(), SchemaRegistryError> {
        require(&[
            ("id", present(&self.id)),
            ("schema", valid_schema(&self.schema)),
        ])
    }
}

/// `GET /artifacts/{id}/versions/{version}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetVersionOptions {
    pub id: String,
    pub version: i64,
    pub headers: HashMap<String, String>,
}

impl GetVersionOptions {
    pub fn new(id: impl Into<String>, version: i64) -> Self {
        Self {
            id: id.into(),
            version,
            headers: HashMap::new(),
        }
    }
}

impl Validate for GetVersionOptions {
    fn validate(&self) -> Result<(), SchemaRegistryError> {
        require(&[
            ("id", present(&self.id)),
            ("version", valid_version(self.version)),
        ])
    }
}

/// `DELETE /artifacts/{id}/versions/{version}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteVersionOptions {
    pub id: String,
    pub version: i64,
    pub headers: HashMap<String, String>,
}

impl DeleteVersionOptions {
    pub fn new(id: impl Into<String>, version: i64) -> Self {
        Self {
            id: id.into(),
            version,
            headers: HashMap::new(),
        }
    }
}

impl Validate for DeleteVersionOptions {
    fn validate(&self) -> Result<(), SchemaRegistryError> {
        require(&[
            ("id", present(&self.id)),
            ("version", valid_version(self.version)),
        ])
    }
}

/// `GET /artifacts/{id}/versions`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListVersionsOptions {
    pub id: String,
    pub jsonformat: Option<String>,
    pub headers: HashMap<String, String>,
}

impl ListVersionsOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            jsonformat: None,
            headers: HashMap::new(),
        }
    }

    pub fn with_jsonformat(mut self, jsonformat: impl Into<String>) -> Self {
        self.jsonformat = Some(jsonformat.into());
        self
    }
}

impl Validate for ListVersionsOptions {
    fn validate(&self) -> Result<(), SchemaRegistryError> {
        require(&[("id", present(&self.id))])
    }
}

// ---- 状態 ----

/// `PUT /artifacts/{id}/state`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetSchemaStateOptions {
    pub id: String,
    pub state: SchemaState,
    pub headers: HashMap<String, String>,
}

impl SetSchemaStateOptions {
    pub fn new(id: impl Into<String>, state: SchemaState) -> Self {
        Self {
            id: id.into(),
            state,
            headers: HashMap::new(),
        }
    }
}

impl Validate for SetSchemaStateOptions {
    fn validate(&self) -> Result<(), SchemaRegistryError> {
        require(&[("id", present(&self.id))])
    }
}

/// `PUT /artifacts/{id}/versions/{version}/state`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetSchemaVersionStateOptions {
    pub id: String,
    pub version: i64,
    pub state: SchemaState,
    pub headers: HashMap<String, String>,
}

impl SetSchemaVersionStateOptions {
    pub fn new(id: impl Into<String>, version: i64, state: SchemaState) -> Self {
        Self {
            id: id.into(),
            version,
            state,
            headers: HashMap::new(),
        }
    }
}

impl Validate for SetSchemaVersionStateOptions {
    fn validate(&self) -> Result<(), SchemaRegistryError> {
        require(&[
            ("id", present(&self.id)),
            ("version", valid_version(self.version)),
        ])
    }
}

// ---- ルール ----

/// `GET /rules/{rule}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetGlobalRuleOptions {
    /// ルール名（例: `COMPATIBILITY`）。
    pub rule: String,
    pub headers: HashMap<String, String>,
}

impl GetGlobalRuleOptions {
    pub fn new(rule: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            headers: HashMap::new(),
        }
    }

    /// 互換性ルールを対象にする。
    pub fn compatibility() -> Self {
        Self::new(RuleType::Compatibility.as_str())
    }
}

impl Validate for GetGlobalRuleOptions {
    fn validate(&self) -> Result<(), SchemaRegistryError> {
        require(&[("rule", present(&self.rule))])
    }
}

/// `PUT /rules/{rule}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateGlobalRuleOptions {
    pub rule: String,
    /// 送信するルール本体。
    pub body: Rule,
    pub headers: HashMap<String, String>,
}

impl UpdateGlobalRuleOptions {
    pub fn new(rule: impl Into<String>, body: Rule) -> Self {
        Self {
            rule: rule.into(),
            body,
            headers: HashMap::new(),
        }
    }

    /// グローバル互換性ルールを `config` に更新する。
    pub fn compatibility(config: RuleConfig) -> Self {
        Self::new(RuleType::Compatibility.as_str(), Rule::compatibility(config))
    }
}

impl Validate for UpdateGlobalRuleOptions {
    fn validate(&self) -> Result<(), SchemaRegistryError> {
        require(&[("rule", present(&self.rule))])
    }
}

/// `POST /artifacts/{id}/rules`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSchemaRuleOptions {
    pub id: String,
    pub body: Rule,
    pub headers: HashMap<String, String>,
}

impl CreateSchemaRuleOptions {
    pub fn new(id: impl Into<String>, body: Rule) -> Self {
        Self {
            id: id.into(),
            body,
            headers: HashMap::new(),
        }
    }
}

impl Validate for CreateSchemaRuleOptions {
    fn validate(&self) -> Result<(), SchemaRegistryError> {
        require(&[("id", present(&self.id))])
    }
}

/// `GET /artifacts/{id}/rules/{rule}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetSchemaRuleOptions {
    pub id: String,
    pub rule: String,
    pub headers: HashMap<String, String>,
}

impl GetSchemaRuleOptions {
    pub fn new(id: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rule: rule.into(),
            headers: HashMap::new(),
        }
    }
}

impl Validate for GetSchemaRuleOptions {
    fn validate(&self) -> Result<(), SchemaRegistryError> {
        require(&[("id", present(&self.id)), ("rule", present(&self.rule))])
    }
}

/// `PUT /artifacts/{id}/rules/{rule}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSchemaRuleOptions {
    pub id: String,
    pub rule: String,
    pub body: Rule,
    pub headers: HashMap<String, String>,
}

impl UpdateSchemaRuleOptions {
    pub fn new(id: impl Into<String>, rule: impl Into<String>, body: Rule) -> Self {
        Self {
            id: id.into(),
            rule: rule.into(),
            body,
            headers: HashMap::new(),
        }
    }
}

impl Validate for UpdateSchemaRuleOptions {
    fn validate(&self) -> Result<(), SchemaRegistryError> {
        require(&[("id", present(&self.id)), ("rule", present(&self.rule))])
    }
}

/// `DELETE /artifacts/{id}/rules/{rule}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteSchemaRuleOptions {
    pub id: String,
    pub rule: String,
    pub headers: HashMap<String, String>,
}

impl DeleteSchemaRuleOptions {
    pub fn new(id: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rule: rule.into(),
            headers: HashMap::new(),
        }
    }
}

impl Validate for DeleteSchemaRuleOptions {
    fn validate(&self) -> Result<(), SchemaRegistryError> {
        require(&[("id", present(&self.id)), ("rule", present(&self.rule))])
    }
}

custom_headers!(
    CreateSchemaOptions,
    GetLatestSchemaOptions,
    UpdateSchemaOptions,
    DeleteSchemaOptions,
    ListSchemasOptions,
    CreateVersionOptions,
    GetVersionOptions,
    DeleteVersionOptions,
    ListVersionsOptions,
    SetSchemaStateOptions,
    SetSchemaVersionStateOptions,
    GetGlobalRuleOptions,
    UpdateGlobalRuleOptions,
    CreateSchemaRuleOptions,
    GetSchemaRuleOptions,
    UpdateSchemaRuleOptions,
    DeleteSchemaRuleOptions,
);
