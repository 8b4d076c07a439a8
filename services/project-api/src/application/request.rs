/// API Gatewayプロキシ統合のリクエストイベントとリクエストコンテキスト
use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// API Gateway REST API（プロキシ統合）から渡されるイベントのうち、
/// ルーティングとハンドラーが参照するフィールド
///
/// それ以外のフィールド（headers, requestContext等）は読み捨てる。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayEvent {
    /// HTTPメソッド（"GET", "POST"など）
    #[serde(default)]
    pub http_method: Option<String>,
    /// リクエストパス（"/projects/abc"など）
    #[serde(default)]
    pub path: Option<String>,
    /// リクエストボディ（JSON文字列）
    #[serde(default)]
    pub body: Option<String>,
}

impl ApiGatewayEvent {
    /// Lambdaペイロードからイベントを読み取る
    pub fn from_value(payload: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(payload)
    }
}

/// パスパラメータ（`/projects/{id}`の`id`など）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParameters(HashMap<String, String>);

impl PathParameters {
    /// 空のパスパラメータを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 1件のパラメータを持つパスパラメータを作成
    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut params = HashMap::with_capacity(1);
        params.insert(name.into(), value.into());
        Self(params)
    }

    /// パラメータ値を取得
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 1回の呼び出しの間だけ存在するリクエストコンテキスト
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// リクエストボディ
    pub body: Option<String>,
    /// ルーティングで抽出したパスパラメータ
    pub path_parameters: PathParameters,
}

impl RequestContext {
    pub fn new(body: Option<String>, path_parameters: PathParameters) -> Self {
        Self {
            body,
            path_parameters,
        }
    }

    /// パスパラメータを取得
    pub fn path_parameter(&self, name: &str) -> Option<&str> {
        self.path_parameters.get(name)
    }
}
