/// プロジェクトエンティティ
///
/// DynamoDBのプロジェクトテーブルに保存されるレコードと、
/// リクエストボディから受け取る入力値を表現する。
use serde::{Deserialize, Serialize};

/// DynamoDBに保存されるプロジェクト
///
/// `id`のみサーバー側で生成される。それ以外のフィールドは呼び出し元が
/// 指定した値をそのまま保持し、省略された場合は`null`として保存・返却する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// プロジェクトID（UUID v4文字列、作成後は不変）
    pub id: String,
    /// プロジェクト名
    #[serde(default)]
    pub name: Option<String>,
    /// 説明
    #[serde(default)]
    pub description: Option<String>,
    /// ステータス
    #[serde(default)]
    pub status: Option<String>,
    /// 作成日時（呼び出し元が指定した文字列、作成後は不変）
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Project {
    /// 生成済みのIDと作成リクエストの内容から新しいプロジェクトを作成
    pub fn new(id: impl Into<String>, input: NewProject) -> Self {
        Self {
            id: id.into(),
            name: input.name,
            description: input.description,
            status: input.status,
            created_at: input.created_at,
        }
    }
}

/// POST /projects のリクエストボディ
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// PUT /projects/{id} で更新されるフィールド
///
/// ボディに`id`や`createdAt`が含まれていても無視する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectFields {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
