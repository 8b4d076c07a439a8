/// API Gatewayプロキシ統合に返却するレスポンス
///
/// Lambdaの戻り値として`{"statusCode": 200, "body": "..."}`の形に
/// シリアライズされる。`body`は常にJSON文字列。
use lambda_http::http::StatusCode;
use serde::Serialize;

/// ルートが見つからない場合のメッセージ
pub const NOT_FOUND_MESSAGE: &str = "Not Found";

/// 指定IDのプロジェクトが存在しない場合のメッセージ
pub const PROJECT_NOT_FOUND_MESSAGE: &str = "Project not found";

/// 更新成功時のメッセージ
pub const PROJECT_UPDATED_MESSAGE: &str = "Project updated successfully";

/// 削除成功時のメッセージ
pub const PROJECT_DELETED_MESSAGE: &str = "Project deleted successfully";

/// 内部エラー時のメッセージ接頭辞
pub const INTERNAL_ERROR_PREFIX: &str = "An internal error occurred: ";

/// `{"message": "..."}`形式のレスポンスボディ
#[derive(Debug, Serialize)]
struct MessageBody<'a> {
    message: &'a str,
}

/// Lambdaから返却するHTTPレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    /// HTTPステータスコード
    pub status_code: u16,
    /// JSONエンコード済みのレスポンスボディ
    pub body: String,
}

impl ApiResponse {
    /// 任意の値をJSONボディとしてレスポンスを作成
    pub fn json<T: Serialize + ?Sized>(
        status: StatusCode,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status_code: status.as_u16(),
            body: serde_json::to_string(value)?,
        })
    }

    /// `{"message": "..."}`形式のレスポンスを作成
    pub fn message(status: StatusCode, message: &str) -> Self {
        // 文字列フィールドのみの構造体はシリアライズに失敗しない
        let body = serde_json::to_string(&MessageBody { message })
            .unwrap_or_else(|_| String::from(r#"{"message":""}"#));

        Self {
            status_code: status.as_u16(),
            body,
        }
    }

    /// ルート未登録時の404レスポンス
    pub fn not_found() -> Self {
        Self::message(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
    }

    /// プロジェクト未登録時の404レスポンス
    pub fn project_not_found() -> Self {
        Self::message(StatusCode::NOT_FOUND, PROJECT_NOT_FOUND_MESSAGE)
    }

    /// 捕捉したエラーの説明を埋め込んだ500レスポンス
    pub fn internal_error(description: impl std::fmt::Display) -> Self {
        let message = format!("{INTERNAL_ERROR_PREFIX}{description}");
        Self::message(StatusCode::INTERNAL_SERVER_ERROR, &message)
    }
}
