/// DynamoDB接続設定
use aws_sdk_dynamodb::Client as DynamoDbClient;
use thiserror::Error;

/// プロジェクトテーブル名を指定する環境変数
pub const TABLE_NAME_ENV: &str = "TABLE_NAME";

/// 設定読み込みのエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// テーブル名とクライアントを持つDynamoDB設定
///
/// テーブル名は環境変数`TABLE_NAME`で設定する。
#[derive(Debug, Clone)]
pub struct ProjectTableConfig {
    /// DynamoDBクライアントインスタンス
    client: DynamoDbClient,
    /// プロジェクトテーブル名
    table_name: String,
}

impl ProjectTableConfig {
    /// 環境変数からテーブル名を、環境からAWS設定を読み込んで新しい設定を作成
    ///
    /// 環境変数:
    /// - AWS認証情報・リージョン: aws-configにより自動読み込み
    /// - TABLE_NAME: プロジェクト用DynamoDBテーブル名
    pub async fn from_env() -> Result<Self, ConfigError> {
        // AWS設定の読み込みより先にテーブル名を検証する
        let table_name = table_name_from_env()?;

        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = DynamoDbClient::new(&aws_config);

        Ok(Self { client, table_name })
    }

    /// DynamoDBクライアントへの参照を取得
    pub fn client(&self) -> &DynamoDbClient {
        &self.client
    }

    /// プロジェクトテーブル名を取得
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

/// 環境変数`TABLE_NAME`を読み取る
///
/// 未設定または空文字列の場合はエラー。
pub fn table_name_from_env() -> Result<String, ConfigError> {
    std::env::var(TABLE_NAME_ENV)
        .ok()
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(TABLE_NAME_ENV.to_string()))
}
