/// プロジェクトAPI Lambdaエントリポイント
///
/// API Gateway REST API（プロキシ統合）からのイベントを受け取り、
/// `/projects`配下のCRUD操作を実行して`{statusCode, body}`を返却する。
use lambda_runtime::{service_fn, Error, LambdaEvent};
use project_api::application::ApiHandler;
use project_api::domain::ApiResponse;
use project_api::infrastructure::{
    init_logging, ConfigError, DynamoProjectRepository, ProjectTableConfig,
};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{error, info, Instrument};

/// ApiHandlerの静的インスタンス
///
/// Lambda warm start時にDynamoDBクライアントとディスパッチテーブルを
/// 再利用するため、一度初期化したハンドラーを静的に保持する。
/// 初期化に失敗した場合は保持せず、次の呼び出しで再試行する。
static API_HANDLER: OnceCell<ApiHandler<DynamoProjectRepository>> = OnceCell::const_new();

/// ApiHandlerを取得（初期化されていなければ初期化）
async fn get_api_handler() -> Result<&'static ApiHandler<DynamoProjectRepository>, ConfigError> {
    API_HANDLER
        .get_or_try_init(|| async {
            let config = ProjectTableConfig::from_env().await?;

            info!(table_name = config.table_name(), "ApiHandlerを初期化");

            let repository = DynamoProjectRepository::new(
                config.client().clone(),
                config.table_name().to_string(),
            );
            Ok(ApiHandler::with_repository(repository))
        })
        .await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    // Lambda関数を初期化して実行
    let func = service_fn(handler);
    lambda_runtime::run(func).await?;
    Ok(())
}

/// Lambda関数のメインハンドラー
///
/// # 処理フロー
/// 1. リクエストIDを持つspanを開始
/// 2. ApiHandlerを取得（設定エラー時は500）
/// 3. ルーティングしてハンドラーを実行
/// 4. レスポンスをJSONとして返却
async fn handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let (payload, context) = event.into_parts();
    let span = tracing::info_span!("request", request_id = %context.request_id);

    let response = async {
        match get_api_handler().await {
            Ok(api_handler) => api_handler.handle(&payload).await,
            Err(err) => {
                error!(error = %err, "設定読み込み失敗");
                ApiResponse::internal_error(&err)
            }
        }
    }
    .instrument(span)
    .await;

    Ok(serde_json::to_value(response)?)
}
