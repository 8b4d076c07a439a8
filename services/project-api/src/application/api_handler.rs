/// APIエントリポイント
///
/// Lambdaペイロードを受け取り、ルーティングとハンドラー呼び出しを行う。
/// 処理中のエラーはここでのみ捕捉し、500レスポンスに変換する。
use serde_json::Value;
use tracing::{error, info};

use crate::application::project_handler::{HandlerError, ProjectHandler};
use crate::application::request::{ApiGatewayEvent, RequestContext};
use crate::application::router::{ProjectAction, RouteTable};
use crate::domain::ApiResponse;
use crate::infrastructure::ProjectRepository;

/// API Gatewayイベントを処理するハンドラー
pub struct ApiHandler<R>
where
    R: ProjectRepository,
{
    /// ディスパッチテーブル（構築後は読み取り専用）
    routes: RouteTable<ProjectAction>,
    /// プロジェクト操作ハンドラー
    project_handler: ProjectHandler<R>,
}

impl<R> ApiHandler<R>
where
    R: ProjectRepository,
{
    /// ディスパッチテーブルとリポジトリから新しいApiHandlerを作成
    pub fn new(routes: RouteTable<ProjectAction>, repository: R) -> Self {
        Self {
            routes,
            project_handler: ProjectHandler::new(repository),
        }
    }

    /// 標準のプロジェクトルートでApiHandlerを作成
    pub fn with_repository(repository: R) -> Self {
        Self::new(RouteTable::projects(), repository)
    }

    /// Lambdaペイロードを処理してレスポンスを返す
    ///
    /// エラーを返すことはなく、失敗時は
    /// `500 {"message": "An internal error occurred: <説明>"}`を返す。
    pub async fn handle(&self, payload: &Value) -> ApiResponse {
        match self.dispatch(payload).await {
            Ok(response) => {
                info!(status_code = response.status_code, "レスポンス返却");
                response
            }
            Err(err) => {
                error!(error = %err, "リクエスト処理エラー");
                ApiResponse::internal_error(&err)
            }
        }
    }

    /// ルーティングしてハンドラーを呼び出す
    ///
    /// # 処理フロー
    /// 1. ペイロードをプロキシ統合イベントとして読み取る
    /// 2. メソッドとパスからアクションを解決（未登録なら404）
    /// 3. ボディとパスパラメータを渡してハンドラーを実行
    async fn dispatch(&self, payload: &Value) -> Result<ApiResponse, HandlerError> {
        let event = ApiGatewayEvent::from_value(payload)
            .map_err(|e| HandlerError::InvalidEvent(e.to_string()))?;

        let path = event.path.as_deref().ok_or(HandlerError::MissingPath)?;
        let method = event.http_method.as_deref().unwrap_or_default();

        info!(http_method = method, path = path, "リクエスト受信");

        let Some(route) = self.routes.resolve(method, path) else {
            info!(http_method = method, path = path, "ルートが見つからない");
            return Ok(ApiResponse::not_found());
        };

        let context = RequestContext::new(event.body, route.path_parameters);
        self.project_handler.handle(route.action, &context).await
    }
}
