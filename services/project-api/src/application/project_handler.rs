/// プロジェクトCRUDハンドラー
///
/// 各操作はリポジトリ呼び出しを1回だけ行い、レスポンスを組み立てる。
/// エラーは捕捉せず呼び出し元（ApiHandler）へ伝播させる。
use lambda_http::http::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::request::RequestContext;
use crate::application::router::ProjectAction;
use crate::domain::api_response::{PROJECT_DELETED_MESSAGE, PROJECT_UPDATED_MESSAGE};
use crate::domain::{ApiResponse, NewProject, Project, ProjectFields};
use crate::infrastructure::{ProjectRepository, RepositoryError};

/// パスパラメータ名
const ID_PARAMETER: &str = "id";

/// リクエスト処理のエラー型
///
/// どのバリアントもエントリポイントで500レスポンスに変換される。
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Lambdaペイロードがプロキシ統合イベントとして読めない
    #[error("Invalid request event: {0}")]
    InvalidEvent(String),

    /// イベントにpathが含まれていない
    #[error("Missing path in request event")]
    MissingPath,

    /// ボディが必要な操作でボディがない
    #[error("Missing request body")]
    MissingBody,

    /// ボディがJSONとして解釈できない
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// 必要なパスパラメータがない
    #[error("Missing path parameter: {0}")]
    MissingPathParameter(&'static str),

    /// レスポンスボディのエンコードに失敗
    #[error("Response serialization error: {0}")]
    ResponseSerialization(String),

    /// リポジトリ操作エラー
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// プロジェクト操作を実行するハンドラー
pub struct ProjectHandler<R>
where
    R: ProjectRepository,
{
    /// プロジェクトリポジトリ
    repository: R,
}

impl<R> ProjectHandler<R>
where
    R: ProjectRepository,
{
    /// 新しいProjectHandlerを作成
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// アクションに対応する操作を実行
    pub async fn handle(
        &self,
        action: ProjectAction,
        context: &RequestContext,
    ) -> Result<ApiResponse, HandlerError> {
        match action {
            ProjectAction::Create => self.create(context).await,
            ProjectAction::List => self.list(context).await,
            ProjectAction::GetById => self.get_by_id(context).await,
            ProjectAction::Update => self.update(context).await,
            ProjectAction::Delete => self.delete(context).await,
        }
    }

    /// POST /projects
    ///
    /// 新しいIDを払い出してプロジェクトを保存し、201で作成したアイテムを返す。
    pub async fn create(&self, context: &RequestContext) -> Result<ApiResponse, HandlerError> {
        let input: NewProject = parse_body(context)?;
        let project = Project::new(Uuid::new_v4().to_string(), input);

        self.repository.put(&project).await?;

        info!(project_id = %project.id, "プロジェクト作成");

        json_response(StatusCode::CREATED, &project)
    }

    /// GET /projects
    pub async fn list(&self, _context: &RequestContext) -> Result<ApiResponse, HandlerError> {
        let projects = self.repository.scan_all().await?;

        debug!(count = projects.len(), "プロジェクト一覧取得");

        json_response(StatusCode::OK, &projects)
    }

    /// GET /projects/{id}
    ///
    /// 存在しなければ404 `Project not found`。
    pub async fn get_by_id(&self, context: &RequestContext) -> Result<ApiResponse, HandlerError> {
        let id = project_id(context)?;

        match self.repository.get_by_key(id).await? {
            Some(project) => json_response(StatusCode::OK, &project),
            None => {
                debug!(project_id = %id, "プロジェクトが見つからない");
                Ok(ApiResponse::project_not_found())
            }
        }
    }

    /// PUT /projects/{id}
    ///
    /// name, description, statusのみを更新する。存在チェックは行わない。
    pub async fn update(&self, context: &RequestContext) -> Result<ApiResponse, HandlerError> {
        let id = project_id(context)?;
        let fields: ProjectFields = parse_body(context)?;

        self.repository.update_fields(id, &fields).await?;

        info!(project_id = %id, "プロジェクト更新");

        Ok(ApiResponse::message(StatusCode::OK, PROJECT_UPDATED_MESSAGE))
    }

    /// DELETE /projects/{id}
    ///
    /// 存在チェックは行わない。
    pub async fn delete(&self, context: &RequestContext) -> Result<ApiResponse, HandlerError> {
        let id = project_id(context)?;

        self.repository.delete_by_key(id).await?;

        info!(project_id = %id, "プロジェクト削除");

        Ok(ApiResponse::message(StatusCode::OK, PROJECT_DELETED_MESSAGE))
    }
}

/// パスパラメータからプロジェクトIDを取得
fn project_id(context: &RequestContext) -> Result<&str, HandlerError> {
    context
        .path_parameter(ID_PARAMETER)
        .ok_or(HandlerError::MissingPathParameter(ID_PARAMETER))
}

/// リクエストボディをJSONとしてパース
fn parse_body<T: DeserializeOwned>(context: &RequestContext) -> Result<T, HandlerError> {
    let body = context.body.as_deref().ok_or(HandlerError::MissingBody)?;
    serde_json::from_str(body).map_err(|e| HandlerError::InvalidBody(e.to_string()))
}

fn json_response<T: serde::Serialize + ?Sized>(
    status: StatusCode,
    value: &T,
) -> Result<ApiResponse, HandlerError> {
    ApiResponse::json(status, value).map_err(|e| HandlerError::ResponseSerialization(e.to_string()))
}
