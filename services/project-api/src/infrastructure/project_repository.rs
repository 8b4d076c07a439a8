/// DynamoDBでプロジェクトを管理するためのプロジェクトリポジトリ
///
/// テーブルのパーティションキーは`id`（文字列）のみ。
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use thiserror::Error;
use tracing::debug;

use crate::domain::{Project, ProjectFields};

/// リポジトリ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    /// DynamoDBへの書き込みに失敗
    #[error("Write error: {0}")]
    WriteError(String),

    /// DynamoDBからの読み取りに失敗
    #[error("Read error: {0}")]
    ReadError(String),

    /// アイテムとプロジェクトの相互変換に失敗
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// プロジェクト永続化用トレイト
///
/// 実際のDynamoDBとテスト用モックを差し替えられるように
/// ストア操作を抽象化する。どの操作も存在チェックは行わない。
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// プロジェクトを保存（同一IDは上書き）
    async fn put(&self, project: &Project) -> Result<(), RepositoryError>;

    /// 全プロジェクトを取得
    ///
    /// DynamoDBのページ分割はリポジトリ内で辿り、全件を返す。
    async fn scan_all(&self) -> Result<Vec<Project>, RepositoryError>;

    /// IDでプロジェクトを取得
    ///
    /// # 戻り値
    /// * 見つかった場合は`Ok(Some(Project))`
    /// * 見つからなかった場合は`Ok(None)`
    /// * 失敗時は`Err(RepositoryError)`
    async fn get_by_key(&self, id: &str) -> Result<Option<Project>, RepositoryError>;

    /// name, description, statusを更新
    ///
    /// 存在しないIDでも成功する（DynamoDBのUpdateItemはアイテムを作成する）。
    async fn update_fields(&self, id: &str, fields: &ProjectFields)
        -> Result<(), RepositoryError>;

    /// IDでプロジェクトを削除
    ///
    /// 存在しないIDでも成功する。
    async fn delete_by_key(&self, id: &str) -> Result<(), RepositoryError>;
}

/// 更新式（予約語`name`, `status`を避けるため属性名プレースホルダーを使う）
const UPDATE_EXPRESSION: &str = "SET #n = :name, #d = :description, #s = :status";

/// SDKエラーを原因の連鎖ごと文字列にする
///
/// サービスに到達しなかった失敗（認証情報なし、接続失敗など）も説明を残す。
fn sdk_error_message<E: std::error::Error>(err: &E) -> String {
    DisplayErrorContext(err).to_string()
}

/// ProjectRepositoryのDynamoDB実装
#[derive(Debug, Clone)]
pub struct DynamoProjectRepository {
    /// DynamoDBクライアント
    client: DynamoDbClient,
    /// プロジェクトテーブル名
    table_name: String,
}

impl DynamoProjectRepository {
    /// 新しいDynamoProjectRepositoryを作成
    ///
    /// # 引数
    /// * `client` - DynamoDBクライアント
    /// * `table_name` - プロジェクトテーブルの名前
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// プロジェクトをDynamoDBアイテムに変換
    fn to_item(project: &Project) -> Result<HashMap<String, AttributeValue>, RepositoryError> {
        serde_dynamo::to_item(project)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))
    }

    /// DynamoDBアイテムをプロジェクトに変換
    fn from_item(item: HashMap<String, AttributeValue>) -> Result<Project, RepositoryError> {
        serde_dynamo::from_item(item)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))
    }

    /// 文字列またはNULLの属性値に変換
    fn to_attribute_value(value: &Option<String>) -> Result<AttributeValue, RepositoryError> {
        serde_dynamo::to_attribute_value(value)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))
    }
}

#[async_trait]
impl ProjectRepository for DynamoProjectRepository {
    async fn put(&self, project: &Project) -> Result<(), RepositoryError> {
        let item = Self::to_item(project)?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| RepositoryError::WriteError(sdk_error_message(&e)))?;

        Ok(())
    }

    async fn scan_all(&self) -> Result<Vec<Project>, RepositoryError> {
        let mut projects = Vec::new();
        let mut last_evaluated_key = None;
        let mut page_count = 0usize;

        // ページネーション: LastEvaluatedKeyがある限りスキャンを続ける
        loop {
            let mut scan_builder = self.client.scan().table_name(&self.table_name);

            if let Some(key) = last_evaluated_key.take() {
                scan_builder = scan_builder.set_exclusive_start_key(Some(key));
            }

            let result = scan_builder
                .send()
                .await
                .map_err(|e| RepositoryError::ReadError(sdk_error_message(&e)))?;
            page_count += 1;

            for item in result.items.unwrap_or_default() {
                projects.push(Self::from_item(item)?);
            }

            match result.last_evaluated_key {
                Some(key) => last_evaluated_key = Some(key),
                None => break,
            }
        }

        debug!(
            table_name = %self.table_name,
            page_count = page_count,
            item_count = projects.len(),
            "スキャン完了"
        );

        Ok(projects)
    }

    async fn get_by_key(&self, id: &str) -> Result<Option<Project>, RepositoryError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| RepositoryError::ReadError(sdk_error_message(&e)))?;

        result.item.map(Self::from_item).transpose()
    }

    async fn update_fields(
        &self,
        id: &str,
        fields: &ProjectFields,
    ) -> Result<(), RepositoryError> {
        self.client
            .update_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .update_expression(UPDATE_EXPRESSION)
            .expression_attribute_names("#n", "name")
            .expression_attribute_names("#d", "description")
            .expression_attribute_names("#s", "status")
            .expression_attribute_values(":name", Self::to_attribute_value(&fields.name)?)
            .expression_attribute_values(
                ":description",
                Self::to_attribute_value(&fields.description)?,
            )
            .expression_attribute_values(":status", Self::to_attribute_value(&fields.status)?)
            .send()
            .await
            .map_err(|e| RepositoryError::WriteError(sdk_error_message(&e)))?;

        Ok(())
    }

    async fn delete_by_key(&self, id: &str) -> Result<(), RepositoryError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| RepositoryError::WriteError(sdk_error_message(&e)))?;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use aws_sdk_dynamodb::config::http::HttpResponse;
    use aws_sdk_dynamodb::error::SdkError;
    use aws_sdk_dynamodb::operation::get_item::{GetItemError, GetItemOutput};
    use aws_sdk_dynamodb::operation::scan::ScanOutput;
    use aws_sdk_dynamodb::operation::update_item::UpdateItemOutput;
    use aws_sdk_dynamodb::types::error::ResourceNotFoundException;
    use aws_smithy_mocks::{mock, mock_client, RuleMode};
    use std::sync::{Arc, Mutex};

    // ==================== エラー型テスト ====================

    #[test]
    fn test_repository_error_write_error_display() {
        let error = RepositoryError::WriteError("conditional check failed".to_string());
        assert_eq!(error.to_string(), "Write error: conditional check failed");
    }

    #[test]
    fn test_repository_error_read_error_display() {
        let error = RepositoryError::ReadError("throttled".to_string());
        assert_eq!(error.to_string(), "Read error: throttled");
    }

    #[test]
    fn test_repository_error_serialization_error_display() {
        let error = RepositoryError::SerializationError("invalid format".to_string());
        assert_eq!(error.to_string(), "Serialization error: invalid format");
    }

    // ==================== アイテム変換テスト ====================

    fn sample_project() -> Project {
        Project {
            id: "id-1".to_string(),
            name: Some("A".to_string()),
            description: Some("d".to_string()),
            status: Some("open".to_string()),
            created_at: Some("2024-01-01".to_string()),
        }
    }

    /// プロジェクトは文字列属性のアイテムになり、キーはcamelCase
    #[test]
    fn test_to_item_uses_string_attributes() {
        let item = DynamoProjectRepository::to_item(&sample_project()).unwrap();

        assert_eq!(item.get("id"), Some(&AttributeValue::S("id-1".to_string())));
        assert_eq!(item.get("name"), Some(&AttributeValue::S("A".to_string())));
        assert_eq!(
            item.get("createdAt"),
            Some(&AttributeValue::S("2024-01-01".to_string()))
        );
        assert_eq!(item.len(), 5);
    }

    /// Noneのフィールドは NULL 属性になる
    #[test]
    fn test_to_item_stores_none_as_null() {
        let project = Project {
            name: None,
            ..sample_project()
        };
        let item = DynamoProjectRepository::to_item(&project).unwrap();

        assert_eq!(item.get("name"), Some(&AttributeValue::Null(true)));
    }

    /// UpdateItemで作られたcreatedAtのないアイテムも読み込める
    #[test]
    fn test_from_item_with_missing_attributes() {
        let mut item = HashMap::new();
        item.insert("id".to_string(), AttributeValue::S("id-2".to_string()));
        item.insert("name".to_string(), AttributeValue::S("B".to_string()));
        item.insert("status".to_string(), AttributeValue::Null(true));

        let project = DynamoProjectRepository::from_item(item).unwrap();

        assert_eq!(project.id, "id-2");
        assert_eq!(project.name.as_deref(), Some("B"));
        assert!(project.status.is_none());
        assert!(project.description.is_none());
        assert!(project.created_at.is_none());
    }

    /// idのないアイテムはシリアライズエラー
    #[test]
    fn test_from_item_without_id_fails() {
        let mut item = HashMap::new();
        item.insert("name".to_string(), AttributeValue::S("B".to_string()));

        let result = DynamoProjectRepository::from_item(item);

        assert!(matches!(result, Err(RepositoryError::SerializationError(_))));
    }

    #[test]
    fn test_to_attribute_value() {
        assert_eq!(
            DynamoProjectRepository::to_attribute_value(&Some("x".to_string())).unwrap(),
            AttributeValue::S("x".to_string())
        );
        assert_eq!(
            DynamoProjectRepository::to_attribute_value(&None).unwrap(),
            AttributeValue::Null(true)
        );
    }

    // ==================== DynamoDB実装テスト ====================

    const TABLE: &str = "projects";

    fn item(id: &str, name: &str) -> HashMap<String, AttributeValue> {
        HashMap::from([
            ("id".to_string(), AttributeValue::S(id.to_string())),
            ("name".to_string(), AttributeValue::S(name.to_string())),
        ])
    }

    /// LastEvaluatedKeyを次のリクエストのExclusiveStartKeyとして送り、全ページを集める
    #[tokio::test]
    async fn test_scan_all_collects_every_page() {
        let first_page = mock!(aws_sdk_dynamodb::Client::scan)
            .match_requests(|req| {
                req.table_name() == Some(TABLE) && req.exclusive_start_key().is_none()
            })
            .then_output(|| {
                ScanOutput::builder()
                    .items(item("p-1", "A"))
                    .items(item("p-2", "B"))
                    .last_evaluated_key("id", AttributeValue::S("p-2".to_string()))
                    .build()
            });
        let second_page = mock!(aws_sdk_dynamodb::Client::scan)
            .match_requests(|req| {
                req.table_name() == Some(TABLE)
                    && req.exclusive_start_key().and_then(|key| key.get("id"))
                        == Some(&AttributeValue::S("p-2".to_string()))
            })
            .then_output(|| ScanOutput::builder().items(item("p-3", "C")).build());
        let client = mock_client!(
            aws_sdk_dynamodb,
            RuleMode::Sequential,
            [&first_page, &second_page]
        );
        let repo = DynamoProjectRepository::new(client, TABLE.to_string());

        let projects = repo.scan_all().await.unwrap();

        let ids: Vec<&str> = projects.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["p-1", "p-2", "p-3"]);
        assert_eq!(projects[2].name.as_deref(), Some("C"));
        assert_eq!(first_page.num_calls(), 1);
        assert_eq!(second_page.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_scan_all_empty_table() {
        let scan = mock!(aws_sdk_dynamodb::Client::scan)
            .then_output(|| ScanOutput::builder().build());
        let client = mock_client!(aws_sdk_dynamodb, [&scan]);
        let repo = DynamoProjectRepository::new(client, TABLE.to_string());

        assert!(repo.scan_all().await.unwrap().is_empty());
        assert_eq!(scan.num_calls(), 1);
    }

    /// 更新式と属性名・属性値のプレースホルダーを送る（NoneはNULL）
    #[tokio::test]
    async fn test_update_fields_sends_update_expression() {
        let update = mock!(aws_sdk_dynamodb::Client::update_item)
            .match_requests(|req| {
                let names = req.expression_attribute_names().cloned().unwrap_or_default();
                let values = req.expression_attribute_values().cloned().unwrap_or_default();

                req.table_name() == Some(TABLE)
                    && req.key().and_then(|key| key.get("id"))
                        == Some(&AttributeValue::S("p-1".to_string()))
                    && req.update_expression() == Some(UPDATE_EXPRESSION)
                    && names.get("#n").map(String::as_str) == Some("name")
                    && names.get("#d").map(String::as_str) == Some("description")
                    && names.get("#s").map(String::as_str) == Some("status")
                    && values.get(":name") == Some(&AttributeValue::S("B".to_string()))
                    && values.get(":description") == Some(&AttributeValue::Null(true))
                    && values.get(":status") == Some(&AttributeValue::S("closed".to_string()))
            })
            .then_output(|| UpdateItemOutput::builder().build());
        let client = mock_client!(aws_sdk_dynamodb, [&update]);
        let repo = DynamoProjectRepository::new(client, TABLE.to_string());
        let fields = ProjectFields {
            name: Some("B".to_string()),
            description: None,
            status: Some("closed".to_string()),
        };

        repo.update_fields("p-1", &fields).await.unwrap();

        assert_eq!(update.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_get_by_key_reads_item() {
        let get = mock!(aws_sdk_dynamodb::Client::get_item)
            .match_requests(|req| {
                req.key().and_then(|key| key.get("id"))
                    == Some(&AttributeValue::S("p-1".to_string()))
            })
            .then_output(|| GetItemOutput::builder().set_item(Some(item("p-1", "A"))).build());
        let client = mock_client!(aws_sdk_dynamodb, [&get]);
        let repo = DynamoProjectRepository::new(client, TABLE.to_string());

        let project = repo.get_by_key("p-1").await.unwrap().unwrap();

        assert_eq!(project.id, "p-1");
        assert_eq!(project.name.as_deref(), Some("A"));
        assert!(project.created_at.is_none());
    }

    /// サービスエラーの説明はReadErrorに残る
    #[tokio::test]
    async fn test_get_by_key_keeps_service_error_description() {
        let get = mock!(aws_sdk_dynamodb::Client::get_item).then_error(|| {
            GetItemError::ResourceNotFoundException(
                ResourceNotFoundException::builder()
                    .message("Requested resource not found")
                    .build(),
            )
        });
        let client = mock_client!(aws_sdk_dynamodb, [&get]);
        let repo = DynamoProjectRepository::new(client, TABLE.to_string());

        let error = repo.get_by_key("p-1").await.unwrap_err();

        match error {
            RepositoryError::ReadError(message) => {
                assert!(message.contains("Requested resource not found"), "{message}");
            }
            other => panic!("expected ReadError, got {other:?}"),
        }
    }

    /// リクエスト構築に失敗したSDKエラーも説明が失われない
    #[test]
    fn test_sdk_error_message_keeps_construction_failure() {
        let err = SdkError::<GetItemError, HttpResponse>::construction_failure(
            "no credentials provider configured",
        );

        let error = RepositoryError::ReadError(sdk_error_message(&err));

        let message = error.to_string();
        assert!(message.starts_with("Read error: "), "{message}");
        assert!(message.contains("no credentials provider configured"), "{message}");
        assert!(!message.ends_with("unhandled error"), "{message}");
    }

    // ==================== モックリポジトリ ====================

    /// ユニットテスト用のモックProjectRepository
    ///
    /// DynamoDBと同様に、更新は存在しないIDでもアイテムを作成し、
    /// 削除は存在しないIDでも成功する。
    #[derive(Debug, Clone, Default)]
    pub struct MockProjectRepository {
        /// 保存されたプロジェクト: id -> Project
        projects: Arc<Mutex<HashMap<String, Project>>>,
        /// 次の操作で返すエラー（エラーパスのテスト用）
        next_error: Arc<Mutex<Option<RepositoryError>>>,
    }

    impl MockProjectRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_next_error(&self, error: RepositoryError) {
            *self.next_error.lock().unwrap() = Some(error);
        }

        pub fn project_count(&self) -> usize {
            self.projects.lock().unwrap().len()
        }

        pub fn get_project(&self, id: &str) -> Option<Project> {
            self.projects.lock().unwrap().get(id).cloned()
        }

        pub fn insert(&self, project: Project) {
            self.projects
                .lock()
                .unwrap()
                .insert(project.id.clone(), project);
        }

        fn take_error(&self) -> Option<RepositoryError> {
            self.next_error.lock().unwrap().take()
        }
    }

    #[async_trait]
    impl ProjectRepository for MockProjectRepository {
        async fn put(&self, project: &Project) -> Result<(), RepositoryError> {
            if let Some(error) = self.take_error() {
                return Err(error);
            }

            self.insert(project.clone());
            Ok(())
        }

        async fn scan_all(&self) -> Result<Vec<Project>, RepositoryError> {
            if let Some(error) = self.take_error() {
                return Err(error);
            }

            Ok(self.projects.lock().unwrap().values().cloned().collect())
        }

        async fn get_by_key(&self, id: &str) -> Result<Option<Project>, RepositoryError> {
            if let Some(error) = self.take_error() {
                return Err(error);
            }

            Ok(self.get_project(id))
        }

        async fn update_fields(
            &self,
            id: &str,
            fields: &ProjectFields,
        ) -> Result<(), RepositoryError> {
            if let Some(error) = self.take_error() {
                return Err(error);
            }

            // idとcreatedAtは保持し、3フィールドだけを置き換える
            let mut projects = self.projects.lock().unwrap();
            let project = projects.entry(id.to_string()).or_insert_with(|| Project {
                id: id.to_string(),
                name: None,
                description: None,
                status: None,
                created_at: None,
            });
            project.name = fields.name.clone();
            project.description = fields.description.clone();
            project.status = fields.status.clone();
            Ok(())
        }

        async fn delete_by_key(&self, id: &str) -> Result<(), RepositoryError> {
            if let Some(error) = self.take_error() {
                return Err(error);
            }

            self.projects.lock().unwrap().remove(id);
            Ok(())
        }
    }

    // ==================== モックリポジトリテスト ====================

    #[tokio::test]
    async fn test_mock_repo_put_and_get() {
        let repo = MockProjectRepository::new();
        repo.put(&sample_project()).await.unwrap();

        let project = repo.get_by_key("id-1").await.unwrap();
        assert_eq!(project, Some(sample_project()));
    }

    /// 同一IDのputは上書きになる
    #[tokio::test]
    async fn test_mock_repo_put_overwrites() {
        let repo = MockProjectRepository::new();
        repo.put(&sample_project()).await.unwrap();
        repo.put(&Project {
            name: Some("new".to_string()),
            ..sample_project()
        })
        .await
        .unwrap();

        assert_eq!(repo.project_count(), 1);
        assert_eq!(repo.get_project("id-1").unwrap().name.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_mock_repo_get_non_existent() {
        let repo = MockProjectRepository::new();
        assert!(repo.get_by_key("missing").await.unwrap().is_none());
    }

    /// 存在しないIDの更新はアイテムを作成する（UpdateItemと同じ挙動）
    #[tokio::test]
    async fn test_mock_repo_update_non_existent_creates_item() {
        let repo = MockProjectRepository::new();
        let fields = ProjectFields {
            name: Some("B".to_string()),
            description: None,
            status: Some("open".to_string()),
        };

        repo.update_fields("ghost", &fields).await.unwrap();

        let project = repo.get_project("ghost").unwrap();
        assert_eq!(project.name.as_deref(), Some("B"));
        assert!(project.created_at.is_none());
    }

    /// 更新はidとcreatedAtを変更しない
    #[tokio::test]
    async fn test_mock_repo_update_keeps_created_at() {
        let repo = MockProjectRepository::new();
        repo.insert(sample_project());
        let fields = ProjectFields {
            name: Some("B".to_string()),
            description: None,
            status: Some("closed".to_string()),
        };

        repo.update_fields("id-1", &fields).await.unwrap();

        let project = repo.get_project("id-1").unwrap();
        assert_eq!(project.id, "id-1");
        assert_eq!(project.name.as_deref(), Some("B"));
        assert!(project.description.is_none());
        assert_eq!(project.status.as_deref(), Some("closed"));
        assert_eq!(project.created_at.as_deref(), Some("2024-01-01"));
    }

    /// 存在しないIDの削除は成功する
    #[tokio::test]
    async fn test_mock_repo_delete_non_existent() {
        let repo = MockProjectRepository::new();
        assert!(repo.delete_by_key("missing").await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_repo_next_error_is_consumed_once() {
        let repo = MockProjectRepository::new();
        repo.set_next_error(RepositoryError::ReadError("DynamoDB unavailable".to_string()));

        let first = repo.scan_all().await;
        let second = repo.scan_all().await;

        assert_eq!(
            first.unwrap_err(),
            RepositoryError::ReadError("DynamoDB unavailable".to_string())
        );
        assert!(second.unwrap().is_empty());
    }
}
