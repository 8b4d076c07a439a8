/// リクエストルーター
///
/// HTTPメソッドとパスの組からハンドラーを引くディスパッチテーブル。
/// テーブルは起動時に一度だけ構築し、以降は読み取り専用で共有する。
use std::collections::HashMap;

use lambda_http::http::Method;

use crate::application::request::PathParameters;

/// プロジェクト一覧・作成のパス
pub const PROJECTS_PATH: &str = "/projects";

/// プロジェクト個別操作のパスパターン
pub const PROJECT_BY_ID_PATH: &str = "/projects/{id}";

/// ルートに紐づくプロジェクト操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectAction {
    /// POST /projects
    Create,
    /// GET /projects
    List,
    /// GET /projects/{id}
    GetById,
    /// PUT /projects/{id}
    Update,
    /// DELETE /projects/{id}
    Delete,
}

/// 末尾セグメントがプレースホルダーのパスパターン（例: `/projects/{id}`）
#[derive(Debug, Clone, PartialEq, Eq)]
struct DynamicPattern {
    /// 登録時のパターン文字列
    pattern: String,
    /// プレースホルダー直前までの接頭辞（末尾の`/`を含む）
    prefix: String,
    /// パラメータ名
    parameter: String,
}

impl DynamicPattern {
    /// パターン文字列を解析する。プレースホルダーを含まなければNone
    fn parse(pattern: &str) -> Option<Self> {
        let (prefix, last) = pattern.rsplit_once('/')?;
        let parameter = last.strip_prefix('{')?.strip_suffix('}')?;
        if parameter.is_empty() {
            return None;
        }

        Some(Self {
            pattern: pattern.to_string(),
            prefix: format!("{prefix}/"),
            parameter: parameter.to_string(),
        })
    }

    /// パスがパターンに一致すればプレースホルダー部分を返す
    ///
    /// セグメントは空でなく`/`を含まないこと。
    fn capture<'p>(&self, path: &'p str) -> Option<&'p str> {
        let segment = path.strip_prefix(self.prefix.as_str())?;
        (!segment.is_empty() && !segment.contains('/')).then_some(segment)
    }
}

/// ルーティング結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'t, A> {
    /// 一致したパスパターン
    pub pattern: &'t str,
    /// 呼び出すアクション
    pub action: A,
    /// 抽出したパスパラメータ
    pub path_parameters: PathParameters,
}

/// パスパターン -> (HTTPメソッド -> アクション) のディスパッチテーブル
#[derive(Debug, Clone)]
pub struct RouteTable<A> {
    routes: HashMap<String, HashMap<Method, A>>,
    /// 動的パターン（登録順に照合する）
    dynamic: Vec<DynamicPattern>,
}

impl<A: Copy> RouteTable<A> {
    pub fn builder() -> RouteTableBuilder<A> {
        RouteTableBuilder::default()
    }

    /// メソッドとパスからアクションを解決する
    ///
    /// # 処理フロー
    /// 1. 動的パターンに一致すれば、そのパターンとパスパラメータを採用
    /// 2. 一致しなければパスをそのままパターンとして扱う
    /// 3. パターン、メソッドの順にテーブルを引く
    ///
    /// 動的パターンに一致した後はリテラルのパスへフォールバックしない。
    ///
    /// # 戻り値
    /// * 見つかった場合は`Some(RouteMatch)`
    /// * パターンまたはメソッドが未登録なら`None`（404として扱う）
    pub fn resolve(&self, method: &str, path: &str) -> Option<RouteMatch<'_, A>> {
        let dynamic_match = self
            .dynamic
            .iter()
            .find_map(|pattern| pattern.capture(path).map(|segment| (pattern, segment)));

        let (pattern, path_parameters) = match dynamic_match {
            Some((pattern, segment)) => (
                pattern.pattern.as_str(),
                PathParameters::single(pattern.parameter.as_str(), segment),
            ),
            None => (path, PathParameters::new()),
        };

        let method = Method::from_bytes(method.as_bytes()).ok()?;
        let (pattern, methods) = self.routes.get_key_value(pattern)?;
        let action = *methods.get(&method)?;

        Some(RouteMatch {
            pattern: pattern.as_str(),
            action,
            path_parameters,
        })
    }

    /// 登録されているルートキー（パターン, メソッド）の数
    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RouteTable<ProjectAction> {
    /// プロジェクトAPIのディスパッチテーブルを構築
    pub fn projects() -> Self {
        Self::builder()
            .route(PROJECTS_PATH, Method::POST, ProjectAction::Create)
            .route(PROJECTS_PATH, Method::GET, ProjectAction::List)
            .route(PROJECT_BY_ID_PATH, Method::GET, ProjectAction::GetById)
            .route(PROJECT_BY_ID_PATH, Method::PUT, ProjectAction::Update)
            .route(PROJECT_BY_ID_PATH, Method::DELETE, ProjectAction::Delete)
            .build()
    }
}

/// RouteTableのビルダー
#[derive(Debug)]
pub struct RouteTableBuilder<A> {
    routes: HashMap<String, HashMap<Method, A>>,
    dynamic: Vec<DynamicPattern>,
}

impl<A> Default for RouteTableBuilder<A> {
    fn default() -> Self {
        Self {
            routes: HashMap::new(),
            dynamic: Vec::new(),
        }
    }
}

impl<A> RouteTableBuilder<A> {
    /// ルートを登録する。同じ（パターン, メソッド）は後から登録したものが優先
    pub fn route(mut self, pattern: &str, method: Method, action: A) -> Self {
        if let Some(dynamic) = DynamicPattern::parse(pattern)
            && !self.dynamic.iter().any(|known| known.pattern == dynamic.pattern)
        {
            self.dynamic.push(dynamic);
        }

        self.routes
            .entry(pattern.to_string())
            .or_default()
            .insert(method, action);
        self
    }

    pub fn build(self) -> RouteTable<A> {
        RouteTable {
            routes: self.routes,
            dynamic: self.dynamic,
        }
    }
}
