// アプリケーション層モジュール
pub mod api_handler;
pub mod project_handler;
pub mod request;
pub mod router;

// 再エクスポート
pub use api_handler::ApiHandler;
pub use project_handler::{HandlerError, ProjectHandler};
pub use request::{ApiGatewayEvent, PathParameters, RequestContext};
pub use router::{ProjectAction, RouteMatch, RouteTable, RouteTableBuilder};
