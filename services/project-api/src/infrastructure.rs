// Infrastructure layer modules
pub mod config;
pub mod logging;
pub mod project_repository;

// Re-exports
pub use config::{ConfigError, ProjectTableConfig};
pub use logging::init_logging;
pub use project_repository::{DynamoProjectRepository, ProjectRepository, RepositoryError};
