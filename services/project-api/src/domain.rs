// Domain layer modules
pub mod api_response;
pub mod project;

// Re-exports
pub use api_response::ApiResponse;
pub use project::{NewProject, Project, ProjectFields};
