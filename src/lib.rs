pub mod api_client;
pub mod backend;
pub mod editor_api;
pub mod error;
pub mod file_system;
pub mod handlers;
pub mod models;
pub mod preview_api;
pub mod session;

pub use api_client::{ApiClient, ApiResponse, RequestOptions};
pub use backend::{EditorBackend, RemoteBackend};
pub use editor_api::EditorApi;
pub use error::ApiError;
pub use preview_api::PreviewApi;
pub use session::EditorSession;
