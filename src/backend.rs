use crate::api_client::ApiResponse;
use crate::editor_api::EditorApi;
use crate::error::ApiError;
use crate::models::TreeNode;
use crate::preview_api::PreviewApi;

/// What an [`EditorSession`](crate::session::EditorSession) needs from the outside world.
#[allow(async_fn_in_trait)]
pub trait EditorBackend {
    async fn get_node_tree(&self, id: &str, environment_path: &str) -> Result<Vec<TreeNode>, ApiError>;
    async fn get_node_text(&self, path: &str) -> Result<String, ApiError>;
    async fn save_node_text(&self, path: &str, content: &str) -> Result<ApiResponse, ApiError>;
    async fn create_node(&self, path: &str, is_folder: bool) -> Result<ApiResponse, ApiError>;
    async fn rename_node(&self, old_path: &str, target_path: &str) -> Result<ApiResponse, ApiError>;
    async fn delete_node(&self, path: &str) -> Result<ApiResponse, ApiError>;
    async fn move_node(&self, old_path: &str, target_path: &str) -> Result<ApiResponse, ApiError>;
    async fn upload_node(&self, file_name: &str, bytes: Vec<u8>, target_path: &str) -> Result<ApiResponse, ApiError>;
    async fn get_src_path(&self, environment_path: &str) -> Result<String, ApiError>;
    async fn get_preview(&self, html: &str, src_path: &str) -> Result<String, ApiError>;
    fn preview_url(&self, preview_id: &str) -> String;
}

/// The HTTP backend: editor endpoints under the API root, preview at the origin.
#[derive(Debug, Clone, Default)]
pub struct RemoteBackend {
    pub editor: EditorApi,
    pub preview: PreviewApi,
}

impl RemoteBackend {
    pub fn new(api_url: &str, origin: &str) -> Self {
        Self {
            editor: EditorApi::with_api_url(api_url),
            preview: PreviewApi::new(origin),
        }
    }
}

impl EditorBackend for RemoteBackend {
    async fn get_node_tree(&self, id: &str, environment_path: &str) -> Result<Vec<TreeNode>, ApiError> {
        self.editor.get_node_tree(id, environment_path).await
    }

    async fn get_node_text(&self, path: &str) -> Result<String, ApiError> {
        self.editor.get_node_text(path).await
    }

    async fn save_node_text(&self, path: &str, content: &str) -> Result<ApiResponse, ApiError> {
        self.editor.save_node_text(path, content).await
    }

    async fn create_node(&self, path: &str, is_folder: bool) -> Result<ApiResponse, ApiError> {
        self.editor.create_node(path, is_folder).await
    }

    async fn rename_node(&self, old_path: &str, target_path: &str) -> Result<ApiResponse, ApiError> {
        self.editor.rename_node(old_path, target_path).await
    }

    async fn delete_node(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.editor.delete_node(path).await
    }

    async fn move_node(&self, old_path: &str, target_path: &str) -> Result<ApiResponse, ApiError> {
        self.editor.move_node(old_path, target_path).await
    }

    async fn upload_node(&self, file_name: &str, bytes: Vec<u8>, target_path: &str) -> Result<ApiResponse, ApiError> {
        self.editor.upload_node(file_name, bytes, target_path).await
    }

    async fn get_src_path(&self, environment_path: &str) -> Result<String, ApiError> {
        self.editor.get_src_path(environment_path).await
    }

    async fn get_preview(&self, html: &str, src_path: &str) -> Result<String, ApiError> {
        self.preview.get_preview(html, src_path).await
    }

    fn preview_url(&self, preview_id: &str) -> String {
        self.preview.preview_url(preview_id)
    }
}
