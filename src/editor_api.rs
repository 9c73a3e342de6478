use crate::api_client::{ApiClient, ApiResponse, RequestOptions};
use crate::error::ApiError;
use crate::models::{
    CreateNodeRequest, NodeTreeRequest, PathRequest, RelocateRequest, SaveTextRequest,
    SrcPathResponse, TreeNode,
};
use log::debug;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::Method;

/// Named operations of the `editor` resource. Holds no state beyond the
/// endpoint, every call maps to exactly one request.
#[derive(Debug, Clone)]
pub struct EditorApi {
    client: ApiClient,
}

impl Default for EditorApi {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorApi {
    pub fn new() -> Self {
        Self {
            client: ApiClient::new("editor"),
        }
    }

    pub fn with_api_url(api_url: &str) -> Self {
        Self {
            client: ApiClient::with_api_url(api_url, "editor"),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn get_node_tree(&self, id: &str, environment_path: &str) -> Result<Vec<TreeNode>, ApiError> {
        let res = self
            .client
            .post("getNodeTree", &NodeTreeRequest { id, environment_path })
            .await?;
        match res {
            ApiResponse::Json(value) => Ok(serde_json::from_value(value)?),
            ApiResponse::Text(text) => Err(ApiError::unexpected(
                "getNodeTree",
                format!("expected a JSON array, got {:?}", text),
            )),
        }
    }

    /// File content exactly as the backend sent it.
    pub async fn get_node_text(&self, path: &str) -> Result<String, ApiError> {
        let query = crate::api_client::encode_query(&[("path", path)]);
        self.client
            .request_text(&format!("getNodeText?{}", query), RequestOptions::new(Method::GET))
            .await
    }

    pub async fn save_node_text(&self, path: &str, content: &str) -> Result<ApiResponse, ApiError> {
        self.client
            .post("saveNodeText", &SaveTextRequest { path, content })
            .await
    }

    pub async fn create_node(&self, path: &str, is_folder: bool) -> Result<ApiResponse, ApiError> {
        self.client
            .post("createNode", &CreateNodeRequest { path, is_folder })
            .await
    }

    pub async fn rename_node(&self, old_path: &str, target_path: &str) -> Result<ApiResponse, ApiError> {
        self.client
            .post("renameNode", &RelocateRequest { old_path, target_path })
            .await
    }

    pub async fn delete_node(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.client.post("deleteNode", &PathRequest { path }).await
    }

    // Same payload as rename, but the backend may validate cross-folder moves differently.
    pub async fn move_node(&self, old_path: &str, target_path: &str) -> Result<ApiResponse, ApiError> {
        self.client
            .post("moveNode", &RelocateRequest { old_path, target_path })
            .await
    }

    pub async fn upload_node(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        target_path: &str,
    ) -> Result<ApiResponse, ApiError> {
        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        debug!("Uploading {} ({} bytes, {}) to {}", file_name, bytes.len(), mime, target_path);
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime.as_ref())?;
        let form = Form::new()
            .part("file", part)
            .text("targetPath", target_path.to_string());
        self.client
            .request_multipart("uploadNode", form, HeaderMap::new())
            .await
    }

    pub async fn get_src_path(&self, environment_path: &str) -> Result<String, ApiError> {
        let res = self
            .client
            .get("getSrcPath", &[("environmentPath", environment_path)])
            .await?;
        match res {
            ApiResponse::Json(value) if value.is_object() => {
                let parsed: SrcPathResponse = serde_json::from_value(value)?;
                Ok(parsed.src_path)
            }
            other => Ok(other.into_text().trim().to_string()),
        }
    }
}
