use crate::api_client::{encode_query, join_base_url, ApiClient, ApiResponse};
use crate::error::ApiError;
use crate::models::{PreviewRequest, PreviewResponse};
use serde_json::Value;

pub const DEFAULT_ORIGIN: &str = "http://localhost:8081";

/// The `preview` resource. Lives at the page origin, not under `/api/v1`.
#[derive(Debug, Clone)]
pub struct PreviewApi {
    origin: String,
    client: ApiClient,
}

impl Default for PreviewApi {
    fn default() -> Self {
        Self::new(DEFAULT_ORIGIN)
    }
}

impl PreviewApi {
    pub fn new(origin: &str) -> Self {
        Self {
            origin: join_base_url(origin, ""),
            client: ApiClient::with_api_url(origin, "preview"),
        }
    }

    /// Returns the preview id the page should be opened with.
    pub async fn get_preview(&self, html: &str, src_path: &str) -> Result<String, ApiError> {
        let res = self
            .client
            .post("getPreview", &PreviewRequest { html, src_path })
            .await?;
        let value = match res {
            ApiResponse::Json(value) => value,
            ApiResponse::Text(text) => {
                return Err(ApiError::unexpected("getPreview", format!("expected JSON, got {:?}", text)))
            }
        };
        let parsed: PreviewResponse = serde_json::from_value(value)?;
        match parsed.preview_id {
            Value::String(id) => Ok(id),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(ApiError::unexpected("getPreview", format!("bad previewId {}", other))),
        }
    }

    pub fn preview_url(&self, preview_id: &str) -> String {
        format!("{}/preview.html?{}", self.origin, encode_query(&[("id", preview_id)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_url_is_rooted_at_origin() {
        let api = PreviewApi::new("http://localhost:8081/");
        assert_eq!(api.preview_url("42"), "http://localhost:8081/preview.html?id=42");
        assert_eq!(api.client.base_url(), "http://localhost:8081/preview");
    }
}
