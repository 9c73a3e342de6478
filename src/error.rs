use thiserror::Error;

/// Everything that can go wrong between a caller and the editor backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, TLS, ...).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("API {status} {status_text}: {body}")]
    Http {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A rename or move would land on a buffer with unsaved edits.
    #[error("{path} has unsaved changes")]
    UnsavedChanges { path: String },

    /// The backend answered 2xx but the payload did not have the expected shape.
    #[error("unexpected response from {endpoint}: {detail}")]
    UnexpectedResponse { endpoint: String, detail: String },
}

impl ApiError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ApiError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn unexpected(endpoint: impl Into<String>, detail: impl Into<String>) -> Self {
        ApiError::UnexpectedResponse {
            endpoint: endpoint.into(),
            detail: detail.into(),
        }
    }

    /// HTTP status of a backend rejection, if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_message_carries_status_and_body() {
        let err = ApiError::Http {
            status: 500,
            status_text: "Internal Server Error".to_string(),
            body: "disk full".to_string(),
        };
        assert_eq!(err.to_string(), "API 500 Internal Server Error: disk full");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn non_http_errors_have_no_status() {
        let err = ApiError::unexpected("getNodeTree", "expected an array");
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("getNodeTree"));
    }
}
