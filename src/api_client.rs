use crate::error::ApiError;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::{Client, Method, Response};
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_API_URL: &str = "http://localhost:8081/api/v1/";

/// Body of a successful response. Decided by trying to parse JSON, not by the
/// content type the server claims.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(Value),
    Text(String),
}

impl ApiResponse {
    pub fn from_body(body: String) -> Self {
        match serde_json::from_str::<Value>(&body) {
            Ok(value) => ApiResponse::Json(value),
            Err(_) => ApiResponse::Text(body),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            ApiResponse::Text(_) => None,
        }
    }

    /// Flattens either variant into a string. JSON strings lose their quotes,
    /// other JSON values are re-serialized.
    pub fn into_text(self) -> String {
        match self {
            ApiResponse::Json(Value::String(s)) => s,
            ApiResponse::Json(value) => value.to_string(),
            ApiResponse::Text(text) => text,
        }
    }
}

/// Per-call options for [`ApiClient::request`].
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub data: Option<Value>,
    pub headers: HeaderMap,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            data: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// Thin REST wrapper around one backend resource.
///
/// No timeout, retry or cancellation: a hung request hangs the caller.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    default_headers: HeaderMap,
    http: Client,
}

impl ApiClient {
    pub fn new(resource: &str) -> Self {
        Self::with_api_url(DEFAULT_API_URL, resource)
    }

    pub fn with_api_url(api_url: &str, resource: &str) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self {
            base_url: join_base_url(api_url, resource),
            default_headers,
            http: Client::new(),
        }
    }

    /// Adds defaults on top of `Content-Type: application/json`; later entries win.
    pub fn with_default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = merge_headers(&self.default_headers, &headers);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, ApiError> {
        let res = self.send(path, options).await?;
        let body = res.text().await?;
        Ok(ApiResponse::from_body(body))
    }

    /// Same as [`request`](Self::request) but hands back the body untouched.
    pub async fn request_text(&self, path: &str, options: RequestOptions) -> Result<String, ApiError> {
        let res = self.send(path, options).await?;
        Ok(res.text().await?)
    }

    /// Multipart POST through the same status check and body handling as `request`.
    pub async fn request_multipart(
        &self,
        path: &str,
        form: Form,
        headers: HeaderMap,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url(path);
        let mut headers = merge_headers(&self.default_headers, &headers);
        // reqwest sets the boundary-carrying content type itself
        headers.remove(CONTENT_TYPE);
        debug!("POST {} (multipart)", url);
        let res = self.http.post(&url).headers(headers).multipart(form).send().await?;
        let res = check_status(res).await?;
        let body = res.text().await?;
        Ok(ApiResponse::from_body(body))
    }

    pub async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<ApiResponse, ApiError> {
        self.request(&with_query(path, params), RequestOptions::new(Method::GET))
            .await
    }

    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, data: &T) -> Result<ApiResponse, ApiError> {
        let data = serde_json::to_value(data)?;
        self.request(path, RequestOptions::new(Method::POST).data(data))
            .await
    }

    pub async fn put<T: Serialize + ?Sized>(&self, path: &str, data: &T) -> Result<ApiResponse, ApiError> {
        let data = serde_json::to_value(data)?;
        self.request(path, RequestOptions::new(Method::PUT).data(data))
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.request(path, RequestOptions::new(Method::DELETE)).await
    }

    async fn send(&self, path: &str, options: RequestOptions) -> Result<Response, ApiError> {
        let url = self.url(path);
        let headers = merge_headers(&self.default_headers, &options.headers);
        debug!("{} {}", options.method, url);

        let mut builder = self.http.request(options.method, &url).headers(headers);
        if let Some(data) = &options.data {
            builder = builder.body(serde_json::to_vec(data)?);
        }
        let res = builder.send().await?;
        check_status(res).await
    }
}

/// Turns a non-2xx response into [`ApiError::Http`], reading the body best-effort.
pub async fn check_status(res: Response) -> Result<Response, ApiError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let status_text = status.canonical_reason().unwrap_or("").to_string();
    let url = res.url().to_string();
    let body = match res.text().await {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => status_text.clone(),
        Err(e) => {
            warn!("Failed to read error body from {}: {}", url, e);
            status_text.clone()
        }
    };
    warn!("{} answered {}: {}", url, status.as_u16(), body);
    Err(ApiError::Http {
        status: status.as_u16(),
        status_text,
        body,
    })
}

pub fn join_base_url(api_url: &str, resource: &str) -> String {
    let root = api_url.trim_end_matches('/');
    let resource = resource.trim_matches('/');
    if resource.is_empty() {
        root.to_string()
    } else {
        format!("{}/{}", root, resource)
    }
}

/// `a=1&b=2`, percent-encoded, in the order given.
pub fn encode_query(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn with_query(path: &str, params: &[(&str, &str)]) -> String {
    let query = encode_query(params);
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query)
    }
}

fn merge_headers(defaults: &HeaderMap, overrides: &HeaderMap) -> HeaderMap {
    let mut merged = defaults.clone();
    for (name, value) in overrides {
        merged.insert(name.clone(), value.clone());
    }
    merged
}
