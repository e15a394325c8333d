//! Single choke point for backend calls.
//!
//! Builds URLs, serializes bodies, applies timeout and cancellation, and
//! normalizes every outcome into `ApiResponse` or `ApiError`. Never retries.

use super::url::join_url;
use crate::domain::{ApiError, ReceiptFile};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Per-request timeout unless the caller or config says otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Request payload.
#[derive(Debug)]
pub enum RequestBody {
    /// Serialized JSON, sent with `Content-Type: application/json`.
    /// Field order is kept as serialized.
    Json(String),
    /// Sent as-is; the transport sets the multipart content type and boundary.
    Multipart(Form),
}

impl RequestBody {
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(RequestBody::Json(serde_json::to_string(value)?))
    }
}

/// Per-call options. Everything is optional.
#[derive(Debug, Default)]
pub struct RequestOptions {
    pub body: Option<RequestBody>,
    /// Extra headers; they win over the JSON content type.
    pub headers: HeaderMap,
    /// Caller-owned cancellation. Observed alongside the timeout.
    pub cancel: Option<CancellationToken>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Successful response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Parsed body of a JSON response.
    Json(serde_json::Value),
    /// Raw body of any other response.
    Text(String),
}

impl ApiResponse {
    /// Decode into `T`. Text bodies are still tried as JSON since some
    /// endpoints omit the content type.
    pub fn decode<T: DeserializeOwned>(self, method: &str, path: &str) -> Result<T, ApiError> {
        let decoded = match self {
            ApiResponse::Json(value) => serde_json::from_value(value),
            ApiResponse::Text(text) => serde_json::from_str(&text),
        };
        decoded.map_err(|e| ApiError::Decode {
            method: method.to_string(),
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Decode a list. Anything that is not a JSON array is an empty list.
    pub fn decode_list<T: DeserializeOwned>(
        self,
        method: &str,
        path: &str,
    ) -> Result<Vec<T>, ApiError> {
        match self {
            ApiResponse::Json(value @ serde_json::Value::Array(_)) => {
                ApiResponse::Json(value).decode(method, path)
            }
            _ => Ok(Vec::new()),
        }
    }

    /// `None` for empty or non-JSON bodies.
    pub fn decode_optional<T: DeserializeOwned>(
        self,
        method: &str,
        path: &str,
    ) -> Result<Option<T>, ApiError> {
        match self {
            ApiResponse::Json(serde_json::Value::Null) => Ok(None),
            ApiResponse::Json(value) => ApiResponse::Json(value).decode(method, path).map(Some),
            ApiResponse::Text(_) => Ok(None),
        }
    }
}

/// Aborts the timeout task when dropped, so no timer outlives its request.
struct TimeoutGuard {
    timer: JoinHandle<()>,
}

impl TimeoutGuard {
    /// Cancel `token` once `timeout` elapses.
    fn arm(token: CancellationToken, timeout: Duration) -> Self {
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            token.cancel();
        });
        Self { timer }
    }
}

impl Drop for TimeoutGuard {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

/// HTTP client for the Expense Splitter backend.
///
/// Cookies set by the backend are kept and replayed on every request
/// (session-cookie auth).
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    origin: String,
    default_timeout: Duration,
}

impl HttpClient {
    /// Create a client.
    ///
    /// # Arguments
    /// * `base_url` - resolved base URL; empty means same-origin
    /// * `origin` - where same-origin (relative) URLs are sent
    /// * `default_timeout` - per-request timeout when the caller sets none
    pub fn new(
        base_url: impl Into<String>,
        origin: impl Into<String>,
        default_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.into();
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::Network {
                url: base_url.clone(),
                source: Box::new(e),
            })?;
        Ok(Self {
            client,
            base_url,
            origin: origin.into(),
            default_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL the request for `path` goes to.
    pub fn url_for(&self, path: &str) -> String {
        let joined = join_url(&self.base_url, path);
        if joined.starts_with('/') {
            join_url(&self.origin, &joined)
        } else {
            joined
        }
    }

    /// Issue one request and normalize the outcome.
    ///
    /// The request is aborted by whichever comes first: the timeout or the
    /// caller's cancellation token. Both feed one child token.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        let method_name = method.as_str().to_string();
        let url = self.url_for(path);
        let timeout = options.timeout.unwrap_or(self.default_timeout);
        let token = match &options.cancel {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        let _timer = TimeoutGuard::arm(token.clone(), timeout);

        let mut builder = self.client.request(method, &url);
        builder = match options.body {
            Some(RequestBody::Json(text)) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(text),
            Some(RequestBody::Multipart(form)) => builder.multipart(form),
            None => builder,
        };
        builder = builder.headers(options.headers);

        debug!(
            method = %method_name,
            url = %url,
            timeout_ms = timeout.as_millis() as u64,
            "api request"
        );

        let exchange = async move {
            let response = builder.send().await?;
            let status = response.status();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, content_type, body))
        };

        let (status, content_type, body) = tokio::select! {
            biased;
            _ = token.cancelled() => {
                warn!(method = %method_name, path, "api request aborted");
                return Err(ApiError::Aborted {
                    method: method_name,
                    path: path.to_string(),
                });
            }
            result = exchange => result.map_err(|e| {
                warn!(method = %method_name, url = %url, error = %e, "api transport failure");
                ApiError::Network {
                    url: url.clone(),
                    source: Box::new(e),
                }
            })?,
        };

        if !status.is_success() {
            let detail = error_detail(&content_type, &body);
            warn!(method = %method_name, path, status = status.as_u16(), detail = %detail, "api error response");
            return Err(ApiError::Http {
                method: method_name,
                path: path.to_string(),
                status: status.as_u16(),
                status_text: status_text(status),
                detail,
            });
        }

        debug!(method = %method_name, path, status = status.as_u16(), "api response");

        if is_json(&content_type) && !body.trim().is_empty() {
            serde_json::from_str(&body)
                .map(ApiResponse::Json)
                .map_err(|e| ApiError::Decode {
                    method: method_name,
                    path: path.to_string(),
                    reason: e.to_string(),
                })
        } else {
            Ok(ApiResponse::Text(body))
        }
    }

    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, ApiError> {
        self.request(Method::GET, path, options).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        let body = encode_body(&Method::POST, path, body)?;
        self.request(Method::POST, path, options.body(body)).await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        let body = encode_body(&Method::PATCH, path, body)?;
        self.request(Method::PATCH, path, options.body(body)).await
    }

    pub async fn delete(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        self.request(Method::DELETE, path, options).await
    }

    /// Upload or replace an expense receipt as multipart field `file`.
    pub async fn upload_receipt(
        &self,
        expense_id: i64,
        file: ReceiptFile,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        let ReceiptFile {
            file_name,
            mime_type,
            bytes,
        } = file;
        let mut part = Part::bytes(bytes).file_name(file_name);
        if let Some(mime) = mime_type {
            part = part.mime_str(&mime).map_err(|e| ApiError::Decode {
                method: Method::POST.to_string(),
                path: receipt_path(expense_id),
                reason: format!("invalid receipt mime type {:?}: {}", mime, e),
            })?;
        }
        let form = Form::new().part("file", part);
        self.request(
            Method::POST,
            &receipt_path(expense_id),
            options.body(RequestBody::Multipart(form)),
        )
        .await
    }

    pub async fn delete_receipt(
        &self,
        expense_id: i64,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        self.delete(&receipt_path(expense_id), options).await
    }

    /// URL of an expense's receipt for direct display or download. No request is made.
    pub fn receipt_url(&self, expense_id: i64) -> String {
        join_url(&self.base_url, &receipt_path(expense_id))
    }
}

fn receipt_path(expense_id: i64) -> String {
    format!("/expenses/{}/receipt", expense_id)
}

fn encode_body<B: Serialize + ?Sized>(
    method: &Method,
    path: &str,
    body: &B,
) -> Result<RequestBody, ApiError> {
    RequestBody::json(body).map_err(|e| ApiError::Decode {
        method: method.to_string(),
        path: path.to_string(),
        reason: format!("could not encode request body: {}", e),
    })
}

fn is_json(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("application/json")
}

fn status_text(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or_default().to_string()
}

/// Human-readable detail of an error body: the JSON `message` field when
/// there is one, the compact JSON otherwise, the raw text for non-JSON bodies.
fn error_detail(content_type: &str, body: &str) -> String {
    if is_json(content_type) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            return match value
                .get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
            {
                Some(message) => message.to_string(),
                None => value.to_string(),
            };
        }
    }
    body.to_string()
}
