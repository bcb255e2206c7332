//! HTTP transport and response classification.
//!
//! ## Layers
//!
//! * [`HttpTransport`] performs one raw exchange and reports transport-level
//!   failures (timeout, connection) separately from completed responses.
//! * [`classify`] turns a completed response into a decoded body or an
//!   [`ApiError`] with the user-facing message.
//! * [`ApiClient`] ties both together and runs every call through the
//!   configured [`RetryPolicy`].

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use indexmap::IndexMap;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{Config, Credentials};
use crate::errors::ApiError;
use crate::retry::RetryPolicy;
use crate::types::Attachment;

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Multipart body kept as plain data so it can be rebuilt for every attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartBody {
    pub fields: Vec<(String, String)>,
    pub files: Vec<(String, Attachment)>,
}

impl MultipartBody {
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file(mut self, name: impl Into<String>, attachment: Attachment) -> Self {
        self.files.push((name.into(), attachment));
        self
    }

    /// One text part per top-level key of a JSON object. Strings are sent
    /// verbatim, everything else as encoded JSON.
    pub fn from_json_object(value: &Value) -> Self {
        let mut body = Self::default();
        if let Value::Object(map) = value {
            for (key, v) in map {
                let text = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                body = body.text(key.clone(), text);
            }
        }
        body
    }

    fn to_form(&self) -> Result<reqwest::multipart::Form, reqwest::Error> {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        for (name, file) in &self.files {
            let part = reqwest::multipart::Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.mime_type)?;
            form = form.part(name.clone(), part);
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(MultipartBody),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Appended to the configured base URL.
    pub endpoint: String,
    pub body: RequestBody,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            endpoint: endpoint.into(),
            body: RequestBody::Empty,
            headers: Vec::new(),
        }
    }

    pub fn post_json(endpoint: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            endpoint: endpoint.into(),
            body: RequestBody::Json(body),
            headers: Vec::new(),
        }
    }

    pub fn post_multipart(endpoint: impl Into<String>, body: MultipartBody) -> Self {
        Self {
            method: Method::Post,
            endpoint: endpoint.into(),
            body: RequestBody::Multipart(body),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Failure before a complete response was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFailure {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("{0}")]
    Other(String),
}

impl From<TransportFailure> for ApiError {
    fn from(failure: TransportFailure) -> Self {
        match failure {
            TransportFailure::Timeout => ApiError::Timeout,
            TransportFailure::Connection(detail) => ApiError::Network { detail },
            TransportFailure::Other(detail) => ApiError::Unexpected { detail },
        }
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: &ApiRequest) -> Result<HttpResponse, TransportFailure>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for std::sync::Arc<T> {
    async fn execute(&self, request: &ApiRequest) -> Result<HttpResponse, TransportFailure> {
        (**self).execute(request).await
    }
}

// ─────────────────────────────────────────────────────────
// reqwest transport
// ─────────────────────────────────────────────────────────

pub fn basic_auth_header(credentials: &Credentials) -> String {
    let token = STANDARD.encode(format!("{}:{}", credentials.username, credentials.password));
    format!("Basic {token}")
}

fn failure_from_reqwest(e: reqwest::Error) -> TransportFailure {
    if e.is_timeout() {
        TransportFailure::Timeout
    } else if e.is_connect() || e.is_request() {
        TransportFailure::Connection(e.to_string())
    } else {
        TransportFailure::Other(e.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
    auth_header: Option<String>,
}

impl ReqwestTransport {
    pub fn new(config: &Config) -> crate::errors::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            auth_header: config.credentials.as_ref().map(basic_auth_header),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<HttpResponse, TransportFailure> {
        let url = self.url(&request.endpoint);
        debug!("{} {url}", request.method.as_str());

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };

        if let Some(auth) = &self.auth_header {
            builder = builder.header(AUTHORIZATION, auth);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(value.to_string()),
            // reqwest sets the multipart Content-Type with its boundary.
            RequestBody::Multipart(body) => builder.multipart(
                body.to_form()
                    .map_err(|e| TransportFailure::Other(e.to_string()))?,
            ),
        };

        let response = builder.send().await.map_err(failure_from_reqwest)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(failure_from_reqwest)?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

// ─────────────────────────────────────────────────────────
// Classification
// ─────────────────────────────────────────────────────────

/// Error body schema the backend uses, `{ message?, messages?: {field: msg} }`.
///
/// Decoded leniently: a field message may also arrive as a list of strings
/// (the first one is used), and values of any other shape are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub messages: Option<IndexMap<String, Value>>,
}

impl ErrorBody {
    pub fn message(&self) -> Option<String> {
        self.message.as_ref()?.as_str().map(str::to_string)
    }

    /// Field messages flattened to one string per field, in body order.
    pub fn field_messages(&self) -> IndexMap<String, String> {
        let Some(messages) = &self.messages else {
            return IndexMap::new();
        };
        messages
            .iter()
            .filter_map(|(field, value)| {
                let text = match value {
                    Value::String(text) => Some(text.as_str()),
                    Value::Array(items) => items.iter().find_map(Value::as_str),
                    _ => None,
                }?;
                Some((field.clone(), text.to_string()))
            })
            .collect()
    }
}

/// Decode a completed response into `T` or a classified [`ApiError`].
pub fn classify<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    let status = response.status;

    if (200..300).contains(&status) {
        return serde_json::from_slice(&response.body).map_err(|e| ApiError::Unexpected {
            detail: format!("undecodable success body: {e}"),
        });
    }

    if !(400..600).contains(&status) {
        return Err(ApiError::Http { status });
    }

    let body: ErrorBody = match serde_json::from_slice(&response.body) {
        Ok(body) => body,
        Err(_) => return Err(ApiError::Http { status }),
    };

    if status == 422 {
        let field_messages = body.field_messages();
        if let Some(message) = field_messages.values().next().cloned() {
            return Err(ApiError::Validation {
                message,
                field_messages,
            });
        }
    }

    let message = body.message().unwrap_or_else(|| {
        if status < 500 {
            format!("Client error: {status}")
        } else {
            format!("Server error: {status}")
        }
    });
    Err(ApiError::Server { status, message })
}

// ─────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────

/// Transport client with retry. Holds no per-call state.
pub struct ApiClient<T> {
    transport: T,
    retry: RetryPolicy,
}

impl ApiClient<ReqwestTransport> {
    pub fn from_config(config: &Config) -> crate::errors::Result<Self> {
        Ok(Self::new(ReqwestTransport::new(config)?, config.retry))
    }
}

impl<T: HttpTransport> ApiClient<T> {
    pub fn new(transport: T, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    /// A single attempt, no retry.
    pub async fn send_once<R: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<R, ApiError> {
        let response = self.transport.execute(request).await.map_err(|failure| {
            warn!("{} {} failed: {failure}", request.method.as_str(), request.endpoint);
            ApiError::from(failure)
        })?;
        debug!(
            "{} {} -> {}",
            request.method.as_str(),
            request.endpoint,
            response.status
        );
        classify(&response)
    }

    pub async fn send<R: DeserializeOwned>(&self, request: &ApiRequest) -> Result<R, ApiError> {
        self.retry.execute(|| self.send_once::<R>(request)).await
    }

    pub async fn get<R: DeserializeOwned>(&self, endpoint: &str) -> Result<R, ApiError> {
        self.send(&ApiRequest::get(endpoint)).await
    }

    pub async fn post_json<R, B>(&self, endpoint: &str, body: &B) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Unexpected {
            detail: format!("unserializable body: {e}"),
        })?;
        self.send(&ApiRequest::post_json(endpoint, value)).await
    }

    pub async fn post_multipart<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: MultipartBody,
    ) -> Result<R, ApiError> {
        self.send(&ApiRequest::post_multipart(endpoint, body)).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Replays scripted outcomes in order and records the requests it saw.
    /// The last outcome repeats once the script runs out.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        script: Mutex<VecDeque<Result<HttpResponse, TransportFailure>>>,
        pub(crate) requests: Mutex<Vec<ApiRequest>>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        pub(crate) fn new(
            script: impl IntoIterator<Item = Result<HttpResponse, TransportFailure>>,
        ) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                ..Self::default()
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    pub(crate) fn json_response(status: u16, body: serde_json::Value) -> HttpResponse {
        HttpResponse {
            status,
            body: body.to_string().into_bytes(),
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn execute(&self, request: &ApiRequest) -> Result<HttpResponse, TransportFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script
                    .front()
                    .cloned()
                    .unwrap_or_else(|| Err(TransportFailure::Other("empty script".into())))
            }
        }
    }
}
