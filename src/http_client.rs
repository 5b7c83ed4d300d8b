use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, StatusCode};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// A backend call, transport independent.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// `a=1&b=2`, percent-encoded, in insertion order.
    pub fn query_string(&self) -> String {
        encode_query(&self.query)
    }
}

pub fn encode_query(query: &[(String, String)]) -> String {
    query
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> AppResult<ApiResponse>;

    /// Base URL requests are resolved against.
    fn base_url(&self) -> &str;
}

/// reqwest-backed transport for the REST backend.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout_secs: u64) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> AppResult<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        tracing::debug!(
            "{} {} -> {} ({} bytes)",
            request.method,
            request.path,
            status,
            body.len()
        );
        Ok(ApiResponse { status, body })
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Bearer-authenticated JSON client shared by all resource services.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn set_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token;
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    /// Absolute URL for `path` with an encoded query string.
    pub fn url(&self, path: &str, query: &[(String, String)]) -> String {
        let base = self.transport.base_url();
        if query.is_empty() {
            format!("{}{}", base, path)
        } else {
            format!("{}{}?{}", base, path, encode_query(query))
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> AppResult<T> {
        let request = ApiRequest::new(Method::GET, path).with_query(query);
        self.execute_typed(request).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        let request = ApiRequest::new(Method::POST, path).with_body(serde_json::to_value(body)?);
        self.execute_typed(request).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        let request = ApiRequest::new(Method::PUT, path).with_body(serde_json::to_value(body)?);
        self.execute_typed(request).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let request = ApiRequest::new(Method::DELETE, path);
        self.execute_typed(request).await
    }

    /// Raw body of a successful GET (file downloads such as CSV exports).
    pub async fn get_bytes(&self, path: &str, query: Vec<(String, String)>) -> AppResult<Bytes> {
        let mut request = ApiRequest::new(Method::GET, path).with_query(query);
        request.bearer = self.token();
        let response = self.transport.send(request).await?;

        if response.status == StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthorized);
        }
        if !response.status.is_success() {
            let body = parse_body(&response.body);
            return Err(AppError::Api {
                status: response.status.as_u16(),
                message: backend_message(&body),
            });
        }
        Ok(response.body)
    }

    async fn execute_typed<T: DeserializeOwned>(&self, request: ApiRequest) -> AppResult<T> {
        let value = match self.execute(request).await? {
            // 204 / empty bodies decode as an empty object
            Value::Null => Value::Object(Default::default()),
            value => value,
        };
        Ok(serde_json::from_value(value)?)
    }

    async fn execute(&self, mut request: ApiRequest) -> AppResult<Value> {
        request.bearer = self.token();
        let method = request.method.clone();
        let path = request.path.clone();

        let response = self.transport.send(request).await?;
        let result = interpret_response(response);
        if let Err(e) = &result {
            tracing::warn!("{} {} failed: {}", method, path, e);
        }
        result
    }
}

fn parse_body(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

fn backend_message(body: &Value) -> String {
    body.get("message")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn rejection_kind(body: &Value) -> Option<String> {
    body.get("type").and_then(Value::as_str).map(str::to_string)
}

/// Dates of the record a `CONFLICT` rejection collides with.
fn existing_dates(body: &Value) -> Vec<String> {
    let candidates = [
        body.get("existingDates"),
        body.get("conflictingDates"),
        body.get("data").and_then(|d| d.get("existingDates")),
    ];
    let Some(found) = candidates.into_iter().flatten().next() else {
        return Vec::new();
    };

    let mut dates = Vec::new();
    collect_strings(found, &mut dates);
    dates
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

fn rejection(body: &Value) -> AppError {
    let kind = rejection_kind(body);
    let message = backend_message(body);
    if kind.as_deref() == Some("CONFLICT") {
        AppError::Conflict {
            message,
            existing_dates: existing_dates(body),
        }
    } else {
        AppError::Rejected { kind, message }
    }
}

pub(crate) fn interpret_response(response: ApiResponse) -> AppResult<Value> {
    if response.status == StatusCode::UNAUTHORIZED {
        return Err(AppError::Unauthorized);
    }

    let body = parse_body(&response.body);

    if !response.status.is_success() {
        if rejection_kind(&body).as_deref() == Some("CONFLICT") {
            return Err(rejection(&body));
        }
        return Err(AppError::Api {
            status: response.status.as_u16(),
            message: backend_message(&body),
        });
    }

    if body.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(rejection(&body));
    }

    Ok(body)
}
